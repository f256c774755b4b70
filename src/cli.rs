//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// metrics-digest - reports over Overture metrics exports
///
/// Summarizes release metrics CSV exports into plain-text and markdown
/// documents for people and LLMs, and runs the feedback collection API.
///
/// Examples:
///   metrics-digest analyze
///   metrics-digest analyze --release 2025-08-20.1 --format json
///   metrics-digest context --base-dir metrics
///   metrics-digest trends --max-releases 6
///   metrics-digest serve --port 5000
///   metrics-digest init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .metrics-digest.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE", env = "METRICS_DIGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Top values per grouping column for every theme of a release
    Analyze(AnalyzeArgs),

    /// LLM exploration guide for a release
    Context(ContextArgs),

    /// Release-over-release trends from column summary stats
    Trends(TrendsArgs),

    /// Run the feedback collection API
    Serve(ServeArgs),

    /// Generate a default .metrics-digest.toml configuration file
    InitConfig,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Directory containing one subdirectory per release
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Release to analyze (defaults to the latest)
    #[arg(short, long, value_name = "RELEASE")]
    pub release: Option<String>,

    /// Output file path for the summary
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Number of top values per column
    #[arg(long, value_name = "COUNT")]
    pub top_n: Option<usize>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Directory containing one subdirectory per release
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Release to describe (defaults to the latest)
    #[arg(short, long, value_name = "RELEASE")]
    pub release: Option<String>,

    /// Output file path for the guide
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct TrendsArgs {
    /// Directory of <release>.<theme>.<type>.csv column summary stats
    #[arg(long, value_name = "DIR")]
    pub stats_dir: Option<PathBuf>,

    /// Number of most recent releases to include
    #[arg(long, value_name = "COUNT")]
    pub max_releases: Option<usize>,

    /// Output file path for the trend context
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output file path for the markdown prototype
    #[arg(long, value_name = "FILE")]
    pub prototype_output: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, value_name = "HOST", env = "FEEDBACK_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT", env = "FEEDBACK_PORT")]
    pub port: Option<u16>,

    /// SQLite database file
    #[arg(long, value_name = "FILE", env = "FEEDBACK_DATABASE")]
    pub database: Option<PathBuf>,
}

/// Output format for the analyze summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Analyze(a) => {
                if a.top_n == Some(0) {
                    return Err("Top N must be at least 1".to_string());
                }
                validate_release(a.release.as_deref())?;
            }
            Command::Context(c) => validate_release(c.release.as_deref())?,
            Command::Trends(t) => {
                if t.max_releases == Some(0) {
                    return Err("Max releases must be at least 1".to_string());
                }
            }
            Command::Serve(s) => {
                if s.host.as_deref().is_some_and(|h| h.trim().is_empty()) {
                    return Err("Host must not be empty".to_string());
                }
            }
            Command::InitConfig => {}
        }

        Ok(())
    }
}

fn validate_release(release: Option<&str>) -> Result<(), String> {
    match release {
        Some(r) if r.is_empty() || r.contains(['/', '\\']) || r.starts_with('.') => {
            Err(format!("Invalid release name: '{}'", r))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_parse_subcommands() {
        let args = Args::parse_from(["metrics-digest", "analyze", "--format", "json", "--top-n", "5"]);
        match args.command {
            Command::Analyze(a) => {
                assert_eq!(a.format, OutputFormat::Json);
                assert_eq!(a.top_n, Some(5));
                assert!(a.release.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let args = Args::parse_from(["metrics-digest", "trends", "-v", "--max-releases", "4"]);
        assert!(args.verbose);
        assert!(matches!(args.command, Command::Trends(TrendsArgs { max_releases: Some(4), .. })));

        let args = Args::parse_from(["metrics-digest", "init-config"]);
        assert!(matches!(args.command, Command::InitConfig));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bounds() {
        let args = make_args(Command::Analyze(AnalyzeArgs {
            top_n: Some(0),
            ..Default::default()
        }));
        assert!(args.validate().is_err());

        let args = make_args(Command::Trends(TrendsArgs {
            max_releases: Some(0),
            ..Default::default()
        }));
        assert!(args.validate().is_err());

        let args = make_args(Command::Context(ContextArgs {
            release: Some("../etc".to_string()),
            ..Default::default()
        }));
        assert!(args.validate().is_err());

        let args = make_args(Command::Context(ContextArgs {
            release: Some("2025-08-20.1".to_string()),
            ..Default::default()
        }));
        assert!(args.validate().is_ok());
    }
}
