//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.metrics-digest.toml` files.

use crate::cli::{Args, Command};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".metrics-digest.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Release metrics settings (`analyze` and `context`).
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Column summary trend settings.
    #[serde(default)]
    pub trends: TrendsConfig,

    /// Feedback API settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Settings for the per-release reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Directory holding one subdirectory per release.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Release to analyze. The latest release is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    /// Number of top values kept per column.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Number of top values printed per column.
    #[serde(default = "default_report_top_n")]
    pub report_top_n: usize,

    /// Output of `analyze`.
    #[serde(default = "default_summary_output")]
    pub summary_output: PathBuf,

    /// Output of `context`.
    #[serde(default = "default_context_output")]
    pub context_output: PathBuf,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            release: None,
            top_n: default_top_n(),
            report_top_n: default_report_top_n(),
            summary_output: default_summary_output(),
            context_output: default_context_output(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("Metrics/metrics")
}

fn default_top_n() -> usize {
    crate::analysis::DEFAULT_TOP_N
}

fn default_report_top_n() -> usize {
    10
}

fn default_summary_output() -> PathBuf {
    PathBuf::from("metrics_analysis_summary.txt")
}

fn default_context_output() -> PathBuf {
    PathBuf::from("README_generation_output.txt")
}

/// Settings for the release trend documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsConfig {
    /// Directory of `<release>.<theme>.<type>.csv` column stats.
    #[serde(default = "default_stats_dir")]
    pub stats_dir: PathBuf,

    /// Only the most recent releases are reported.
    #[serde(default = "default_max_releases")]
    pub max_releases: usize,

    #[serde(default = "default_trend_output")]
    pub context_output: PathBuf,

    #[serde(default = "default_prototype_output")]
    pub prototype_output: PathBuf,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            stats_dir: default_stats_dir(),
            max_releases: default_max_releases(),
            context_output: default_trend_output(),
            prototype_output: default_prototype_output(),
        }
    }
}

fn default_stats_dir() -> PathBuf {
    PathBuf::from("Metrics/theme_column_summary_stats")
}

fn default_max_releases() -> usize {
    10
}

fn default_trend_output() -> PathBuf {
    PathBuf::from("overture_metrics_context_v0.1.txt")
}

fn default_prototype_output() -> PathBuf {
    PathBuf::from("overture_metrics_prototype.md")
}

/// Feedback API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database file.
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_database() -> PathBuf {
    PathBuf::from("feedback.db")
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.metrics-digest.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(DEFAULT_CONFIG_FILE);

        if path.exists() {
            Ok(Some(Self::load(&path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &Args) {
        if args.verbose {
            self.general.verbose = true;
        }

        match &args.command {
            Command::Analyze(a) => {
                override_with(&mut self.metrics.base_dir, &a.base_dir);
                if a.release.is_some() {
                    self.metrics.release = a.release.clone();
                }
                override_with(&mut self.metrics.summary_output, &a.output);
                override_with(&mut self.metrics.top_n, &a.top_n);
                override_with(&mut self.metrics.report_top_n, &a.top_n);
            }
            Command::Context(c) => {
                override_with(&mut self.metrics.base_dir, &c.base_dir);
                if c.release.is_some() {
                    self.metrics.release = c.release.clone();
                }
                override_with(&mut self.metrics.context_output, &c.output);
            }
            Command::Trends(t) => {
                override_with(&mut self.trends.stats_dir, &t.stats_dir);
                override_with(&mut self.trends.max_releases, &t.max_releases);
                override_with(&mut self.trends.context_output, &t.output);
                override_with(&mut self.trends.prototype_output, &t.prototype_output);
            }
            Command::Serve(s) => {
                override_with(&mut self.server.host, &s.host);
                override_with(&mut self.server.port, &s.port);
                override_with(&mut self.server.database, &s.database);
            }
            Command::InitConfig => {}
        }
    }

    /// Log level from `[general] verbose` (after merging `-v`). `-q` wins.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.metrics.base_dir, PathBuf::from("Metrics/metrics"));
        assert_eq!(config.metrics.top_n, 15);
        assert_eq!(config.metrics.report_top_n, 10);
        assert_eq!(config.trends.max_releases, 10);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.database, PathBuf::from("feedback.db"));
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[general]
verbose = true

[metrics]
base_dir = "metrics"
release = "2025-08-20.1"

[server]
port = 8080
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.metrics.base_dir, PathBuf::from("metrics"));
        assert_eq!(config.metrics.release.as_deref(), Some("2025-08-20.1"));
        assert_eq!(config.metrics.top_n, 15);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.trends.stats_dir,
            PathBuf::from("Metrics/theme_column_summary_stats")
        );
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[metrics]"));
        assert!(toml_str.contains("[trends]"));
        assert!(toml_str.contains("[server]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.port, 5000);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[trends]\nmax_releases = 3\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.trends.max_releases, 3);

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[trends\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_merge_only_overrides_given_flags() {
        let mut config: Config = toml::from_str("[metrics]\nbase_dir = \"metrics\"\ntop_n = 20\n").unwrap();
        let args = Args::parse_from(["metrics-digest", "analyze", "--release", "2025-01-22.0"]);
        config.merge_with_args(&args);

        assert_eq!(config.metrics.base_dir, PathBuf::from("metrics"));
        assert_eq!(config.metrics.top_n, 20);
        assert_eq!(config.metrics.release.as_deref(), Some("2025-01-22.0"));

        let args = Args::parse_from(["metrics-digest", "-v", "serve", "--port", "9000"]);
        config.merge_with_args(&args);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.general.verbose);
    }

    #[test]
    fn test_log_level() {
        let mut config = Config::default();
        assert_eq!(config.log_level(false), tracing::Level::INFO);

        let args = Args::parse_from(["metrics-digest", "-v", "trends"]);
        config.merge_with_args(&args);
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);

        let config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
    }
}
