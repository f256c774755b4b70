//! metrics-digest - reports over Overture metrics exports
//!
//! Reads release metrics CSV exports and writes plain-text and markdown
//! summaries, and serves a small feedback collection API.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (missing data directory, unreadable config, bind failure, etc.)

mod analysis;
mod cli;
mod config;
mod feedback;
mod models;
mod report;
mod scanner;

use analysis::{
    categorical_columns, detect_count_total, limit_releases, summarize_theme, theme_totals,
    with_type_changes, LoadMode, LoadSummary, Measure, Table,
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use cli::{Args, Command, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::{AnalysisReport, ReportMetadata, Theme, ThemeAnalysis, TypeSummary};
use scanner::{ColumnStatsFile, MetricsScanner};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Config is read before logging starts so `[general] verbose` can
    // set the level.
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(args.quiet));

    info!("metrics-digest v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    if let Err(e) = run(&args, &config).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .metrics-digest.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize data directories, outputs, and the feedback server.");
    Ok(())
}

/// Initialize logging at the given level. `RUST_LOG` wins when set.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    match &args.command {
        Command::Analyze(a) => {
            let output = match (a.format, &a.output) {
                (OutputFormat::Json, None) => config.metrics.summary_output.with_extension("json"),
                _ => config.metrics.summary_output.clone(),
            };
            run_analyze(config, a.format, &output, args.quiet)
        }
        Command::Context(_) => run_context(config, args.quiet),
        Command::Trends(_) => run_trends(config, args.quiet),
        Command::Serve(_) => run_serve(config).await,
        Command::InitConfig => Ok(()),
    }
}

/// Where the configuration came from, logged once logging is up.
enum ConfigSource {
    File(PathBuf),
    Defaults,
    /// The default file exists but could not be loaded.
    Fallback(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::File(PathBuf::from(DEFAULT_CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(e))),
    }
}

fn spinner(quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

/// Load each theme of a release. Themes without files, or whose files
/// all fail to load, are left out.
fn load_themes<F>(
    scanner: &MetricsScanner,
    release: &str,
    mode: LoadMode,
    quiet: bool,
    mut summarize: F,
) -> Result<Vec<ThemeAnalysis>>
where
    F: FnMut(Theme, &Table, &LoadSummary) -> ThemeAnalysis,
{
    let pb = spinner(quiet);
    let mut themes = Vec::new();

    for theme in Theme::ALL {
        let files = scanner.theme_files(release, theme)?;
        if files.is_empty() {
            info!("No files found for theme {}", theme);
            continue;
        }

        if let Some(ref pb) = pb {
            pb.set_message(format!("Loading {} ({} files)", theme, files.len()));
        }

        let (table, load) = Table::load_files(&files, mode);
        if load.files_loaded == 0 {
            warn!("No readable files for theme {}", theme);
            continue;
        }

        info!(
            "{}: {} records from {} files",
            theme,
            table.len(),
            load.files_loaded
        );
        themes.push(summarize(theme, &table, &load));
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    Ok(themes)
}

/// `analyze`: top values per grouping column of every theme.
fn run_analyze(config: &Config, format: OutputFormat, output: &Path, quiet: bool) -> Result<()> {
    let start_time = Instant::now();

    let report = build_analysis_report(config, Local::now(), quiet)?;
    let content = render_analysis_report(&report, format, config.metrics.report_top_n)?;
    report::write_report(output, &content)?;

    println!("\n📊 Analysis Summary:");
    for theme in &report.themes {
        println!(
            "   {} - {} records, {} features",
            theme.theme,
            theme.total_records,
            theme.total_features
        );
    }
    println!(
        "   Files: {} analyzed, {} failed",
        report.metadata.files_analyzed, report.metadata.files_failed
    );
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!("\n✅ Analysis complete! Results saved to {}", output.display());

    Ok(())
}

/// Load the configured release and summarize every theme plus its
/// changelog stats.
fn build_analysis_report(
    config: &Config,
    generated_at: DateTime<Local>,
    quiet: bool,
) -> Result<AnalysisReport> {
    let settings = &config.metrics;

    let scanner = MetricsScanner::new(&settings.base_dir);
    let release = scanner.resolve_release(settings.release.as_deref())?;
    if !quiet {
        println!("📂 Analyzing release {} in {}", release, settings.base_dir.display());
    }

    let themes = load_themes(&scanner, &release, LoadMode::Strict, quiet, |theme, table, load| {
        let mut analysis =
            summarize_theme(theme, table, load, theme.grouping_columns(), settings.top_n);
        // Without a count column every row is one feature.
        analysis.total_features = Measure::resolve(table, None).total(table);
        analysis
    })?;

    let changelog = match scanner.changelog_files(&release)?.first() {
        Some(path) => match analysis::changelog::load_changelog_table(path) {
            Ok(table) => Some(table),
            Err(e) => {
                warn!("Skipping changelog stats: {:#}", e);
                None
            }
        },
        None => None,
    };

    Ok(AnalysisReport {
        metadata: ReportMetadata {
            release,
            source_dir: settings.base_dir.display().to_string(),
            generated_at,
            files_analyzed: themes.iter().map(|t| t.files_loaded).sum(),
            files_failed: themes.iter().map(|t| t.files_failed).sum(),
        },
        themes,
        changelog,
    })
}

fn render_analysis_report(
    report: &AnalysisReport,
    format: OutputFormat,
    top_n: usize,
) -> Result<String> {
    match format {
        OutputFormat::Json => report::generate_json_report(report),
        OutputFormat::Text => Ok(report::generate_summary_report(report, top_n)),
    }
}

/// `context`: the LLM exploration guide for one release.
fn run_context(config: &Config, quiet: bool) -> Result<()> {
    let settings = &config.metrics;

    let scanner = MetricsScanner::new(&settings.base_dir);
    let release = scanner.resolve_release(settings.release.as_deref())?;
    println!("📂 Using release: {}", release);

    println!("🔬 Analyzing themes...");
    let themes = load_themes(&scanner, &release, LoadMode::Lenient, quiet, |theme, table, load| {
        let columns = categorical_columns(table);
        summarize_theme(theme, table, load, columns.as_slice(), settings.top_n)
    })?;

    println!("📜 Loading changelog statistics...");
    let changelog = match scanner.changelog_files(&release)?.first() {
        Some(path) => match analysis::changelog::load_changelog_entries(path) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!("Skipping changelog stats: {:#}", e);
                None
            }
        },
        None => {
            info!("No changelog stats for release {}", release);
            None
        }
    };

    let input = report::ContextInput {
        release,
        generated_at: Local::now(),
        themes,
        changelog,
        top_n: settings.report_top_n,
    };

    let output = &settings.context_output;
    report::write_report(output, &report::generate_context_document(&input))?;

    println!("\n✅ Document generated: {}", output.display());
    println!("   Themes covered: {}", input.themes.len());
    Ok(())
}

/// `trends`: release-over-release totals from the column summary stats.
fn run_trends(config: &Config, quiet: bool) -> Result<()> {
    let settings = &config.trends;

    let files = scanner::column_stats_files(&settings.stats_dir)?;
    let all_releases = scanner::releases_from_column_stats(&files);
    if all_releases.is_empty() {
        return Err(anyhow!(
            "No releases found in column stats directory: {}",
            settings.stats_dir.display()
        ));
    }

    println!("📅 Found {} releases", all_releases.len());
    let releases = limit_releases(all_releases, settings.max_releases);
    println!("📅 Processing last {} releases: {}", releases.len(), releases.join(", "));

    log_csv_structure(&files, &releases);

    let pb = spinner(quiet);
    let mut rows = Vec::new();
    for file in files.iter().filter(|f| releases.contains(&f.release)) {
        if let Some(ref pb) = pb {
            pb.set_message(format!("{} {} ({})", file.release, file.theme, file.data_type));
        }

        let mut table = Table::new();
        if let Err(e) = table.append_file(&file.path, LoadMode::Strict) {
            warn!("Error processing {}: {}", file.path.display(), e);
            continue;
        }

        let (count_column, total) = detect_count_total(&table);
        match count_column {
            Some(col) => debug!("{}: summing '{}', total {}", file.path.display(), col, total),
            None => debug!("{}: no numeric columns, using row count", file.path.display()),
        }

        rows.push(TypeSummary {
            release: file.release.clone(),
            theme: file.theme.clone(),
            data_type: file.data_type.clone(),
            total_rows: total.round() as i64,
            csv_rows: table.len(),
            pct_change: None,
        });
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if rows.is_empty() {
        return Err(anyhow!(
            "No data found to process in {}",
            settings.stats_dir.display()
        ));
    }
    println!("📊 Processed {} records", rows.len());

    let types = with_type_changes(rows);
    let themes = theme_totals(&types);

    let input = report::TrendInput {
        releases,
        generated_at: Local::now(),
        source_dir: settings.stats_dir.display().to_string(),
        types,
        themes,
    };

    let context = report::generate_trend_context(&input);
    report::write_report(&settings.context_output, &context)?;
    println!(
        "✅ Generated {} ({:.1} KB)",
        settings.context_output.display(),
        file_size_kb(&settings.context_output)
    );

    match report::generate_prototype(&input) {
        Some(prototype) => {
            report::write_report(&settings.prototype_output, &prototype)?;
            println!("✅ Prototype summary: {}", settings.prototype_output.display());
        }
        None => warn!("Nothing to summarize, prototype skipped"),
    }

    Ok(())
}

/// Debug-log the shape of a few files from the first two releases.
fn log_csv_structure(files: &[ColumnStatsFile], releases: &[String]) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    for release in releases.iter().take(2) {
        for file in files.iter().filter(|f| &f.release == release).take(3) {
            let mut table = Table::new();
            if let Err(e) = table.append_file(&file.path, LoadMode::Strict) {
                debug!("Cannot read {}: {}", file.path.display(), e);
                continue;
            }

            debug!(
                "{}: {} rows, columns {:?}",
                file.path.display(),
                table.len(),
                table.columns()
            );
            for column in table.columns().iter().filter(|c| table.is_numeric_column(c)) {
                debug!("  {} total: {}", column, table.sum_column(column).unwrap_or(0.0));
            }
        }
    }
}

fn file_size_kb(path: &Path) -> f64 {
    std::fs::metadata(path)
        .map(|m| m.len() as f64 / 1024.0)
        .unwrap_or(0.0)
}

/// `serve`: the feedback API.
async fn run_serve(config: &Config) -> Result<()> {
    let settings = &config.server;
    let store = feedback::FeedbackStore::new(&settings.database);
    feedback::serve(&settings.host, settings.port, store).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: PathBuf, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn metrics_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("2025-07-23.0");
        let release = dir.path().join("2025-08-20.1");
        fs::create_dir_all(&old).unwrap();

        let buildings = release.join("row_counts").join("theme=buildings");
        write(
            buildings.join("type=building").join("part-0.csv"),
            "subtype,class,datasets,change_type,total_count\n\
             residential,house,OSM,added,10\n\
             commercial,office,OSM,unchanged,5\n",
        );
        write(
            buildings.join("type=building_part").join("part-0.csv"),
            "subtype,class,datasets,change_type,total_count\n\
             residential,,Microsoft,added,7\n",
        );
        write(
            release.join("changelog_stats").join("stats.csv"),
            "theme,type,added,removed\nbuildings,building,17,2\n",
        );
        dir
    }

    fn analyze_config(base_dir: &Path) -> Config {
        let mut config = Config::default();
        config.metrics.base_dir = base_dir.to_path_buf();
        config
    }

    #[test]
    fn test_analyze_reads_latest_release() {
        let dir = metrics_tree();
        let config = analyze_config(dir.path());
        let generated_at = Local.with_ymd_and_hms(2025, 8, 21, 9, 30, 0).unwrap();

        let report = build_analysis_report(&config, generated_at, true).unwrap();
        assert_eq!(report.metadata.release, "2025-08-20.1");
        assert_eq!(report.metadata.files_analyzed, 2);
        assert_eq!(report.metadata.files_failed, 0);

        assert_eq!(report.themes.len(), 1);
        let buildings = &report.themes[0];
        assert_eq!(buildings.theme, Theme::Buildings);
        assert_eq!(buildings.total_records, 3);
        assert_eq!(buildings.total_features, 22);

        let changelog = report.changelog.as_ref().unwrap();
        assert_eq!(changelog.headers, vec!["theme", "type", "added", "removed"]);
        assert_eq!(changelog.rows.len(), 1);
    }

    #[test]
    fn test_analyze_output_is_deterministic() {
        let dir = metrics_tree();
        let out = TempDir::new().unwrap();
        let config = analyze_config(dir.path());
        let generated_at = Local.with_ymd_and_hms(2025, 8, 21, 9, 30, 0).unwrap();

        let mut outputs = Vec::new();
        for run in 0..2 {
            let report = build_analysis_report(&config, generated_at, true).unwrap();
            let content =
                render_analysis_report(&report, OutputFormat::Text, config.metrics.report_top_n)
                    .unwrap();
            let path = out.path().join(format!("summary-{}.txt", run));
            report::write_report(&path, &content).unwrap();
            outputs.push(fs::read(&path).unwrap());
        }

        assert_eq!(outputs[0], outputs[1]);
        let text = String::from_utf8(outputs.remove(0)).unwrap();
        assert!(text.contains("BUILDINGS THEME"));
        assert!(text.contains("Total Features: 22"));
        assert!(text.contains("CHANGELOG STATS"));
    }

    #[test]
    fn test_analyze_missing_release_fails() {
        let dir = metrics_tree();
        let mut config = analyze_config(dir.path());
        config.metrics.release = Some("2024-01-01.0".to_string());
        let generated_at = Local.with_ymd_and_hms(2025, 8, 21, 9, 30, 0).unwrap();

        assert!(build_analysis_report(&config, generated_at, true).is_err());
    }
}
