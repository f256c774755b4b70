//! File discovery for metrics exports.
//!
//! Release directories are named so that they sort chronologically
//! (`2025-08-20.1`), which is what "latest" relies on.

use anyhow::{anyhow, Context, Result};
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::models::Theme;

/// Scanner over a `<base>/<release>/...` metrics tree.
#[derive(Debug, Clone)]
pub struct MetricsScanner {
    base_dir: PathBuf,
}

impl MetricsScanner {
    /// Create a new scanner rooted at the metrics base directory.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// List release directories, oldest first.
    pub fn list_releases(&self) -> Result<Vec<String>> {
        if !self.base_dir.is_dir() {
            return Err(anyhow!(
                "Metrics base directory not found: {}",
                self.base_dir.display()
            ));
        }

        let mut releases: Vec<String> = fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to read {}", self.base_dir.display()))?
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|name| !name.starts_with('.'))
            .collect();

        releases.sort();
        Ok(releases)
    }

    /// The newest release directory.
    pub fn latest_release(&self) -> Result<String> {
        self.list_releases()?
            .pop()
            .ok_or_else(|| anyhow!("No releases found in {}", self.base_dir.display()))
    }

    /// Resolve a configured release, falling back to the latest one.
    pub fn resolve_release(&self, configured: Option<&str>) -> Result<String> {
        match configured {
            Some(release) => {
                let dir = self.base_dir.join(release);
                if !dir.is_dir() {
                    return Err(anyhow!("Release directory not found: {}", dir.display()));
                }
                Ok(release.to_string())
            }
            None => self.latest_release(),
        }
    }

    /// CSV files of one theme: `<release>/row_counts/theme=<theme>/**/*.csv`.
    pub fn theme_files(&self, release: &str, theme: Theme) -> Result<Vec<PathBuf>> {
        let root = self
            .base_dir
            .join(release)
            .join("row_counts")
            .join(format!("theme={}", theme));
        find_matching(&root, "**/*.csv")
    }

    /// Changelog stats files of a release: `<release>/changelog_stats/*.csv`.
    pub fn changelog_files(&self, release: &str) -> Result<Vec<PathBuf>> {
        let root = self.base_dir.join(release).join("changelog_stats");
        find_matching(&root, "*.csv")
    }
}

/// Walk `root` and return the files whose path relative to `root`
/// matches `pattern`, sorted. A missing root yields no files.
pub fn find_matching(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        debug!("No directory at {}", root.display());
        return Ok(Vec::new());
    }

    let pattern = Pattern::new(pattern).with_context(|| format!("Invalid pattern: {}", pattern))?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Cannot read entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if pattern.matches_path_with(rel, options) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// A file of the column summary stats directory, named
/// `<release>.theme=<theme>[.type=<type>].csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnStatsFile {
    pub path: PathBuf,
    pub release: String,
    pub theme: String,
    pub data_type: String,
}

/// Parse a column stats file name. Returns `None` for names that do not
/// follow the convention.
pub fn parse_column_stats_name(file_name: &str) -> Option<(String, String, String)> {
    let stem = file_name.strip_suffix(".csv")?;
    let parts: Vec<&str> = stem.split('.').collect();
    if parts.len() < 3 {
        return None;
    }

    let release = format!("{}.{}", parts[0], parts[1]);
    let theme = parts[2].strip_prefix("theme=")?.to_string();
    let data_type = parts
        .get(3)
        .map(|p| p.strip_prefix("type=").unwrap_or(p).to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Some((release, theme, data_type))
}

/// All conforming files directly inside the column stats directory.
pub fn column_stats_files(dir: &Path) -> Result<Vec<ColumnStatsFile>> {
    if !dir.is_dir() {
        warn!("Column stats directory not found: {}", dir.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .flatten()
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        match parse_column_stats_name(&name) {
            Some((release, theme, data_type)) => files.push(ColumnStatsFile {
                path,
                release,
                theme,
                data_type,
            }),
            None => debug!("Ignoring {}", name),
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Distinct releases present in the column stats directory, oldest first.
pub fn releases_from_column_stats(files: &[ColumnStatsFile]) -> Vec<String> {
    let mut releases: Vec<String> = files.iter().map(|f| f.release.clone()).collect();
    releases.sort();
    releases.dedup();
    releases
}
