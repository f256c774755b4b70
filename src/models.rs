//! Data models for the metrics reports.
//!
//! This module contains the core data structures shared by the
//! aggregator, the change calculator and the report writers.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A top-level data category of the metrics exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Addresses,
    Buildings,
    Places,
    Divisions,
    Transportation,
    Base,
}

impl Theme {
    /// All themes, in the order the reports present them.
    pub const ALL: [Theme; 6] = [
        Theme::Addresses,
        Theme::Buildings,
        Theme::Places,
        Theme::Divisions,
        Theme::Transportation,
        Theme::Base,
    ];

    /// Directory / file-name form of the theme (`theme=<name>`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Addresses => "addresses",
            Theme::Buildings => "buildings",
            Theme::Places => "places",
            Theme::Divisions => "divisions",
            Theme::Transportation => "transportation",
            Theme::Base => "base",
        }
    }

    /// Columns examined by the `analyze` command for this theme.
    pub fn grouping_columns(&self) -> &'static [&'static str] {
        match self {
            Theme::Addresses => &[
                "country",
                "address_level_1",
                "address_level_2",
                "datasets",
                "change_type",
            ],
            Theme::Buildings | Theme::Base => &["subtype", "class", "datasets", "change_type"],
            Theme::Places => &[
                "place_countries",
                "primary_category",
                "confidence",
                "datasets",
                "change_type",
            ],
            Theme::Divisions => &["subtype", "class", "country", "datasets", "change_type"],
            Theme::Transportation => &["subtype", "class", "subclass", "datasets", "change_type"],
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a feature relative to the prior release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Unchanged,
    DataChanged,
}

impl ChangeType {
    /// Human description used in the schema reference.
    pub fn description(&self) -> &'static str {
        match self {
            ChangeType::Unchanged => "Feature exists in both releases with identical data",
            ChangeType::DataChanged => "Feature exists in both but has modified attributes",
            ChangeType::Added => "New feature in this release",
            ChangeType::Removed => "Feature existed in previous release but not current",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Added => write!(f, "added"),
            ChangeType::Removed => write!(f, "removed"),
            ChangeType::Unchanged => write!(f, "unchanged"),
            ChangeType::DataChanged => write!(f, "data_changed"),
        }
    }
}

/// One entry of a column's top-value list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopValue {
    /// The categorical value.
    pub value: String,
    /// Summed measure for this value.
    pub count: i64,
    /// Share of the column total, in percent.
    pub percentage: f64,
}

/// Group-and-sum result for one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAnalysis {
    /// Column name.
    pub column: String,
    /// Number of distinct (non-empty) values.
    pub unique_values: usize,
    /// Sum of the measure over all groups.
    pub total: i64,
    /// Largest groups, descending.
    pub top_values: Vec<TopValue>,
}

/// Aggregated statistics of one theme in one release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeAnalysis {
    pub theme: Theme,
    /// Number of CSV files that were loaded.
    pub files_loaded: usize,
    /// Number of CSV files that were excluded as unreadable or malformed.
    pub files_failed: usize,
    /// Number of rows across all loaded files.
    pub total_records: usize,
    /// Sum of the measure column across all rows.
    pub total_features: i64,
    /// Per-column analyses, in the order the columns were requested.
    pub columns: Vec<ColumnAnalysis>,
}

impl ThemeAnalysis {
    /// Look up the analysis of a column.
    #[cfg(test)]
    pub fn column(&self, name: &str) -> Option<&ColumnAnalysis> {
        self.columns.iter().find(|c| c.column == name)
    }
}

/// A raw table read from a changelog stats file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangelogTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Per (theme, type) release comparison from a changelog stats file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub theme: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub total_diff_perc: f64,
    pub added: f64,
    pub added_perc: f64,
    pub removed: f64,
    pub removed_perc: f64,
    pub data_changed: f64,
    pub data_changed_perc: f64,
    pub unchanged: f64,
    pub unchanged_perc: f64,
}

/// Metadata about a generated analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Release the report was computed for.
    pub release: String,
    /// Directory the metrics were read from.
    pub source_dir: String,
    /// Date and time of generation.
    pub generated_at: DateTime<Local>,
    /// Number of CSV files loaded across all themes.
    pub files_analyzed: usize,
    /// Number of CSV files excluded across all themes.
    pub files_failed: usize,
}

/// The complete result of the `analyze` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub themes: Vec<ThemeAnalysis>,
    /// Raw changelog stats of the release, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog: Option<ChangelogTable>,
}

/// Total count of one (release, theme, type) column-stats file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub release: String,
    pub theme: String,
    pub data_type: String,
    /// Summed count column of the file.
    pub total_rows: i64,
    /// Number of CSV rows in the file.
    pub csv_rows: usize,
    /// Change relative to the previous release of the same (theme, type).
    pub pct_change: Option<f64>,
}

/// Total count of one (release, theme), summed across types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSummary {
    pub release: String,
    pub theme: String,
    pub total_rows: i64,
    /// Change relative to the previous release of the same theme.
    pub pct_change: Option<f64>,
}
