//! Group-and-sum aggregation over categorical columns.

use crate::analysis::table::{parse_number, LoadSummary, Table};
use crate::models::{ColumnAnalysis, Theme, ThemeAnalysis, TopValue};
use std::collections::HashMap;

/// Number of entries kept per column.
pub const DEFAULT_TOP_N: usize = 15;

/// Columns that hold measures rather than categories.
pub const METRIC_COLUMNS: &[&str] = &[
    "total_count",
    "id_count",
    "geometry_count",
    "bbox_count",
    "version_count",
    "sources_count",
    "average_geometry_length_km",
    "total_geometry_length_km",
    "average_geometry_area_km2",
    "total_geometry_area_km2",
];

/// What gets summed per group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Measure {
    /// Sum of a numeric column.
    Column(String),
    /// Every row counts as one.
    RowCount,
}

impl Measure {
    /// Pick the measure: the preferred column if present, then
    /// `total_count`, then `id_count`, then the row count.
    pub fn resolve(table: &Table, preferred: Option<&str>) -> Self {
        preferred
            .into_iter()
            .chain(["total_count", "id_count"])
            .find(|name| table.has_column(name))
            .map(|name| Measure::Column(name.to_string()))
            .unwrap_or(Measure::RowCount)
    }

    /// Measure total over every row of the table.
    pub fn total(&self, table: &Table) -> i64 {
        match self {
            Measure::Column(name) => table.sum_column(name).unwrap_or(0.0).round() as i64,
            Measure::RowCount => table.len() as i64,
        }
    }

    pub fn is_row_count(&self) -> bool {
        matches!(self, Measure::RowCount)
    }
}

/// Group rows by `column`, sum `measure`, sort descending and keep `top_n`.
///
/// Returns `None` when the column is absent. Rows with an empty value in
/// `column` are not grouped. Ties are ordered by value.
pub fn group_by_column(
    table: &Table,
    column: &str,
    measure: &Measure,
    top_n: usize,
) -> Option<ColumnAnalysis> {
    let keys = table.column_values(column)?;

    let amounts: Vec<f64> = match measure {
        Measure::Column(name) => table
            .column_values(name)?
            .map(|v| v.and_then(parse_number).unwrap_or(0.0))
            .collect(),
        Measure::RowCount => vec![1.0; table.len()],
    };

    let mut grouped: HashMap<&str, f64> = HashMap::new();
    for (key, amount) in keys.zip(amounts) {
        if let Some(key) = key {
            *grouped.entry(key).or_default() += amount;
        }
    }

    let mut groups: Vec<(String, i64)> = grouped
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.round() as i64))
        .collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let total: i64 = groups.iter().map(|(_, c)| c).sum();
    let unique_values = groups.len();

    let top_values = groups
        .into_iter()
        .take(top_n)
        .map(|(value, count)| TopValue {
            percentage: percentage(count, total),
            value,
            count,
        })
        .collect();

    Some(ColumnAnalysis {
        column: column.to_string(),
        unique_values,
        total,
        top_values,
    })
}

/// Analyze each requested column that exists in the table.
pub fn analyze_columns<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    measure: &Measure,
    top_n: usize,
) -> Vec<ColumnAnalysis> {
    columns
        .iter()
        .filter_map(|c| group_by_column(table, c.as_ref(), measure, top_n))
        .collect()
}

/// Columns holding categories: not a known metric and not purely numeric.
pub fn categorical_columns(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|c| !METRIC_COLUMNS.contains(&c.as_str()))
        .filter(|c| !table.is_numeric_column(c))
        .filter(|c| table.column_values(c).is_some_and(|mut v| v.any(|x| x.is_some())))
        .cloned()
        .collect()
}

/// Count column of a column-stats file and its sum.
///
/// The first column whose name mentions `count` or `total` wins, then the
/// last numeric column, then the number of rows.
pub fn detect_count_total(table: &Table) -> (Option<String>, f64) {
    let named = table.columns().iter().find(|c| {
        let lower = c.to_lowercase();
        lower.contains("count") || lower.contains("total")
    });
    if let Some(col) = named {
        return (Some(col.clone()), table.sum_column(col).unwrap_or(0.0));
    }

    let numeric = table
        .columns()
        .iter()
        .rev()
        .find(|c| table.is_numeric_column(c));
    if let Some(col) = numeric {
        return (Some(col.clone()), table.sum_column(col).unwrap_or(0.0));
    }

    (None, table.len() as f64)
}

/// Summarize a theme's loaded rows over the given columns.
///
/// Total features is the sum of the count column, or zero when the
/// files carry no count column.
pub fn summarize_theme<S: AsRef<str>>(
    theme: Theme,
    table: &Table,
    load: &LoadSummary,
    columns: &[S],
    top_n: usize,
) -> ThemeAnalysis {
    let measure = Measure::resolve(table, None);
    let total_features = if measure.is_row_count() {
        0
    } else {
        measure.total(table)
    };

    ThemeAnalysis {
        theme,
        files_loaded: load.files_loaded,
        files_failed: load.failures.len(),
        total_records: table.len(),
        total_features,
        columns: analyze_columns(table, columns, &measure, top_n),
    }
}

/// `count / total * 100`, or zero when the total is zero.
pub fn percentage(count: i64, total: i64) -> f64 {
    if total > 0 {
        count as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}
