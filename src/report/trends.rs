//! Release trend context and the compact prototype summary.

use crate::analysis::latest_per_theme;
use crate::models::{ThemeSummary, TypeSummary};
use crate::report::format::{format_change, format_count, rule};
use crate::report::templates::TREND_PROMPTS;
use chrono::{DateTime, Local};
use std::collections::BTreeSet;

/// Everything the trend documents are rendered from.
#[derive(Debug, Clone)]
pub struct TrendInput {
    /// Releases covered, oldest first.
    pub releases: Vec<String>,
    pub generated_at: DateTime<Local>,
    /// Directory the column stats were read from.
    pub source_dir: String,
    /// Per (release, theme, type) rows with changes filled in.
    pub types: Vec<TypeSummary>,
    /// Per (release, theme) rows with changes filled in.
    pub themes: Vec<ThemeSummary>,
}

impl TrendInput {
    fn release_range(&self) -> String {
        match (self.releases.first(), self.releases.last()) {
            (Some(first), Some(last)) => format!("{} → {}", first, last),
            _ => "-".to_string(),
        }
    }

    fn generated_date(&self) -> String {
        self.generated_at.format("%B %d, %Y").to_string()
    }
}

fn banner(title: &str) -> String {
    format!("{}\n{}\n{}\n", rule(60), title, rule(60))
}

fn sorted_unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}

/// Render the five-section trend context.
pub fn generate_trend_context(input: &TrendInput) -> String {
    let mut doc = String::new();
    let now = input.generated_date();

    doc.push_str("# Overture Metrics LLM Context File v0.1\n");
    doc.push_str(&format!("Generated: {}\n", now));
    doc.push_str(&format!("Releases: {}\n\n", input.release_range()));

    doc.push_str(&banner("SECTION 1 — OVERVIEW"));
    doc.push_str("This file summarizes Overture's theme_column_summary_stats for LLM-based exploration.\n\n");
    doc.push_str("Data Source: Pre-aggregated column statistics that compare total counts per release.\n");
    doc.push_str("Themes include: addresses, base, buildings, divisions, places, and others.\n\n");

    doc.push_str(&banner("SECTION 2 — THEME SUMMARY (AGGREGATED)"));
    for theme in sorted_unique(input.themes.iter().map(|r| r.theme.as_str())) {
        doc.push_str(&format!("\n### THEME: {}\n", theme));
        doc.push_str("| Release | Total Count | % Change |\n");
        doc.push_str("|----------|-------------|----------|\n");
        for row in input.themes.iter().filter(|r| r.theme == theme) {
            doc.push_str(&format!(
                "| {} | {} | {} |\n",
                row.release,
                format_count(row.total_rows),
                format_change(row.pct_change, 2)
            ));
        }
        doc.push('\n');
    }

    doc.push_str(&banner("SECTION 3 — DETAILED BREAKDOWN BY TYPE"));
    for theme in sorted_unique(input.types.iter().map(|r| r.theme.as_str())) {
        doc.push_str(&format!("\n### THEME: {}\n", theme));
        let theme_rows: Vec<&TypeSummary> = input.types.iter().filter(|r| r.theme == theme).collect();

        for data_type in sorted_unique(theme_rows.iter().map(|r| r.data_type.as_str())) {
            doc.push_str(&format!("\n#### Type: {}\n", data_type));
            doc.push_str("| Release | Total Count | CSV Rows | % Change |\n");
            doc.push_str("|----------|-------------|----------|----------|\n");
            for row in theme_rows.iter().filter(|r| r.data_type == data_type) {
                doc.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    row.release,
                    format_count(row.total_rows),
                    row.csv_rows,
                    format_change(row.pct_change, 2)
                ));
            }
            doc.push('\n');
        }
    }

    doc.push_str(&banner("SECTION 4 — SAMPLE PROMPTS"));
    for (i, prompt) in TREND_PROMPTS.iter().enumerate() {
        doc.push_str(&format!("{}. {}\n", i + 1, prompt));
    }

    doc.push('\n');
    doc.push_str(&banner("SECTION 5 — METADATA"));
    doc.push_str("Data Source: Overture theme_column_summary_stats\n");
    doc.push_str(&format!("Generated on: {}\n", now));
    doc.push_str(&format!("Source Directory: {}\n", input.source_dir));
    doc.push_str(&format!("Total Releases Processed: {}\n", input.releases.len()));
    doc.push_str(&format!("Total Records Analyzed: {}\n", input.types.len()));
    doc.push_str("License: ODbL 1.0\n");
    doc.push_str("Contact: metrics@overture.org\n");

    doc
}

/// Render the compact markdown prototype. Returns `None` when there is
/// nothing to summarize.
pub fn generate_prototype(input: &TrendInput) -> Option<String> {
    if input.types.is_empty() || input.themes.is_empty() {
        return None;
    }

    let mut doc = String::new();
    doc.push_str("# Overture Metrics Prototype (auto-generated)\n");
    doc.push_str(&format!("Generated: {}\n\n", input.generated_date()));

    let themes = sorted_unique(input.themes.iter().map(|r| r.theme.as_str()));

    doc.push_str("## Overview\n");
    doc.push_str(&format!("Releases covered: {}\n", input.release_range()));
    doc.push_str(&format!("Themes analyzed: {}\n\n", themes.join(", ")));

    doc.push_str("## Key Changes Summary\n");
    for row in latest_per_theme(&input.themes) {
        doc.push_str(&format!("- {}: {}\n", row.theme, describe_change(&row)));
    }
    doc.push('\n');

    doc.push_str("## Theme Snapshots\n");
    for theme in themes {
        doc.push_str(&format!("### {}\n", theme));
        doc.push_str("| Release | Records | Δ% |\n|----------|---------|----|\n");
        let rows: Vec<&ThemeSummary> = input.themes.iter().filter(|r| r.theme == theme).collect();
        for row in rows.iter().skip(rows.len().saturating_sub(2)) {
            doc.push_str(&format!(
                "| {} | {} | {} |\n",
                row.release,
                format_count(row.total_rows),
                format_change(row.pct_change, 1)
            ));
        }
        doc.push('\n');
    }

    doc.push_str("## Notes\n");
    doc.push_str("This file provides a quick summary of recent Overture metrics.\n");
    doc.push_str("Data represents actual record counts from theme column summary statistics.\n");

    Some(doc)
}

fn describe_change(row: &ThemeSummary) -> String {
    let count = format_count(row.total_rows);
    match row.pct_change {
        Some(pct) if pct > 0.0 => format!("{} records (grew +{:.1}%)", count, pct),
        Some(pct) if pct < 0.0 => format!("{} records (decreased {:.1}%)", count, pct),
        _ => format!("{} records (stable)", count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{theme_totals, with_type_changes};
    use chrono::TimeZone;

    fn type_row(release: &str, theme: &str, data_type: &str, total: i64) -> TypeSummary {
        TypeSummary {
            release: release.to_string(),
            theme: theme.to_string(),
            data_type: data_type.to_string(),
            total_rows: total,
            csv_rows: 3,
            pct_change: None,
        }
    }

    fn input() -> TrendInput {
        let types = with_type_changes(vec![
            type_row("2025-01-22.0", "buildings", "building", 100),
            type_row("2025-02-19.0", "buildings", "building", 150),
            type_row("2025-01-22.0", "base", "water", 2_000),
            type_row("2025-02-19.0", "base", "water", 1_000),
            type_row("2025-02-19.0", "places", "place", 42),
        ]);
        let themes = theme_totals(&types);
        TrendInput {
            releases: vec!["2025-01-22.0".to_string(), "2025-02-19.0".to_string()],
            generated_at: Local.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap(),
            source_dir: "Metrics/theme_column_summary_stats".to_string(),
            types,
            themes,
        }
    }

    #[test]
    fn test_trend_context_tables() {
        let doc = generate_trend_context(&input());

        assert!(doc.starts_with("# Overture Metrics LLM Context File v0.1\nGenerated: March 04, 2025\n"));
        assert!(doc.contains("Releases: 2025-01-22.0 → 2025-02-19.0\n"));
        assert!(doc.contains(
            "### THEME: buildings\n| Release | Total Count | % Change |\n|----------|-------------|----------|\n| 2025-01-22.0 | 100 | - |\n| 2025-02-19.0 | 150 | 50.00% |\n"
        ));
        assert!(doc.contains("| 2025-02-19.0 | 1,000 | 3 | -50.00% |\n"));
        assert!(doc.contains("Total Releases Processed: 2\n"));
        assert!(doc.contains("Total Records Analyzed: 5\n"));
    }

    #[test]
    fn test_theme_sections_are_sorted() {
        let doc = generate_trend_context(&input());
        let base = doc.find("### THEME: base").unwrap();
        let buildings = doc.find("### THEME: buildings").unwrap();
        let places = doc.find("### THEME: places").unwrap();
        assert!(base < buildings && buildings < places);
    }

    #[test]
    fn test_prototype_key_changes() {
        let doc = generate_prototype(&input()).unwrap();

        assert!(doc.contains("Themes analyzed: base, buildings, places\n"));
        let key_changes = doc
            .split("## Key Changes Summary\n")
            .nth(1)
            .and_then(|s| s.split("\n\n").next())
            .unwrap();
        assert_eq!(
            key_changes,
            "- buildings: 150 records (grew +50.0%)\n- base: 1,000 records (decreased -50.0%)\n- places: 42 records (stable)"
        );
        assert!(doc.contains("### buildings\n| Release | Records | Δ% |\n|----------|---------|----|\n| 2025-01-22.0 | 100 | - |\n| 2025-02-19.0 | 150 | 50.0% |\n"));
    }

    #[test]
    fn test_prototype_requires_data() {
        let mut empty = input();
        empty.types.clear();
        empty.themes.clear();
        assert!(generate_prototype(&empty).is_none());
    }

    #[test]
    fn test_trend_context_is_deterministic() {
        let input = input();
        assert_eq!(generate_trend_context(&input), generate_trend_context(&input));
    }
}
