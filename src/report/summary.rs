//! Plain-text summary of the `analyze` command.

use crate::models::{AnalysisReport, ChangelogTable, ThemeAnalysis};
use crate::report::format::{format_count, rule, text_table};
use anyhow::Result;

/// Generate the complete summary text.
pub fn generate_summary_report(report: &AnalysisReport, top_n: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("Release: {}\n", report.metadata.release));
    output.push_str(&format!("Source: {}\n", report.metadata.source_dir));
    output.push_str(&format!(
        "Generated: {}\n",
        report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    output.push_str(&format!(
        "Files Analyzed: {}\n",
        report.metadata.files_analyzed
    ));
    if report.metadata.files_failed > 0 {
        output.push_str(&format!("Files Failed: {}\n", report.metadata.files_failed));
    }

    for theme in &report.themes {
        output.push_str(&generate_theme_section(theme, top_n));
    }

    if let Some(ref changelog) = report.changelog {
        output.push_str(&generate_changelog_section(changelog));
    }

    output
}

fn generate_theme_section(theme: &ThemeAnalysis, top_n: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("\n{}\n", rule(80)));
    section.push_str(&format!("{} THEME\n", theme.theme.as_str().to_uppercase()));
    section.push_str(&format!("{}\n", rule(80)));
    section.push_str(&format!(
        "Total Records: {}\n",
        format_count(theme.total_records as i64)
    ));
    section.push_str(&format!(
        "Total Features: {}\n",
        format_count(theme.total_features)
    ));

    for column in &theme.columns {
        section.push_str(&format!("\n{}:\n", column.column));
        section.push_str(&format!("  Unique Values: {}\n", column.unique_values));
        section.push_str("  Top Values:\n");
        for item in column.top_values.iter().take(top_n) {
            section.push_str(&format!(
                "    {}: {} ({:.2}%)\n",
                item.value,
                format_count(item.count),
                item.percentage
            ));
        }
    }

    section
}

fn generate_changelog_section(changelog: &ChangelogTable) -> String {
    let mut section = String::new();

    section.push_str(&format!("\n{}\n", rule(80)));
    section.push_str("CHANGELOG STATS\n");
    section.push_str(&format!("{}\n", rule(80)));
    section.push_str("\nRelease Summary:\n");
    section.push_str(&text_table(&changelog.headers, &changelog.rows));

    section
}

/// Generate a JSON rendition of the same report.
pub fn generate_json_report(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
