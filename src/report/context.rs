//! LLM exploration guide for one release.
//!
//! The document is split by fixed markers (`<<<SCHEMA_START>>>` and
//! friends) so downstream tooling can cut sections out of it.

use crate::analysis::changelog::entries_for_theme;
use crate::models::{ChangelogEntry, ThemeAnalysis};
use crate::report::format::{format_count, format_large_number, rule, title_case};
use crate::report::templates::{
    change_type_values, column_definition, describe, ColumnDefinition, EXPLORATION_PROMPTS,
    FOUNDATION_OVERVIEW, INSTRUCTIONS_ROLE, INSTRUCTIONS_USAGE, REPORTED_COLUMNS, RESOURCES,
    THEME_SCHEMA_SECTIONS, UNIVERSAL_COLUMNS,
};
use chrono::{DateTime, Local};

/// Everything the guide is rendered from.
#[derive(Debug, Clone)]
pub struct ContextInput {
    pub release: String,
    pub generated_at: DateTime<Local>,
    /// Analyzed themes, in presentation order.
    pub themes: Vec<ThemeAnalysis>,
    /// Changelog entries of the release, if a changelog file was found.
    pub changelog: Option<Vec<ChangelogEntry>>,
    /// Values listed per column in the statistics sections.
    pub top_n: usize,
}

/// Render the complete guide.
pub fn generate_context_document(input: &ContextInput) -> String {
    let mut doc = String::new();

    doc.push_str(&generate_header(input));
    doc.push_str(&generate_instructions(&input.release));
    doc.push_str(&generate_overview(&input.themes));
    doc.push_str(&generate_schema_reference());
    for theme in &input.themes {
        doc.push_str(&generate_theme_statistics(
            theme,
            input.changelog.as_deref(),
            input.top_n,
        ));
    }
    doc.push_str(&generate_prompts());
    doc.push_str(&generate_resources());

    doc
}

fn generate_header(input: &ContextInput) -> String {
    let mut section = String::new();
    section.push_str(&format!("{}\n", rule(80)));
    section.push_str("OVERTURE MAPS DATA - LLM EXPLORATION GUIDE\n");
    section.push_str(&format!("{}\n", rule(80)));
    section.push_str(&format!("Release Version: {}\n", input.release));
    section.push_str("Document Purpose: Enable natural language querying of Overture Maps data\n");
    section.push_str(&format!(
        "Generated: {}\n\n",
        input.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    section
}

fn generate_instructions(release: &str) -> String {
    let mut section = String::new();
    section.push_str("<<<INSTRUCTIONS_START>>>\n\n");

    section.push_str("## YOUR ROLE\n");
    section.push_str(INSTRUCTIONS_ROLE);
    section.push('\n');

    section.push_str("## HOW TO USE THIS DOCUMENT\n");
    for line in INSTRUCTIONS_USAGE {
        section.push_str(&format!("- {}\n", line));
    }
    section.push('\n');

    section.push_str("## KEY CONSTRAINTS\n");
    section.push_str(&format!("- Data is from release {} only\n", release));
    section.push_str("- All statistics represent aggregated counts across multiple data sources\n");
    section.push_str("- Some themes may have data quality variations by geographic region\n");
    section.push_str("- Confidence scores in Places theme range from 0.0 (closed/doesn't exist) to 1.0 (verified)\n\n");

    section.push_str("<<<INSTRUCTIONS_END>>>\n\n\n");
    section
}

fn generate_overview(themes: &[ThemeAnalysis]) -> String {
    let mut section = String::new();
    section.push_str(&format!("{}\n", rule(80)));
    section.push_str("## OVERTURE MAPS FOUNDATION OVERVIEW\n");
    section.push_str(&format!("{}\n\n", rule(80)));
    section.push_str(FOUNDATION_OVERVIEW);
    section.push('\n');

    section.push_str("### THE SIX DATA THEMES\n\n");
    for theme in themes {
        let info = describe(theme.theme);
        section.push_str(&format!("**{}**\n", info.title));
        section.push_str(&format!(
            "   - {} {}\n",
            format_large_number(theme.total_features),
            info.feature_count_label
        ));
        section.push_str(&format!("   - {}\n", info.description));
        for point in info.key_points {
            section.push_str(&format!("   - {}\n", point));
        }
        section.push('\n');
    }

    section
}

fn generate_schema_reference() -> String {
    let mut section = String::new();
    section.push_str(&format!("\n{}\n", rule(80)));
    section.push_str("<<<SCHEMA_START>>>\n");
    section.push_str("## SCHEMA REFERENCE - GROUPING COLUMNS\n");
    section.push_str(&format!("{}\n\n", rule(80)));
    section.push_str("This section defines the key columns used to categorize and group data across\n");
    section.push_str("all themes. Understanding these columns is essential for querying the data.\n\n");

    section.push_str("---\n### UNIVERSAL COLUMNS (All Themes)\n---\n\n");
    for definition in UNIVERSAL_COLUMNS.iter().filter_map(|c| column_definition(c)) {
        section.push_str(&render_universal_definition(definition));
    }

    for (title, columns) in THEME_SCHEMA_SECTIONS {
        section.push_str(&format!("---\n### {} COLUMNS\n---\n\n", title));
        for definition in columns.iter().filter_map(|c| column_definition(c)) {
            section.push_str(&render_theme_definition(definition));
        }
    }

    section.push_str("<<<SCHEMA_END>>>\n\n\n");
    section
}

fn render_universal_definition(definition: &ColumnDefinition) -> String {
    let mut block = String::new();
    block.push_str(&format!("**{}**\n", definition.name));
    block.push_str(&format!("Definition: {}\n", definition.definition));
    block.push_str(&format!("Type: {}\n", definition.kind));
    if definition.lists_change_types {
        block.push_str("Possible Values:\n");
        for change in change_type_values() {
            block.push_str(&format!("  - {}: {}\n", change, change.description()));
        }
    }
    if let Some(notes) = definition.notes {
        block.push_str(&format!("Notes: {}\n", notes));
    }
    block.push('\n');
    block
}

fn render_theme_definition(definition: &ColumnDefinition) -> String {
    let mut block = String::new();
    block.push_str(&format!("**{}**\n", definition.name));
    block.push_str(&format!("Definition: {}\n", definition.definition));
    block.push_str(&format!("Type: {}\n", definition.kind));
    let optional = [
        ("Examples", definition.examples),
        ("Usage", definition.usage),
        ("Interpretation", definition.interpretation),
        ("Notes", definition.notes),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            block.push_str(&format!("{}: {}\n", label, value));
        }
    }
    block.push('\n');
    block
}

fn generate_theme_statistics(
    theme: &ThemeAnalysis,
    changelog: Option<&[ChangelogEntry]>,
    top_n: usize,
) -> String {
    let info = describe(theme.theme);
    let mut section = String::new();

    section.push_str(&format!("{}\n", rule(80)));
    section.push_str(&format!("## THEME STATISTICS: {}\n", info.title));
    section.push_str(&format!("{}\n\n", rule(80)));
    section.push_str(&format!(
        "**Total Features**: {} {}\n\n",
        format_count(theme.total_features),
        info.feature_count_label
    ));

    let entries = entries_for_theme(changelog.unwrap_or_default(), theme.theme.as_str());
    if !entries.is_empty() {
        section.push_str("**Release Comparison** (vs. baseline):\n");
        for entry in entries {
            section.push_str(&render_changelog_entry(entry));
        }
        section.push('\n');
    }

    for column in theme
        .columns
        .iter()
        .filter(|c| REPORTED_COLUMNS.contains(&c.column.as_str()))
    {
        section.push_str(&format!("**{}**:\n", title_case(&column.column)));
        section.push_str(&format!("  Unique Values: {}\n", column.unique_values));
        if !column.top_values.is_empty() {
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
        section.push('\n');
    }

    section.push('\n');
    section
}

fn render_changelog_entry(entry: &ChangelogEntry) -> String {
    let mut block = String::new();
    block.push_str(&format!("  Type: {}\n", entry.data_type));
    block.push_str(&format!("  - Total Change: {:.2}%\n", entry.total_diff_perc));
    let parts = [
        ("Added", entry.added, entry.added_perc),
        ("Removed", entry.removed, entry.removed_perc),
        ("Data Changed", entry.data_changed, entry.data_changed_perc),
        ("Unchanged", entry.unchanged, entry.unchanged_perc),
    ];
    for (label, count, perc) in parts {
        block.push_str(&format!(
            "  - {}: {} ({:.2}%)\n",
            label,
            format_count(count.trunc() as i64),
            perc
        ));
    }
    block
}

fn generate_prompts() -> String {
    let mut section = String::new();
    section.push_str(&format!("{}\n", rule(80)));
    section.push_str("<<<PROMPTS_START>>>\n");
    section.push_str("## SUGGESTED EXPLORATION PROMPTS\n");
    section.push_str(&format!("{}\n\n", rule(80)));
    section.push_str("Use these prompts to begin exploring the Overture Maps data. Each prompt is\n");
    section.push_str("designed to leverage the statistics and schema information in this document.\n\n");

    for (category, prompts) in EXPLORATION_PROMPTS {
        section.push_str(&format!("### {}\n\n", category));
        for (i, prompt) in prompts.iter().enumerate() {
            section.push_str(&format!("{}. \"{}\"\n\n", i + 1, prompt));
        }
    }

    section.push_str("<<<PROMPTS_END>>>\n\n\n");
    section
}

fn generate_resources() -> String {
    let mut section = String::new();
    section.push_str(&format!("{}\n", rule(80)));
    section.push_str("## ADDITIONAL RESOURCES\n");
    section.push_str(&format!("{}\n\n", rule(80)));
    section.push_str(RESOURCES);
    section.push('\n');
    section.push_str(&format!("{}\n", rule(80)));
    section.push_str("END OF DOCUMENT\n");
    section.push_str(&format!("{}\n", rule(80)));
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnAnalysis, Theme, TopValue};
    use chrono::TimeZone;

    fn places() -> ThemeAnalysis {
        ThemeAnalysis {
            theme: Theme::Places,
            files_loaded: 2,
            files_failed: 0,
            total_records: 40,
            total_features: 54_300_000,
            columns: vec![
                ColumnAnalysis {
                    column: "place_countries".to_string(),
                    unique_values: 2,
                    total: 54_300_000,
                    top_values: vec![
                        TopValue {
                            value: "US".to_string(),
                            count: 30_000_000,
                            percentage: 55.248618784530386,
                        },
                        TopValue {
                            value: "BR".to_string(),
                            count: 24_300_000,
                            percentage: 44.751381215469614,
                        },
                    ],
                },
                ColumnAnalysis {
                    column: "version".to_string(),
                    unique_values: 1,
                    total: 54_300_000,
                    top_values: vec![],
                },
            ],
        }
    }

    fn input() -> ContextInput {
        ContextInput {
            release: "2025-08-20.1".to_string(),
            generated_at: Local.with_ymd_and_hms(2025, 9, 1, 8, 30, 0).unwrap(),
            themes: vec![places()],
            changelog: Some(vec![ChangelogEntry {
                theme: "places".to_string(),
                data_type: "place".to_string(),
                total_diff_perc: 1.5,
                added: 1200.0,
                added_perc: 2.0,
                removed: 300.0,
                removed_perc: 0.5,
                data_changed: 600.0,
                data_changed_perc: 1.0,
                unchanged: 58000.0,
                unchanged_perc: 96.5,
            }]),
            top_n: 10,
        }
    }

    #[test]
    fn test_sections_appear_in_order() {
        let doc = generate_context_document(&input());
        let markers = [
            "<<<INSTRUCTIONS_START>>>",
            "<<<INSTRUCTIONS_END>>>",
            "### THE SIX DATA THEMES",
            "<<<SCHEMA_START>>>",
            "<<<SCHEMA_END>>>",
            "## THEME STATISTICS: PLACES",
            "<<<PROMPTS_START>>>",
            "<<<PROMPTS_END>>>",
            "END OF DOCUMENT",
        ];
        let mut last = 0;
        for marker in markers {
            let pos = doc[last..]
                .find(marker)
                .unwrap_or_else(|| panic!("missing {marker}"));
            last += pos + marker.len();
        }
    }

    #[test]
    fn test_header_and_overview() {
        let doc = generate_context_document(&input());
        assert!(doc.contains("Release Version: 2025-08-20.1\n"));
        assert!(doc.contains("Generated: 2025-09-01 08:30:00\n"));
        assert!(doc.contains("- Data is from release 2025-08-20.1 only\n"));
        assert!(doc.contains("**PLACES**\n   - 54.30M places\n"));
        assert!(!doc.contains("**BUILDINGS**\n"));
    }

    #[test]
    fn test_schema_lists_change_types() {
        let doc = generate_context_document(&input());
        assert!(doc.contains("  - data_changed: Feature exists in both but has modified attributes\n"));
        assert!(doc.contains("### PLACES THEME COLUMNS"));
        assert!(doc.contains("Interpretation: 1.0 = verified/confirmed"));
    }

    #[test]
    fn test_theme_statistics_with_changelog() {
        let doc = generate_context_document(&input());
        assert!(doc.contains("**Total Features**: 54,300,000 places\n"));
        assert!(doc.contains("**Release Comparison** (vs. baseline):\n  Type: place\n"));
        assert!(doc.contains("  - Added: 1,200 (2.00%)\n"));
        assert!(doc.contains("  - Unchanged: 58,000 (96.50%)\n"));
        assert!(doc.contains("**Place Countries**:\n  Unique Values: 2\n"));
        assert!(doc.contains("    US: 30,000,000 (55.25%)\n"));
        assert!(!doc.contains("**Version**"));
    }

    #[test]
    fn test_prompts_are_numbered_per_category() {
        let doc = generate_context_document(&input());
        assert!(doc.contains("### Category Analysis\n\n1. \"What are the top 10"));
    }

    #[test]
    fn test_document_is_deterministic() {
        let input = input();
        assert_eq!(
            generate_context_document(&input),
            generate_context_document(&input)
        );
    }
}
