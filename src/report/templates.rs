//! Static schema descriptions and prompt text embedded in the reports.

use crate::models::{ChangeType, Theme};

/// Reference entry for a grouping column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDefinition {
    pub name: &'static str,
    pub definition: &'static str,
    pub kind: &'static str,
    pub examples: Option<&'static str>,
    pub usage: Option<&'static str>,
    pub interpretation: Option<&'static str>,
    pub notes: Option<&'static str>,
    /// Whether the enumerated change types are listed.
    pub lists_change_types: bool,
}

const fn column(name: &'static str, definition: &'static str, kind: &'static str) -> ColumnDefinition {
    ColumnDefinition {
        name,
        definition,
        kind,
        examples: None,
        usage: None,
        interpretation: None,
        notes: None,
        lists_change_types: false,
    }
}

pub const COLUMN_DEFINITIONS: &[ColumnDefinition] = &[
    ColumnDefinition {
        notes: Some("Common values include OpenStreetMap, Microsoft ML Buildings, Google Open Buildings, Meta, ESA WorldCover, and others"),
        ..column(
            "datasets",
            "The original source(s) of the feature data",
            "String (comma-separated for multiple sources)",
        )
    },
    ColumnDefinition {
        lists_change_types: true,
        ..column(
            "change_type",
            "Feature's status compared to the previous Overture release",
            "Enumerated string",
        )
    },
    ColumnDefinition {
        examples: Some("US, BR, IN, CN, GB"),
        usage: Some("Identifies the country where the feature is located"),
        ..column("country", "ISO 3166-1 Alpha-2 country code", "2-character string")
    },
    ColumnDefinition {
        examples: Some("California, Oaxaca, Ontario, Queensland"),
        notes: Some("Meaning varies by country (US: state, Canada: province, etc.)"),
        ..column(
            "address_level_1",
            "First-level administrative division (state/province)",
            "String",
        )
    },
    ColumnDefinition {
        examples: Some("Los Angeles County, Santa Cruz Amilpas"),
        notes: Some("May represent city, county, or district depending on country"),
        ..column(
            "address_level_2",
            "Second-level administrative division (county/municipality)",
            "String",
        )
    },
    ColumnDefinition {
        notes: Some("Optional; not all countries use three address levels"),
        ..column(
            "address_level_3",
            "Third-level administrative division (neighborhood/district)",
            "String",
        )
    },
    ColumnDefinition {
        notes: Some("Buildings: use type (residential, commercial, etc.); Transportation: pathway type (road, rail, water); Base: feature category; Divisions: administrative level"),
        ..column(
            "subtype",
            "Broad category of the feature (meaning varies by theme)",
            "Enumerated string",
        )
    },
    ColumnDefinition {
        notes: Some("Provides finer granularity than subtype"),
        ..column(
            "class",
            "More specific classification within the subtype",
            "Enumerated string",
        )
    },
    ColumnDefinition {
        examples: Some("driveway, parking_aisle, sidewalk, link, crosswalk, alley"),
        ..column(
            "subclass",
            "Optional refinement of class (primarily in Transportation)",
            "Enumerated string",
        )
    },
    ColumnDefinition {
        usage: Some("Identifies place location in Places theme"),
        ..column(
            "place_countries",
            "ISO 3166-1 Alpha-2 code for the country where place is located",
            "2-character string",
        )
    },
    ColumnDefinition {
        notes: Some("Over 2,000 unique categories exist in Places theme"),
        ..column(
            "primary_category",
            "Main category describing the place's purpose or service",
            "String",
        )
    },
    ColumnDefinition {
        interpretation: Some("1.0 = verified/confirmed; 0.5-0.8 = moderate confidence; 0.0 = permanently closed or does not exist"),
        notes: Some("This is NOT operating hours; it is existence certainty"),
        ..column(
            "confidence",
            "Numerical score indicating certainty of place existence",
            "Float (0.0 to 1.0)",
        )
    },
];

/// Look up a column definition by name.
pub fn column_definition(name: &str) -> Option<&'static ColumnDefinition> {
    COLUMN_DEFINITIONS.iter().find(|d| d.name == name)
}

/// Change types in the order the schema reference lists them.
pub fn change_type_values() -> [ChangeType; 4] {
    [
        ChangeType::Unchanged,
        ChangeType::DataChanged,
        ChangeType::Added,
        ChangeType::Removed,
    ]
}

/// Columns present in every theme.
pub const UNIVERSAL_COLUMNS: &[&str] = &["datasets", "change_type"];

/// Theme-specific schema sections.
pub const THEME_SCHEMA_SECTIONS: &[(&str, &[&str])] = &[
    (
        "ADDRESSES THEME",
        &["country", "address_level_1", "address_level_2", "address_level_3"],
    ),
    ("BUILDINGS THEME", &["subtype", "class"]),
    ("PLACES THEME", &["place_countries", "primary_category", "confidence"]),
    ("DIVISIONS THEME", &["subtype", "class", "country"]),
    ("TRANSPORTATION THEME", &["subtype", "class", "subclass"]),
    ("BASE THEME", &["subtype", "class"]),
];

/// Columns whose statistics appear in the per-theme sections of the guide.
pub const REPORTED_COLUMNS: &[&str] = &[
    "change_type",
    "datasets",
    "subtype",
    "class",
    "subclass",
    "country",
    "place_countries",
    "primary_category",
    "confidence",
    "address_level_1",
    "address_level_2",
];

/// Narrative description of a theme.
#[derive(Debug, Clone, Copy)]
pub struct ThemeDescription {
    pub title: &'static str,
    pub description: &'static str,
    pub feature_count_label: &'static str,
    pub key_points: &'static [&'static str],
}

pub fn describe(theme: Theme) -> ThemeDescription {
    match theme {
        Theme::Addresses => ThemeDescription {
            title: "ADDRESSES",
            description: "Address points with hierarchical administrative levels",
            feature_count_label: "addresses",
            key_points: &[
                "Simplified, worldwide address schema based primarily on OpenAddresses",
                "Includes hierarchical administrative levels (address_level_1, 2, 3)",
                "Coverage varies significantly by country",
            ],
        },
        Theme::Buildings => ThemeDescription {
            title: "BUILDINGS",
            description: "Building footprints categorized by use and construction details",
            feature_count_label: "buildings",
            key_points: &[
                "Categorized by use (residential, commercial, industrial, etc.)",
                "Sources: Google Open Buildings, Microsoft ML Buildings, OpenStreetMap",
                "Includes detailed attributes: height, floors, construction details",
            ],
        },
        Theme::Places => ThemeDescription {
            title: "PLACES",
            description: "Points of interest including businesses, landmarks, and amenities",
            feature_count_label: "places",
            key_points: &[
                "Businesses, landmarks, amenities, and services worldwide",
                "Confidence scores indicate data quality (0.0 to 1.0)",
                "Primary sources: Meta, Microsoft",
                "Over 2,000 unique place categories",
            ],
        },
        Theme::Divisions => ThemeDescription {
            title: "DIVISIONS",
            description: "Administrative boundaries and divisions",
            feature_count_label: "divisions",
            key_points: &[
                "Nine administrative levels: country → dependency → region → county → localadmin → locality → macrohood → neighborhood → microhood",
                "Translated into 40+ languages",
                "Includes population data and administrative hierarchies",
            ],
        },
        Theme::Transportation => ThemeDescription {
            title: "TRANSPORTATION",
            description: "Transportation network including roads, rails, and waterways",
            feature_count_label: "features",
            key_points: &[
                "Includes segments (pathways) and connectors (intersections)",
                "Detailed routing attributes: speed limits, access restrictions, surface types",
                "Primarily road data with some rail and water routes",
            ],
        },
        Theme::Base => ThemeDescription {
            title: "BASE",
            description: "Contextual features including land, water, and infrastructure",
            feature_count_label: "features",
            key_points: &[
                "Six feature types: land, water, land_cover, land_use, infrastructure, bathymetry",
                "Includes natural features (forests, streams) and infrastructure (bridges, power lines)",
                "Land cover data from ESA WorldCover 2020 (10m resolution)",
            ],
        },
    }
}

/// Exploration prompts of the LLM guide, grouped by category.
pub const EXPLORATION_PROMPTS: &[(&str, &[&str])] = &[
    (
        "Geographic Distribution",
        &[
            "Which countries have the highest concentration of Places data? Show me the top 10 countries and their percentages.",
            "Compare the distribution of Divisions data across China, India, and the United States.",
            "What percentage of global building data comes from each data source?",
        ],
    ),
    (
        "Data Quality & Confidence",
        &[
            "What proportion of Places have high confidence scores (0.8 or above)?",
            "In the Buildings theme, how much data changed between releases?",
            "Which themes had no changes in this release?",
        ],
    ),
    (
        "Category Analysis",
        &[
            "What are the top 10 most common building types globally?",
            "For the Places theme, list the top 15 primary categories.",
            "In Transportation, what's the breakdown between road, rail, and water segments?",
        ],
    ),
    (
        "Comparative Insights",
        &[
            "Compare the data source distribution across all six themes.",
            "Which theme has the most diverse categorical values?",
            "What are the most common road classes in the Transportation theme?",
        ],
    ),
];

/// Sample prompts of the release trend context.
pub const TREND_PROMPTS: &[&str] = &[
    "Summarize major changes between the first and last releases.",
    "Which theme had the largest data growth?",
    "Find anomalies in row counts across releases.",
    "Compare buildings vs addresses growth rate.",
    "Which data types within themes show the most volatility?",
    "Identify themes with consistent growth patterns.",
    "What are the top 3 fastest growing themes?",
];

pub const INSTRUCTIONS_ROLE: &str = "\
You are a data analyst assistant helping users understand and explore Overture Maps
data. This document contains comprehensive statistics, schema definitions, and
context about the Overture Maps Foundation's open geospatial datasets.
";

pub const INSTRUCTIONS_USAGE: &[&str] = &[
    "Answer user questions about data distributions, coverage, and characteristics",
    "Provide specific numbers, percentages, and comparisons when available",
    "Reference the schema definitions to explain data structure",
    "Use the statistics sections to support your analysis",
    "Be precise and cite specific metrics from this document",
];

pub const FOUNDATION_OVERVIEW: &str = "\
Overture Maps Foundation is an open data initiative that provides free,
interoperable geospatial datasets for mapping applications worldwide. The data
is released as GeoParquet files with a JSON schema definition, using GeoJSON
as the canonical geospatial format.
";

pub const RESOURCES: &str = "\
**Official Documentation**:
  - Overture Maps Documentation: https://docs.overturemaps.org/
  - Schema Reference: https://docs.overturemaps.org/schema/reference/
  - Data Guides: https://docs.overturemaps.org/guides/

**Data Sources**:
  - OpenStreetMap: https://www.openstreetmap.org/
  - ESA WorldCover: https://worldcover.esa.int/
  - Overture GitHub: https://github.com/OvertureMaps/data
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_schema_column_is_defined() {
        for column in UNIVERSAL_COLUMNS {
            assert!(column_definition(column).is_some(), "{column}");
        }
        for (_, columns) in THEME_SCHEMA_SECTIONS {
            for column in *columns {
                assert!(column_definition(column).is_some(), "{column}");
            }
        }
    }

    #[test]
    fn test_change_type_descriptions_are_present() {
        assert!(column_definition("change_type").unwrap().lists_change_types);
        for change in change_type_values() {
            assert!(!change.description().is_empty());
        }
    }

    #[test]
    fn test_every_theme_is_described() {
        for theme in Theme::ALL {
            let description = describe(theme);
            assert_eq!(description.title, theme.as_str().to_uppercase());
            assert!(!description.key_points.is_empty());
        }
    }
}
