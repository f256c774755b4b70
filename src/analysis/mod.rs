//! Table loading, aggregation and change calculation.

pub mod aggregator;
pub mod changelog;
pub mod changes;
pub mod table;

pub use aggregator::{
    categorical_columns, detect_count_total, summarize_theme, Measure, DEFAULT_TOP_N,
};
pub use changes::{latest_per_theme, limit_releases, theme_totals, with_type_changes};
pub use table::{LoadMode, LoadSummary, Table};
