//! Report writers.
//!
//! Every writer is a pure function of its input; the generation timestamp
//! is passed in so identical inputs render identical text.

pub mod context;
pub mod format;
pub mod summary;
pub mod templates;
pub mod trends;

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

pub use context::{generate_context_document, ContextInput};
pub use summary::{generate_json_report, generate_summary_report};
pub use trends::{generate_prototype, generate_trend_context, TrendInput};

/// Write a rendered report, creating parent directories as needed.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}
