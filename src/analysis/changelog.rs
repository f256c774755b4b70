//! Changelog stats of a release.

use crate::analysis::table::sniff_delimiter;
use crate::models::{ChangelogEntry, ChangelogTable};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Read a changelog stats file as a raw table.
pub fn load_changelog_table(path: &Path) -> Result<ChangelogTable> {
    let mut reader = open_reader(path)?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Malformed row in {}", path.display()))?;
        rows.push(record.iter().map(|f| f.trim().to_string()).collect());
    }

    Ok(ChangelogTable { headers, rows })
}

/// Read the typed per-(theme, type) entries. Rows that lack a required
/// column or hold a non-numeric value are skipped.
pub fn load_changelog_entries(path: &Path) -> Result<Vec<ChangelogEntry>> {
    let mut reader = open_reader(path)?;

    let mut entries = Vec::new();
    for (line, record) in reader.deserialize::<ChangelogEntry>().enumerate() {
        match record {
            Ok(entry) => entries.push(entry),
            Err(e) => debug!("Skipping changelog row {} of {}: {}", line + 2, path.display(), e),
        }
    }

    Ok(entries)
}

/// Entries belonging to one theme.
pub fn entries_for_theme<'a>(entries: &'a [ChangelogEntry], theme: &str) -> Vec<&'a ChangelogEntry> {
    entries.iter().filter(|e| e.theme == theme).collect()
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    let delimiter = sniff_delimiter(path)
        .with_context(|| format!("Failed to open changelog {}", path.display()))?;

    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open changelog {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TSV: &str = "theme\ttype\ttotal_diff_perc\tadded\tadded_perc\tremoved\tremoved_perc\tdata_changed\tdata_changed_perc\tunchanged\tunchanged_perc\n\
buildings\tbuilding\t1.5\t1200\t2.0\t300\t0.5\t600\t1.0\t58000\t96.5\n\
places\tplace\t-0.25\t10\t0.1\t35\t0.35\t0\t0\t9955\t99.55\n\
broken\trow\tn/a\t1\t1\t1\t1\t1\t1\t1\t1\n";

    fn write_tsv() -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changelog.csv");
        fs::write(&path, TSV).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_typed_entries_skips_bad_rows() {
        let (_dir, path) = write_tsv();
        let entries = load_changelog_entries(&path).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].theme, "buildings");
        assert_eq!(entries[0].data_type, "building");
        assert_eq!(entries[0].added, 1200.0);
        assert_eq!(entries[1].total_diff_perc, -0.25);

        assert_eq!(entries_for_theme(&entries, "places").len(), 1);
        assert!(entries_for_theme(&entries, "base").is_empty());
    }

    #[test]
    fn test_load_raw_table() {
        let (_dir, path) = write_tsv();
        let table = load_changelog_table(&path).unwrap();

        assert_eq!(table.headers.len(), 11);
        assert_eq!(table.headers[0], "theme");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[2][2], "n/a");
    }

    #[test]
    fn test_comma_separated_changelog() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changelog.csv");
        fs::write(&path, "release,added\n2025-08-20.1,5\n").unwrap();

        let table = load_changelog_table(&path).unwrap();
        assert_eq!(table.headers, vec!["release", "added"]);
        assert_eq!(table.rows, vec![vec!["2025-08-20.1", "5"]]);
    }
}
