//! In-memory table built from one or more CSV files.
//!
//! Files are concatenated under the union of their headers; a cell
//! that a file does not provide reads as missing.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Reasons a CSV file is excluded from a table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} has no header row")]
    NoHeader { path: PathBuf },

    #[error("{path} line {line}: expected {expected} fields, found {found}")]
    TooManyFields {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("malformed CSV in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// How malformed rows are treated while loading. Rows shorter than the
/// header are not malformed; their trailing cells read as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// A malformed row excludes the whole file.
    #[default]
    Strict,
    /// Malformed rows are skipped, the rest of the file is kept.
    Lenient,
}

/// Outcome of loading a set of files.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub files_loaded: usize,
    pub failures: Vec<LoadError>,
}

/// Rows from one or more CSV files under a union schema.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from in-memory rows.
    #[cfg(test)]
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Self::new();
        let mapping = table.register_headers(headers.iter().map(|h| h.to_string()));
        for row in rows {
            let fields: Vec<String> = row.iter().map(|f| f.to_string()).collect();
            table.push_row(&mapping, fields);
        }
        table
    }

    /// Load every file, logging and skipping the ones that fail.
    pub fn load_files(paths: &[PathBuf], mode: LoadMode) -> (Self, LoadSummary) {
        let mut table = Self::new();
        let mut summary = LoadSummary::default();

        for path in paths {
            match table.append_file(path, mode) {
                Ok(rows) => {
                    debug!("Loaded {} rows from {}", rows, path.display());
                    summary.files_loaded += 1;
                }
                Err(e) => {
                    warn!("Error reading {}: {}", path.display(), e);
                    summary.failures.push(e);
                }
            }
        }

        (table, summary)
    }

    /// Append the rows of one CSV file. On error the table is unchanged.
    pub fn append_file(&mut self, path: &Path, mode: LoadMode) -> Result<usize, LoadError> {
        let delimiter = sniff_delimiter(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|source| LoadError::Malformed {
                path: path.to_path_buf(),
                source,
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(LoadError::NoHeader {
                path: path.to_path_buf(),
            });
        }

        let mut pending = Vec::new();
        for record in reader.records() {
            let result = record
                .map_err(|source| LoadError::Malformed {
                    path: path.to_path_buf(),
                    source,
                })
                .and_then(|record| {
                    if record.len() > headers.len() {
                        Err(LoadError::TooManyFields {
                            path: path.to_path_buf(),
                            line: record.position().map_or(0, |p| p.line()),
                            expected: headers.len(),
                            found: record.len(),
                        })
                    } else {
                        Ok(record)
                    }
                });

            match result {
                Ok(record) => pending.push(record.iter().map(str::to_string).collect()),
                Err(e) => match mode {
                    LoadMode::Strict => return Err(e),
                    LoadMode::Lenient => debug!("Skipping bad row: {}", e),
                },
            }
        }

        let count = pending.len();
        let mapping = self.register_headers(headers);
        for fields in pending {
            self.push_row(&mapping, fields);
        }
        Ok(count)
    }

    /// Column names in first-seen order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of a column, with `None` for missing or empty cells.
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = Option<&'a str>> + 'a> {
        let idx = *self.index.get(name)?;
        Some(self.rows.iter().map(move |row| {
            row.get(idx)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        }))
    }

    /// Sum of a numeric column. Missing or non-numeric cells count as zero.
    pub fn sum_column(&self, name: &str) -> Option<f64> {
        Some(
            self.column_values(name)?
                .filter_map(|v| v.and_then(parse_number))
                .sum(),
        )
    }

    /// True if the column has at least one value and every value is numeric.
    pub fn is_numeric_column(&self, name: &str) -> bool {
        let Some(values) = self.column_values(name) else {
            return false;
        };
        let mut seen = false;
        for value in values.flatten() {
            if parse_number(value).is_none() {
                return false;
            }
            seen = true;
        }
        seen
    }

    fn register_headers(&mut self, headers: impl IntoIterator<Item = String>) -> Vec<usize> {
        headers
            .into_iter()
            .map(|h| match self.index.get(&h) {
                Some(&idx) => idx,
                None => {
                    let idx = self.columns.len();
                    self.index.insert(h.clone(), idx);
                    self.columns.push(h);
                    idx
                }
            })
            .collect()
    }

    fn push_row(&mut self, mapping: &[usize], fields: Vec<String>) {
        let mut row = vec![String::new(); self.columns.len()];
        for (field, &idx) in fields.into_iter().zip(mapping) {
            row[idx] = field;
        }
        self.rows.push(row);
    }
}

/// Parse a numeric cell. Integers and decimals are accepted.
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Pick tab when the header line contains one, comma otherwise.
pub fn sniff_delimiter(path: &Path) -> std::io::Result<u8> {
    let file = File::open(path)?;
    let mut first_line = String::new();
    BufReader::new(file).read_line(&mut first_line)?;
    Ok(if first_line.contains('\t') { b'\t' } else { b',' })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_schema_union_across_files() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.csv", "subtype,total_count\nA,10\n");
        let b = write(&dir, "b.csv", "class,total_count\nx,4\n");

        let (table, summary) = Table::load_files(&[a, b], LoadMode::Strict);
        assert_eq!(summary.files_loaded, 2);
        assert!(summary.failures.is_empty());
        assert_eq!(table.columns(), &["subtype", "total_count", "class"]);
        assert_eq!(table.len(), 2);

        let subtypes: Vec<_> = table.column_values("subtype").unwrap().collect();
        assert_eq!(subtypes, vec![Some("A"), None]);
        assert_eq!(table.sum_column("total_count"), Some(14.0));
    }

    #[test]
    fn test_strict_mode_excludes_malformed_file() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.csv", "subtype,total_count\nA,10\n");
        let bad = write(&dir, "bad.csv", "subtype,total_count\nB,1\nC,2,extra\n");

        let (table, summary) = Table::load_files(&[good, bad], LoadMode::Strict);
        assert_eq!(summary.files_loaded, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_short_rows_are_kept() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "short.csv", "subtype,class,total_count\nA,x,10\nB,y\n");

        let (table, summary) = Table::load_files(&[path], LoadMode::Strict);
        assert_eq!(summary.files_loaded, 1);
        assert!(summary.failures.is_empty());
        assert_eq!(table.len(), 2);

        let classes: Vec<_> = table.column_values("class").unwrap().collect();
        assert_eq!(classes, vec![Some("x"), Some("y")]);
        let counts: Vec<_> = table.column_values("total_count").unwrap().collect();
        assert_eq!(counts, vec![Some("10"), None]);
        assert_eq!(table.sum_column("total_count"), Some(10.0));
    }

    #[test]
    fn test_strict_mode_reports_long_row() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.csv", "subtype,total_count\nB,1\nC,2,extra\n");

        let mut table = Table::new();
        let err = table.append_file(&bad, LoadMode::Strict).unwrap_err();
        assert!(matches!(
            err,
            LoadError::TooManyFields { line: 3, expected: 2, found: 3, .. }
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_lenient_mode_skips_bad_rows() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.csv", "subtype,total_count\nB,1\nC,2,extra\nD,3\n");

        let (table, summary) = Table::load_files(&[bad], LoadMode::Lenient);
        assert_eq!(summary.files_loaded, 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.sum_column("total_count"), Some(4.0));
    }

    #[test]
    fn test_missing_and_empty_files_fail() {
        let dir = TempDir::new().unwrap();
        let empty = write(&dir, "empty.csv", "");
        let missing = dir.path().join("missing.csv");

        let (table, summary) = Table::load_files(&[empty, missing], LoadMode::Lenient);
        assert_eq!(summary.files_loaded, 0);
        assert_eq!(summary.failures.len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_tab_delimited_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "stats.csv", "theme\ttype\tadded\nbase\twater\t12\n");

        let (table, _) = Table::load_files(&[path], LoadMode::Strict);
        assert_eq!(table.columns(), &["theme", "type", "added"]);
        assert_eq!(table.sum_column("added"), Some(12.0));
    }

    #[test]
    fn test_numeric_column_detection() {
        let table = Table::from_rows(
            &["class", "confidence", "blank"],
            &[&["a", "0.5", ""], &["b", "1", ""]],
        );
        assert!(!table.is_numeric_column("class"));
        assert!(table.is_numeric_column("confidence"));
        assert!(!table.is_numeric_column("blank"));
        assert!(!table.is_numeric_column("absent"));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("1.5e3"), Some(1500.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("US"), None);
        assert_eq!(parse_number("NaN"), None);
    }
}
