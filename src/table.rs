//! Whitespace-delimited numeric tables with a single header row.

use crate::error::{DataError, DataResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Rows of numbers read from a text dump.
///
/// The first line is always treated as a header and skipped. Blank lines and
/// lines starting with `#` are ignored. Every data row must have the same
/// number of columns as the first one.
#[derive(Debug, Clone)]
pub struct NumericTable {
    path: PathBuf,
    columns: usize,
    rows: Vec<Vec<f64>>,
    line_numbers: Vec<usize>,
}

impl NumericTable {
    /// Parse table text. `path` is only used in error messages.
    pub fn parse(path: &Path, text: &str) -> DataResult<Self> {
        let mut columns = 0;
        let mut rows = Vec::new();
        let mut line_numbers = Vec::new();

        for (idx, line) in text.lines().enumerate().skip(1) {
            let line_num = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let row = trimmed
                .split_whitespace()
                .map(|token| {
                    token.parse::<f64>().map_err(|_| DataError::Parse {
                        path: path.to_path_buf(),
                        line: line_num,
                        token: token.to_string(),
                    })
                })
                .collect::<DataResult<Vec<f64>>>()?;

            if rows.is_empty() {
                columns = row.len();
            } else if row.len() != columns {
                return Err(DataError::Ragged {
                    path: path.to_path_buf(),
                    line: line_num,
                    expected: columns,
                    found: row.len(),
                });
            }
            rows.push(row);
            line_numbers.push(line_num);
        }

        Ok(Self {
            path: path.to_path_buf(),
            columns,
            rows,
            line_numbers,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows (header excluded)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 1-based line in the source text of data row `idx`
    pub fn line_of(&self, idx: usize) -> Option<usize> {
        self.line_numbers.get(idx).copied()
    }

    fn require_columns(&self, required: usize) -> DataResult<()> {
        if self.is_empty() || self.columns >= required {
            Ok(())
        } else {
            Err(DataError::MissingColumn {
                path: self.path.clone(),
                required,
                found: self.columns,
            })
        }
    }

    /// Copy out one column
    pub fn column(&self, idx: usize) -> DataResult<Vec<f64>> {
        self.require_columns(idx + 1)?;
        Ok(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Zip two columns into `(x, y)` points, preserving row order
    pub fn pairs(&self, x: usize, y: usize) -> DataResult<Vec<(f64, f64)>> {
        self.require_columns(x.max(y) + 1)?;
        Ok(self.rows.iter().map(|row| (row[x], row[y])).collect())
    }
}

/// Load a table from disk, returning `Ok(None)` when the file does not exist.
pub fn load_table<P: AsRef<Path>>(path: P) -> DataResult<Option<NumericTable>> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => NumericTable::parse(path, &text).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(DataError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
