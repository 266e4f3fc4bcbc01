//! Append-only table writer.
//!
//! Every call appends whole rows to the end of the file. The header is
//! written only when the file is missing or empty, so a table grows across
//! runs without ever being rewritten.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::format::{FormatError, TableFormat};
use crate::schema::TableSchema;

/// Errors from table writes and reads.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("row for {table} has {got} fields, expected {expected}")]
    Arity {
        table: String,
        expected: usize,
        got: usize,
    },

    #[error("{path} has header {found:?}, expected {expected:?}")]
    HeaderMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{path} is not a valid table: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

impl From<TableError> for sd_common::Error {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Write { path, source } => sd_common::Error::WriteFailure {
                table: path.display().to_string(),
                source,
            },
            TableError::Arity { ref table, .. } => sd_common::Error::WriteFailure {
                table: table.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()),
            },
            TableError::Read { ref path, .. }
            | TableError::HeaderMismatch { ref path, .. }
            | TableError::Format { ref path, .. } => sd_common::Error::TableRead {
                table: path.display().to_string(),
                detail: err.to_string(),
            },
        }
    }
}

/// A table file that only ever grows.
#[derive(Debug, Clone)]
pub struct AppendTable {
    path: PathBuf,
    schema: TableSchema,
    format: TableFormat,
}

impl AppendTable {
    pub fn new(path: impl Into<PathBuf>, schema: TableSchema, format: TableFormat) -> Self {
        Self {
            path: path.into(),
            schema,
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    /// Whether the next append has to emit the header.
    pub fn needs_header(&self) -> Result<bool, TableError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(source) => Err(TableError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Current size of the file in bytes, 0 if it does not exist yet.
    ///
    /// Taken before an append, this is the point [`AppendTable::truncate_to`]
    /// can return to.
    pub fn byte_len(&self) -> Result<u64, TableError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(source) => Err(TableError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Drop everything after the first `len` bytes.
    ///
    /// Only meant for undoing an append whose batch failed: `len` must come
    /// from [`AppendTable::byte_len`] taken just before that append. A missing
    /// file is left missing.
    pub fn truncate_to(&self, len: u64) -> Result<(), TableError> {
        let file = match OpenOptions::new().write(true).open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(TableError::Write {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if file.metadata().map(|meta| meta.len() <= len).unwrap_or(false) {
            return Ok(());
        }
        file.set_len(len)
            .and_then(|()| file.sync_all())
            .map_err(|source| TableError::Write {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            table = %self.schema.name,
            path = %self.path.display(),
            len,
            "truncated table"
        );
        Ok(())
    }

    /// Append `rows`, creating the file (and its header) on first use.
    ///
    /// All rows are checked against the schema width before anything is
    /// written. Returns the number of data rows appended.
    pub fn append<R, S>(&self, rows: &[R]) -> Result<usize, TableError>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let width = self.schema.width();
        for row in rows {
            let got = row.as_ref().len();
            if got != width {
                return Err(TableError::Arity {
                    table: self.schema.name.to_string(),
                    expected: width,
                    got,
                });
            }
        }

        let write_err = |source: std::io::Error| TableError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let needs_header = self.needs_header()?;
        let mut encoded = String::new();
        if needs_header {
            encoded.push_str(&self.format.encode_row(self.schema.columns));
        }
        for row in rows {
            encoded.push_str(&self.format.encode_row(row.as_ref()));
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        let mut out = BufWriter::new(file);
        out.write_all(encoded.as_bytes()).map_err(write_err)?;
        out.flush().map_err(write_err)?;

        debug!(
            table = %self.schema.name,
            path = %self.path.display(),
            rows = rows.len(),
            header = needs_header,
            "appended rows"
        );
        Ok(rows.len())
    }
}
