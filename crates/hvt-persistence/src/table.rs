//! CSV-backed daily table.
//!
//! - Missing file: starts empty, the first `persist` writes the header
//! - Existing file: header must match the schema exactly (no migration)
//! - `upsert` removes any row for the same date, then appends

use crate::error::{PersistenceError, PersistenceResult};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Writer};
use hvt_core::{DailyRow, COMPARATOR_COUNT};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Column names of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<String>,
}

impl TableSchema {
    /// Build the header from the target label and the comparator labels.
    ///
    /// `("HYPE", ["Binance", "Coinbase", "Upbit"])` gives
    /// `Date,HYPE_Volume_B,HYPE_Price,Binance_Volume_B,Coinbase_Volume_B,Upbit_Volume_B`.
    pub fn new<S: AsRef<str>>(target_label: &str, comparator_labels: &[S; COMPARATOR_COUNT]) -> Self {
        let mut columns = Vec::with_capacity(DailyRow::WIDTH);
        columns.push("Date".to_string());
        columns.push(format!("{target_label}_Volume_B"));
        columns.push(format!("{target_label}_Price"));
        columns.extend(
            comparator_labels
                .iter()
                .map(|label| format!("{}_Volume_B", label.as_ref())),
        );
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn matches(&self, header: &StringRecord) -> bool {
        header.len() == self.columns.len()
            && header
                .iter()
                .zip(&self.columns)
                .all(|(found, expected)| found.trim() == expected)
    }
}

impl Default for TableSchema {
    fn default() -> Self {
        Self::new("HYPE", &["Binance", "Coinbase", "Upbit"])
    }
}

/// Result of merging a row into the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No row existed for the date.
    Inserted,
    /// An existing row for the date was removed and the new row appended.
    Replaced,
    /// The date was already present and left unchanged.
    Skipped,
}

impl std::fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inserted => write!(f, "inserted"),
            Self::Replaced => write!(f, "replaced"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Ordered daily rows backed by a CSV file.
#[derive(Debug)]
pub struct DailyTable {
    path: PathBuf,
    schema: TableSchema,
    rows: Vec<DailyRow>,
}

impl DailyTable {
    /// Load the table at `path`, or start empty if the file does not exist.
    pub fn load(path: impl AsRef<Path>, schema: TableSchema) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();

        let is_empty_file = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Table file not found, starting empty");
                return Ok(Self {
                    path,
                    schema,
                    rows: Vec::new(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if is_empty_file {
            info!(path = %path.display(), "Table file is empty, starting empty");
            return Ok(Self {
                path,
                schema,
                rows: Vec::new(),
            });
        }

        let mut reader = ReaderBuilder::new().has_headers(true).from_path(&path)?;

        let header = reader.headers()?.clone();
        if !schema.matches(&header) {
            return Err(PersistenceError::HeaderMismatch {
                expected: schema.columns.join(","),
                found: header.iter().collect::<Vec<_>>().join(","),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let fields: Vec<&str> = record.iter().collect();
            let row = DailyRow::from_fields(&fields)
                .map_err(|source| PersistenceError::InvalidRow { line, source })?;
            rows.push(row);
        }

        info!(path = %path.display(), rows = rows.len(), "Loaded table");

        Ok(Self { path, schema, rows })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[DailyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.rows.iter().any(|r| r.date == date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyRow> {
        self.rows.iter().find(|r| r.date == date)
    }

    /// Remove every row for `row.date`, then append `row`.
    pub fn upsert(&mut self, row: DailyRow) -> MergeOutcome {
        let before = self.rows.len();
        self.rows.retain(|r| r.date != row.date);
        let removed = before - self.rows.len();

        debug!(date = %row.date, removed, "Merging row");
        self.rows.push(row);

        if removed > 0 {
            MergeOutcome::Replaced
        } else {
            MergeOutcome::Inserted
        }
    }

    /// Append `row` only if its date is not present yet.
    pub fn insert_if_absent(&mut self, row: DailyRow) -> MergeOutcome {
        if self.contains(row.date) {
            debug!(date = %row.date, "Row already present, leaving table unchanged");
            return MergeOutcome::Skipped;
        }
        self.rows.push(row);
        MergeOutcome::Inserted
    }

    /// Rewrite the whole file: header followed by every row.
    ///
    /// Rows are written to a temporary file in the same directory, which then
    /// replaces the table. A failed write leaves the previous file intact.
    pub fn persist(&self) -> PersistenceResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut staged = NamedTempFile::new_in(dir)?;
        {
            let mut writer = Writer::from_writer(staged.as_file_mut());
            writer.write_record(&self.schema.columns)?;
            for row in &self.rows {
                writer.write_record(row.to_fields())?;
            }
            writer.flush()?;
        }
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;

        info!(path = %self.path.display(), rows = self.rows.len(), "Persisted table");
        Ok(())
    }
}
