//! Tabular note representation
//!
//! One `Row` per grid step. Columns are emitted in a fixed order
//! (`timestamp, bpm, time_signature, measure, beat, notes`); every column
//! except `notes` can be switched off at extraction time.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("table has no notes column")]
    MissingNotes,
}

pub type Result<T> = std::result::Result<T, TableError>;

/// Output columns, in emission order
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Timestamp,
    Bpm,
    TimeSignature,
    Measure,
    Beat,
    Notes,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Timestamp,
        Column::Bpm,
        Column::TimeSignature,
        Column::Measure,
        Column::Beat,
        Column::Notes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Timestamp => "timestamp",
            Column::Bpm => "bpm",
            Column::TimeSignature => "time_signature",
            Column::Measure => "measure",
            Column::Beat => "beat",
            Column::Notes => "notes",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.iter().copied().find(|c| c.name() == name.trim())
    }
}

/// One grid step
///
/// Fields are declared in column order so serialized records come out in
/// that order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Row {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat: Option<f64>,
    pub notes: String,
}

impl Row {
    pub fn notes(notes: impl Into<String>) -> Self {
        Row {
            notes: notes.into(),
            ..Row::default()
        }
    }

    /// Columns this row carries a value for
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = Vec::new();
        if self.timestamp.is_some() {
            columns.push(Column::Timestamp);
        }
        if self.bpm.is_some() {
            columns.push(Column::Bpm);
        }
        if self.time_signature.is_some() {
            columns.push(Column::TimeSignature);
        }
        if self.measure.is_some() {
            columns.push(Column::Measure);
        }
        if self.beat.is_some() {
            columns.push(Column::Beat);
        }
        columns.push(Column::Notes);
        columns
    }
}

/// Ordered rows plus the column set they were produced with
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    /// Empty table with the given columns; `notes` is always included and
    /// the order is normalized.
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut columns: Vec<Column> = columns.into_iter().collect();
        columns.push(Column::Notes);
        columns.sort();
        columns.dedup();
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        let columns = rows.first().map(Row::columns).unwrap_or_else(|| vec![Column::Notes]);
        Table { columns, rows }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        csv_writer.write_record(self.columns.iter().map(|c| c.name()))?;
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut out = Vec::new();
        self.write_csv(&mut out)?;
        String::from_utf8(out).map_err(|e| {
            TableError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    /// Read a table written by [`Table::write_csv`] (or any CSV with a
    /// `notes` header)
    pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns: Vec<Column> = csv_reader
            .headers()?
            .iter()
            .filter_map(Column::from_name)
            .collect();
        if !columns.contains(&Column::Notes) {
            return Err(TableError::MissingNotes);
        }
        let mut table = Table::new(columns);
        for record in csv_reader.deserialize() {
            let row: Row = record?;
            table.push(row);
        }
        Ok(table)
    }

    /// Rows as a JSON array of records
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.rows)?)
    }

    pub fn from_json_str(source: &str) -> Result<Table> {
        let rows: Vec<Row> = serde_json::from_str(source)?;
        Ok(Table::from_rows(rows))
    }
}
