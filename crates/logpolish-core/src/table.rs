//! Read/write the log-entry CSV produced by the collector.
//!
//! The table is kept as raw strings so that every column the tool does not
//! understand passes through unchanged. Only `NewMessage` is ever rewritten.

use std::io::{Read, Write};
use std::path::Path;

/// Column names used by the collector's CSV export.
pub mod columns {
    pub const ID: &str = "ID";
    pub const MESSAGE_TEMPLATE: &str = "MessageTemplate";
    pub const NEW_MESSAGE: &str = "NewMessage";
    pub const ORIGINAL_CALL: &str = "OriginalCall";
    pub const ARGUMENT_DETAILS: &str = "ArgumentDetails";
    pub const LOG_LEVEL: &str = "LogLevel";

    /// Columns that must be present before any row is processed.
    pub const REQUIRED: [&str; 3] = [ID, MESSAGE_TEMPLATE, NEW_MESSAGE];
}

/// Errors from loading, validating, or writing a log table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("CSV missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row} has {found} fields, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnIndex {
    id: usize,
    message_template: usize,
    new_message: usize,
    original_call: Option<usize>,
    argument_details: Option<usize>,
    log_level: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self, TableError> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let (Some(id), Some(message_template), Some(new_message)) = (
            find(columns::ID),
            find(columns::MESSAGE_TEMPLATE),
            find(columns::NEW_MESSAGE),
        ) else {
            let missing = columns::REQUIRED
                .into_iter()
                .filter(|&name| find(name).is_none())
                .map(String::from)
                .collect();
            return Err(TableError::MissingColumns(missing));
        };

        Ok(Self {
            id,
            message_template,
            new_message,
            original_call: find(columns::ORIGINAL_CALL),
            argument_details: find(columns::ARGUMENT_DETAILS),
            log_level: find(columns::LOG_LEVEL),
        })
    }
}

/// A validated log table: header plus rows, all as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    index: ColumnIndex,
}

/// Borrowed view of a single row.
///
/// Absent values (missing column or empty cell) read as `""`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    /// Zero-based position in the table.
    pub position: usize,
    pub id: &'a str,
    pub message_template: &'a str,
    pub new_message: &'a str,
    pub original_call: &'a str,
    pub argument_details: &'a str,
    pub log_level: &'a str,
}

impl LogTable {
    /// Build a table from a header and rows, validating the required columns.
    ///
    /// Rows shorter than the header are padded with empty cells; longer rows
    /// are rejected.
    pub fn from_parts(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        let index = ColumnIndex::resolve(&headers)?;
        let width = headers.len();

        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                if row.len() > width {
                    return Err(TableError::RaggedRow {
                        row: i + 1,
                        expected: width,
                        found: row.len(),
                    });
                }
                row.resize(width, String::new());
                Ok(row)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            headers,
            rows,
            index,
        })
    }

    /// Parse CSV from a reader. The first record is the header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            rows.push(record?.iter().map(String::from).collect());
        }

        Self::from_parts(headers, rows)
    }

    /// Load and validate a table from a CSV file.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Write the table as CSV.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), TableError> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw cell access by row position and column name.
    pub fn cell(&self, position: usize, column: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == column)?;
        self.rows.get(position).map(|row| row[col].as_str())
    }

    /// Get the record at a given position.
    pub fn record(&self, position: usize) -> Option<LogRecord<'_>> {
        let row = self.rows.get(position)?;
        let optional = |col: Option<usize>| col.map_or("", |c| row[c].as_str());

        Some(LogRecord {
            position,
            id: &row[self.index.id],
            message_template: &row[self.index.message_template],
            new_message: &row[self.index.new_message],
            original_call: optional(self.index.original_call),
            argument_details: optional(self.index.argument_details),
            log_level: optional(self.index.log_level),
        })
    }

    /// Iterate over all records in order.
    pub fn records(&self) -> impl Iterator<Item = LogRecord<'_>> {
        (0..self.rows.len()).filter_map(|i| self.record(i))
    }

    /// Produce a new table with `NewMessage` replaced wherever `updates` yields
    /// `Some`. Rows past the end of `updates` are copied unchanged.
    #[must_use]
    pub fn with_new_messages<I, S>(&self, updates: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut output = self.clone();
        for (row, update) in output.rows.iter_mut().zip(updates) {
            if let Some(text) = update {
                row[self.index.new_message] = text.into();
            }
        }
        output
    }
}
