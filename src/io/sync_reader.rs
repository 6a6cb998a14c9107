//! Row-by-row transaction reader for the sync pipeline
//!
//! `SyncReader` wraps a `csv::Reader` over the transactions file and yields
//! one `Result<Transaction, String>` per data row, so a bad row never hides
//! the rows after it. Row conversion lives in `csv_format`.
//!
//! ```no_run
//! use categorization_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), String> {
//! let valid = SyncReader::new(Path::new("transactions.csv"))?
//!     .filter_map(Result::ok)
//!     .count();
//! # let _ = valid;
//! # Ok(())
//! # }
//! ```
//!
//! Opening the file is the only fatal error. Row errors carry the CSV line
//! number, counting the header as line 1.

use crate::io::csv_format::{convert_csv_transaction, CsvTransaction};
use crate::types::Transaction;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Streaming iterator over the rows of a transactions CSV
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open a transactions file
    ///
    /// Fields are trimmed and rows may omit the trailing category column.
    ///
    /// # Errors
    ///
    /// Returns a message naming the path when the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Transaction, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvTransaction>();

        let row = deserializer.next()?;
        self.line_num += 1;
        // Header is line 1
        let line = self.line_num + 1;

        Some(match row {
            Ok(csv_row) => {
                convert_csv_transaction(csv_row).map_err(|e| format!("Line {}: {}", line, e))
            }
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}
