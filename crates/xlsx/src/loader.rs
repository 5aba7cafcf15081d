//! Reference table loader implementation.

use calamine::{open_workbook_auto, Data, Range, Reader};
use guiador_core::{Cell, Error, LookupIndex, ReferenceTable, Result};
use std::path::Path;

/// Loader for hymn and chorus spreadsheets.
pub struct TableLoader;

impl TableLoader {
    /// Create a new loader.
    pub fn new() -> Self {
        Self
    }

    /// Load the first sheet of a workbook as a reference table.
    ///
    /// The first row is the header row. Fails with `FileNotFound` when the
    /// path does not exist, `LoadError` when the file is not a readable
    /// workbook and `EmptyTable` when no data rows remain.
    pub fn load(&self, path: &Path) -> Result<ReferenceTable> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let load_error = |message: String| Error::LoadError {
            path: path.to_path_buf(),
            message,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| load_error(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| load_error("workbook has no sheets".to_string()))?
            .map_err(|e| load_error(e.to_string()))?;

        self.from_range(path, &range)
    }

    /// Load a table and fix its key and title columns.
    pub fn load_index(&self, path: &Path) -> Result<LookupIndex> {
        let table = self.load(path)?;
        log::debug!("loaded {} rows from {}", table.len(), path.display());
        Ok(LookupIndex::new(table))
    }

    /// Build a table from an already-read sheet range.
    pub fn from_range(&self, source: &Path, range: &Range<Data>) -> Result<ReferenceTable> {
        let mut rows = range.rows();

        let Some(header_row) = rows.next() else {
            return Err(Error::EmptyTable(source.to_path_buf()));
        };
        let headers: Vec<String> = header_row.iter().map(|c| c.to_string()).collect();

        let rows: Vec<Vec<Cell>> = rows
            .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
            .map(|row| row.iter().map(to_cell).collect())
            .collect();

        ReferenceTable::new(source, headers, rows)
    }
}

impl Default for TableLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a calamine value into a table cell.
fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}
