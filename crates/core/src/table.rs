//! Reference tables and key/title column detection.
//!
//! A reference table is the content of one spreadsheet (hymns or choruses):
//! a header row plus data rows of loosely typed cells. Column names are
//! normalized on construction so detection can compare against plain
//! lowercase synonyms.

use crate::normalize::normalize_header;
use crate::types::Code;
use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Header synonyms for the numeric key column, in priority order.
pub const KEY_COLUMN_SYNONYMS: &[&str] = &["numero", "n", "no", "num", "id", "codigo"];

/// Header synonyms for the title column, in priority order.
pub const TITLE_COLUMN_SYNONYMS: &[&str] = &["titulo", "nombre", "title", "cancion", "himno", "coro"];

/// Share of rows that must parse as numbers for a column to pass as the key.
const NUMERIC_COLUMN_RATIO: f64 = 0.3;

/// A single spreadsheet value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Whether the value reads as a number (numeric cells or numeric text).
    pub fn is_numeric(&self) -> bool {
        match self {
            Cell::Int(_) => true,
            Cell::Float(f) => f.is_finite(),
            Cell::Text(s) => parse_number(s).is_some(),
            Cell::Empty | Cell::Bool(_) => false,
        }
    }

    /// Whether the value is non-numeric, non-blank text.
    pub fn is_free_text(&self) -> bool {
        matches!(self, Cell::Text(s) if !s.trim().is_empty() && parse_number(s).is_none())
    }

    /// Canonical code form of the value.
    ///
    /// Integral floats lose their fractional part so that a key stored as
    /// `101.0` matches the user typing `101`.
    pub fn to_code(&self) -> Code {
        Code::new(&self.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Typed reference to a column of a [`ReferenceTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef(usize);

impl ColumnRef {
    /// Zero-based column position.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Header row plus data rows of one spreadsheet.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    source: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ReferenceTable {
    /// Build a table from raw headers and rows.
    ///
    /// Headers are normalized; blank headers become `unnamed: <index>`. Rows
    /// are padded or truncated to the header width. Fails with `LoadError`
    /// when there are no columns and `EmptyTable` when there are no rows.
    pub fn new(
        source: impl Into<PathBuf>,
        headers: Vec<String>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self> {
        let source = source.into();

        if headers.is_empty() {
            return Err(Error::LoadError {
                path: source,
                message: "no columns".to_string(),
            });
        }
        if rows.is_empty() {
            return Err(Error::EmptyTable(source));
        }

        let headers: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                let name = normalize_header(raw);
                if name.is_empty() {
                    format!("unnamed: {}", idx)
                } else {
                    name
                }
            })
            .collect();

        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Ok(Self {
            source,
            headers,
            rows,
        })
    }

    /// File the table was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Normalized column names in order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows. Never true for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a column by normalized name. First match wins.
    pub fn column(&self, name: &str) -> Option<ColumnRef> {
        self.headers.iter().position(|h| h == name).map(ColumnRef)
    }

    /// Name of a column.
    pub fn column_name(&self, column: ColumnRef) -> &str {
        &self.headers[column.0]
    }

    /// Values of one column, top to bottom.
    pub fn values(&self, column: ColumnRef) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |row| &row[column.0])
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    fn first_column(&self) -> ColumnRef {
        ColumnRef(0)
    }

    /// Find the column holding the numeric hymn/chorus code.
    ///
    /// Synonyms first, then the first mostly-numeric column, then the first
    /// column.
    pub fn detect_key_column(&self) -> ColumnRef {
        if let Some(column) = KEY_COLUMN_SYNONYMS.iter().find_map(|name| self.column(name)) {
            return column;
        }

        let threshold = ((NUMERIC_COLUMN_RATIO * self.len() as f64) as usize).max(1);
        (0..self.headers.len())
            .map(ColumnRef)
            .find(|&column| self.values(column).filter(|c| c.is_numeric()).count() >= threshold)
            .unwrap_or_else(|| self.first_column())
    }

    /// Find the column holding the display title, never choosing `avoid`
    /// except as the last resort (first column).
    pub fn detect_title_column(&self, avoid: Option<ColumnRef>) -> ColumnRef {
        let allowed = |column: &ColumnRef| Some(*column) != avoid;

        if let Some(column) = TITLE_COLUMN_SYNONYMS
            .iter()
            .filter_map(|name| self.column(name))
            .find(allowed)
        {
            return column;
        }

        (0..self.headers.len())
            .map(ColumnRef)
            .filter(allowed)
            .find(|&column| self.values(column).any(Cell::is_free_text))
            .unwrap_or_else(|| self.first_column())
    }

    /// Rewrite every value of `column` into canonical code form, in place.
    pub fn canonicalize_column(&mut self, column: ColumnRef) {
        for row in &mut self.rows {
            let code = row[column.0].to_code();
            row[column.0] = Cell::Text(code.as_str().to_string());
        }
    }
}
