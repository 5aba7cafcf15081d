//! Code-to-title resolution over a reference table.

use crate::normalize::strip_accents;
use crate::table::{ColumnRef, ReferenceTable};
use crate::types::Code;
use crate::wizard::Slot;
use serde::{Deserialize, Serialize};

/// Why a lookup produced no title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Miss {
    /// No code was entered.
    EmptyCode,
    /// A code was entered but no row carries it.
    Absent,
}

/// Outcome of resolving a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookup {
    /// Title of the first matching row, accents stripped.
    Found(String),
    /// No title for this code.
    NotFound(Miss),
}

impl Lookup {
    /// The resolved title, if any.
    pub fn title(&self) -> Option<&str> {
        match self {
            Lookup::Found(title) => Some(title),
            Lookup::NotFound(_) => None,
        }
    }
}

/// A reference table with its key and title columns fixed.
#[derive(Debug, Clone)]
pub struct LookupIndex {
    table: ReferenceTable,
    key: ColumnRef,
    title: ColumnRef,
}

impl LookupIndex {
    /// Detect the key and title columns and canonicalize the keys.
    pub fn new(mut table: ReferenceTable) -> Self {
        let key = table.detect_key_column();
        let title = table.detect_title_column(Some(key));
        table.canonicalize_column(key);

        log::debug!(
            "{}: key column '{}', title column '{}' ({} rows)",
            table.source().display(),
            table.column_name(key),
            table.column_name(title),
            table.len()
        );

        Self { table, key, title }
    }

    /// Underlying table.
    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    /// Name of the detected key column.
    pub fn key_column(&self) -> &str {
        self.table.column_name(self.key)
    }

    /// Name of the detected title column.
    pub fn title_column(&self) -> &str {
        self.table.column_name(self.title)
    }

    /// Resolve a code to a title.
    ///
    /// Matching is exact on the trimmed string; the first matching row wins.
    /// An empty code never matches, not even a row whose key is empty.
    pub fn resolve(&self, code: &str) -> Lookup {
        self.resolve_code(&Code::new(code))
    }

    /// Resolve an already canonical code.
    pub fn resolve_code(&self, code: &Code) -> Lookup {
        if code.is_empty() {
            return Lookup::NotFound(Miss::EmptyCode);
        }

        self.table
            .rows()
            .iter()
            .find(|row| row[self.key.index()].to_code() == *code)
            .map(|row| Lookup::Found(strip_accents(&row[self.title.index()].to_string())))
            .unwrap_or(Lookup::NotFound(Miss::Absent))
    }
}

/// Both reference tables, loaded once and shared read-only by every session.
#[derive(Debug, Clone)]
pub struct Catalog {
    hymns: LookupIndex,
    choruses: LookupIndex,
}

impl Catalog {
    /// Create a catalog from the hymn and chorus indexes.
    pub fn new(hymns: LookupIndex, choruses: LookupIndex) -> Self {
        Self { hymns, choruses }
    }

    /// Hymn index.
    pub fn hymns(&self) -> &LookupIndex {
        &self.hymns
    }

    /// Chorus index.
    pub fn choruses(&self) -> &LookupIndex {
        &self.choruses
    }

    /// Index a slot resolves against: hymns for hymn slots, choruses for the rest.
    pub fn index_for(&self, slot: Slot) -> &LookupIndex {
        match slot {
            Slot::Hymn(_) => self.hymns(),
            Slot::Chorus(_) | Slot::TitheChorus | Slot::FinalChorus => self.choruses(),
        }
    }

    /// Resolve a code for the given slot.
    pub fn resolve(&self, slot: Slot, code: &Code) -> Lookup {
        self.index_for(slot).resolve_code(code)
    }
}
