//! Domain types shared by lookup, wizard and document assembly.

use crate::lookup::{Lookup, Miss};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label shown next to a slot whose code did not resolve to a title.
pub const NOT_FOUND_LABEL: &str = "— número no encontrado —";

/// Canonical hymn/chorus code: a trimmed string.
///
/// Codes are compared as strings everywhere. Table keys are converted to this
/// form once at load time, user input on every `set_code`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    /// Create a code from raw input, trimming surrounding whitespace.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no code was entered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Code {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// One user-entry position: the code typed and what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    /// Code as entered (trimmed). Empty when the user left the slot blank.
    pub code: Code,

    /// Title lookup outcome for `code`.
    pub lookup: Lookup,
}

impl SlotEntry {
    /// A blank slot.
    pub fn empty() -> Self {
        Self {
            code: Code::default(),
            lookup: Lookup::NotFound(Miss::EmptyCode),
        }
    }

    /// Create an entry from a code and its lookup result.
    pub fn new(code: Code, lookup: Lookup) -> Self {
        Self { code, lookup }
    }

    /// Resolved title, if any.
    pub fn title(&self) -> Option<&str> {
        self.lookup.title()
    }

    /// Text shown beside the slot input: the title, or a placeholder when
    /// there is no title or it is blank.
    pub fn label(&self) -> &str {
        self.title()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(NOT_FOUND_LABEL)
    }

    /// Whether the entry makes it into the exported sheet.
    ///
    /// Both the code and the resolved title must be non-empty.
    pub fn is_renderable(&self) -> bool {
        !self.code.is_empty() && self.title().is_some_and(|t| !t.trim().is_empty())
    }

    /// Printed form of the entry: code, two spaces, title.
    pub fn line(&self) -> String {
        format!("{}  {}", self.code, self.title().unwrap_or_default())
    }
}

impl Default for SlotEntry {
    fn default() -> Self {
        Self::empty()
    }
}
