//! The assembled service sheet and its printable sections.

use crate::types::SlotEntry;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Title printed at the top of every sheet.
pub const DOCUMENT_TITLE: &str = "GUIADOR IDMJI";

/// Snapshot of a session, built for one export and then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDocument {
    pub hymns: Vec<SlotEntry>,
    pub choruses: Vec<SlotEntry>,
    pub tithe_chorus: SlotEntry,
    pub final_chorus: SlotEntry,
    pub preacher: String,
    pub notes: String,
    pub generated_at: NaiveDateTime,
}

/// Which part of the sheet a section is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    Hymns,
    Choruses,
    TitheChorus,
    FinalChorus,
    Preacher,
    Notes,
}

impl SectionKind {
    /// Heading printed above the section.
    pub fn heading(self) -> &'static str {
        match self {
            SectionKind::Hymns => "HIMNOS:",
            SectionKind::Choruses => "COROS:",
            SectionKind::TitheChorus => "CORO DIEZMO:",
            SectionKind::FinalChorus => "CORO FINAL:",
            SectionKind::Preacher => "PREDICADOR:",
            SectionKind::Notes => "NOTA:",
        }
    }
}

/// A printable section: heading plus its text lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub lines: Vec<String>,
}

impl Section {
    fn new(kind: SectionKind, lines: Vec<String>) -> Self {
        Self { kind, lines }
    }

    /// Heading printed above the section.
    pub fn heading(&self) -> &'static str {
        self.kind.heading()
    }
}

fn renderable_lines(entries: &[SlotEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|e| e.is_renderable())
        .map(SlotEntry::line)
        .collect()
}

impl ServiceDocument {
    /// Date line under the title.
    pub fn date_line(&self) -> String {
        format!("Fecha: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"))
    }

    /// Download name for the exported sheet, e.g. `GUIADOR_20240301_093000.pdf`.
    pub fn file_name(&self, extension: &str) -> String {
        format!(
            "GUIADOR_{}.{}",
            self.generated_at.format("%Y%m%d_%H%M%S"),
            extension
        )
    }

    /// Sections in print order.
    ///
    /// Slots without both a code and a resolved title are dropped, and a
    /// hymn, chorus, tithe or final section with nothing left is omitted.
    /// Preacher and notes are always present, even when blank.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();

        let groups = [
            (SectionKind::Hymns, renderable_lines(&self.hymns)),
            (SectionKind::Choruses, renderable_lines(&self.choruses)),
            (
                SectionKind::TitheChorus,
                renderable_lines(std::slice::from_ref(&self.tithe_chorus)),
            ),
            (
                SectionKind::FinalChorus,
                renderable_lines(std::slice::from_ref(&self.final_chorus)),
            ),
        ];
        for (kind, lines) in groups {
            if !lines.is_empty() {
                sections.push(Section::new(kind, lines));
            }
        }

        sections.push(Section::new(SectionKind::Preacher, vec![self.preacher.clone()]));
        sections.push(Section::new(SectionKind::Notes, vec![self.notes.clone()]));
        sections
    }

    /// Section of a given kind, if emitted.
    pub fn section(&self, kind: SectionKind) -> Option<Section> {
        self.sections().into_iter().find(|s| s.kind == kind)
    }
}
