//! Page layout for the service sheet.
//!
//! Produces a backend-neutral list of pages, each a list of drawing
//! operations in millimetres measured from the top-left corner of an A4
//! portrait page. The export backend turns them into PDF content streams.
//!
//! The layout follows a cursor model: cells advance the cursor vertically,
//! wrapped text breaks onto a new page when the next line would cross the
//! automatic break line, and list entries start a new page once the cursor
//! has passed [`ENTRY_BREAK_Y`].

use crate::document::{SectionKind, ServiceDocument, DOCUMENT_TITLE};
use crate::normalize::clean_text;
use regex::Regex;
use std::sync::LazyLock;

/// A4 width.
pub const PAGE_WIDTH: f32 = 210.0;
/// A4 height.
pub const PAGE_HEIGHT: f32 = 297.0;
/// Left margin.
pub const LEFT_MARGIN: f32 = 35.0;
/// Right margin.
pub const RIGHT_MARGIN: f32 = 15.0;
/// Cursor position at the top of a fresh page.
pub const TOP_MARGIN: f32 = 10.0;
/// Distance from the bottom edge at which text breaks onto a new page.
pub const BREAK_MARGIN: f32 = 15.0;
/// Hymn and chorus entries start a new page once the cursor is below this.
pub const ENTRY_BREAK_Y: f32 = 260.0;
/// Inner horizontal padding of a cell.
pub const CELL_PADDING: f32 = 1.0;

/// Logo position and width; height follows the image aspect ratio.
pub const LOGO_X: f32 = 35.0;
pub const LOGO_Y: f32 = 12.0;
pub const LOGO_WIDTH: f32 = 35.0;

/// Notes box size.
pub const NOTES_BOX_WIDTH: f32 = 145.0;
pub const NOTES_BOX_HEIGHT: f32 = 40.0;

const TITLE_SIZE: f32 = 18.0;
const DATE_SIZE: f32 = 10.0;
const LIST_HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 11.0;

const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Whitespace-prefixed words; wrapping keeps the original spacing inside a line.
static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\S+").unwrap());

/// Text width provider, implemented by the export backend from real font metrics.
pub trait TextMeasure {
    /// Width in millimetres of `text` set at `font_size` points.
    fn text_width(&self, text: &str, font_size: f32) -> f32;
}

/// One drawing operation. Coordinates are millimetres from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// A single line of text; `y` is the baseline.
    Text { x: f32, y: f32, size: f32, text: String },
    /// Stroked rectangle; `y` is the top edge.
    Rect { x: f32, y: f32, width: f32, height: f32 },
    /// The logo image; `y` is the top edge.
    Logo { x: f32, y: f32, width: f32 },
}

/// One page of drawing operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text lines on this page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A laid-out document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    /// All text lines across pages, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|page| page.texts())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

/// Lays out a [`ServiceDocument`] onto pages.
pub struct LayoutEngine<'m> {
    measure: &'m dyn TextMeasure,
    with_logo: bool,
}

impl<'m> LayoutEngine<'m> {
    /// Create an engine measuring text with `measure`.
    pub fn new(measure: &'m dyn TextMeasure) -> Self {
        Self {
            measure,
            with_logo: false,
        }
    }

    /// Set whether the header carries the logo.
    pub fn with_logo(mut self, with_logo: bool) -> Self {
        self.with_logo = with_logo;
        self
    }

    /// Lay out the header and every section of the document.
    pub fn layout(&self, document: &ServiceDocument) -> Layout {
        let mut pen = Pen::new(self.measure);
        pen.add_page();

        // Header
        if self.with_logo {
            pen.push(DrawOp::Logo {
                x: LOGO_X,
                y: LOGO_Y,
                width: LOGO_WIDTH,
            });
        }
        pen.set_xy(0.0, 12.0);
        pen.font_size = TITLE_SIZE;
        pen.cell(0.0, 10.0, DOCUMENT_TITLE, Align::Center);
        pen.font_size = DATE_SIZE;
        pen.cell(0.0, 6.0, &document.date_line(), Align::Center);
        pen.ln(4.0);

        for section in document.sections() {
            match section.kind {
                SectionKind::Hymns | SectionKind::Choruses => {
                    if section.kind == SectionKind::Choruses {
                        pen.ln(2.0);
                    }
                    pen.font_size = LIST_HEADING_SIZE;
                    pen.cell(0.0, 8.0, section.heading(), Align::Left);
                    pen.font_size = BODY_SIZE;
                    for line in &section.lines {
                        if pen.y > ENTRY_BREAK_Y {
                            pen.add_page();
                        }
                        pen.multi_cell(0.0, 6.0, line);
                        pen.ln(1.0);
                    }
                }
                SectionKind::TitheChorus | SectionKind::FinalChorus | SectionKind::Preacher => {
                    pen.ln(4.0);
                    pen.font_size = BODY_SIZE;
                    pen.cell(0.0, 6.0, section.heading(), Align::Left);
                    for line in &section.lines {
                        pen.multi_cell(0.0, 6.0, line);
                    }
                }
                SectionKind::Notes => {
                    pen.ln(4.0);
                    pen.font_size = BODY_SIZE;
                    pen.cell(0.0, 6.0, section.heading(), Align::Left);
                    let (x, y) = (pen.x, pen.y);
                    pen.push(DrawOp::Rect {
                        x,
                        y,
                        width: NOTES_BOX_WIDTH,
                        height: NOTES_BOX_HEIGHT,
                    });
                    pen.set_xy(x + 2.0, y + 2.0);
                    let inner_width = NOTES_BOX_WIDTH - 4.0;
                    for line in &section.lines {
                        pen.multi_cell(inner_width, 5.0, line);
                    }
                }
            }
        }

        log::debug!("laid out {} page(s)", pen.pages.len());
        Layout { pages: pen.pages }
    }
}

/// Cursor state while laying out.
struct Pen<'m> {
    measure: &'m dyn TextMeasure,
    pages: Vec<Page>,
    x: f32,
    y: f32,
    font_size: f32,
}

impl<'m> Pen<'m> {
    fn new(measure: &'m dyn TextMeasure) -> Self {
        Self {
            measure,
            pages: Vec::new(),
            x: LEFT_MARGIN,
            y: TOP_MARGIN,
            font_size: BODY_SIZE,
        }
    }

    fn add_page(&mut self) {
        self.pages.push(Page::default());
        self.x = LEFT_MARGIN;
        self.y = TOP_MARGIN;
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn set_xy(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    fn ln(&mut self, height: f32) {
        self.x = LEFT_MARGIN;
        self.y += height;
    }

    fn width_or_remaining(&self, width: f32) -> f32 {
        if width > 0.0 {
            width
        } else {
            PAGE_WIDTH - RIGHT_MARGIN - self.x
        }
    }

    /// Start a new page if a row of `height` would cross the break line,
    /// keeping the current horizontal position.
    fn break_if_needed(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT - BREAK_MARGIN {
            let x = self.x;
            self.add_page();
            self.x = x;
        }
    }

    fn baseline(&self, height: f32) -> f32 {
        self.y + height / 2.0 + 0.3 * self.font_size / POINTS_PER_MM
    }

    fn draw_text(&mut self, x: f32, height: f32, text: &str) {
        if text.is_empty() {
            return;
        }
        let op = DrawOp::Text {
            x,
            y: self.baseline(height),
            size: self.font_size,
            text: text.to_string(),
        };
        self.push(op);
    }

    /// Single-line cell, then move to the start of the next line.
    fn cell(&mut self, width: f32, height: f32, text: &str, align: Align) {
        let width = self.width_or_remaining(width);
        self.break_if_needed(height);

        let text_x = match align {
            Align::Left => self.x + CELL_PADDING,
            Align::Center => self.x + (width - self.measure.text_width(text, self.font_size)) / 2.0,
        };
        self.draw_text(text_x, height, text);
        self.ln(height);
    }

    /// Wrapped text, one row of `height` per line.
    fn multi_cell(&mut self, width: f32, height: f32, text: &str) {
        let width = self.width_or_remaining(width);
        let max_width = width - 2.0 * CELL_PADDING;

        for line in self.wrap(&clean_text(text), max_width) {
            self.break_if_needed(height);
            self.draw_text(self.x + CELL_PADDING, height, &line);
            self.y += height;
        }

        self.x = LEFT_MARGIN;
    }

    /// Split text into lines no wider than `max_width`.
    ///
    /// Explicit newlines always break. Lines break between words; a word
    /// wider than a whole line is split between characters. An empty text
    /// still yields one (empty) line.
    fn wrap(&self, text: &str, max_width: f32) -> Vec<String> {
        let size = self.font_size;
        let fits = |s: &str| self.measure.text_width(s, size) <= max_width;
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let mut current = String::new();

            for token in TOKEN_REGEX.find_iter(paragraph).map(|m| m.as_str()) {
                let candidate = format!("{}{}", current, token);
                if current.is_empty() || !fits(&candidate) {
                    if !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                    let word = token.trim_start();
                    if fits(word) {
                        current.push_str(word);
                        continue;
                    }
                    for c in word.chars() {
                        current.push(c);
                        if !fits(&current) && current.chars().count() > 1 {
                            current.pop();
                            lines.push(std::mem::take(&mut current));
                            current.push(c);
                        }
                    }
                } else {
                    current = candidate;
                }
            }

            lines.push(current);
        }

        lines
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::lookup::tests::sample_catalog;
    use crate::wizard::{Slot, WizardConfig, WizardState};
    use chrono::NaiveDateTime;

    /// Every character is `size * 0.2` mm wide.
    pub(crate) struct FixedWidth;

    impl TextMeasure for FixedWidth {
        fn text_width(&self, text: &str, font_size: f32) -> f32 {
            text.chars().count() as f32 * font_size * 0.2
        }
    }

    fn document(configure: impl FnOnce(&mut WizardState)) -> ServiceDocument {
        let mut state = WizardState::new();
        configure(&mut state);
        state.assemble(NaiveDateTime::default()).unwrap()
    }

    fn texts(layout: &Layout) -> Vec<&str> {
        layout.texts().collect()
    }

    fn max_right_edge(layout: &Layout) -> f32 {
        layout
            .pages
            .iter()
            .flat_map(|p| &p.ops)
            .filter_map(|op| match op {
                DrawOp::Text { x, size, text, .. } => Some(x + FixedWidth.text_width(text, *size)),
                _ => None,
            })
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_header_and_fixed_sections() {
        let doc = document(|s| s.confirm(WizardConfig::new(0, 0)).unwrap());
        let layout = LayoutEngine::new(&FixedWidth).layout(&doc);

        assert_eq!(layout.pages.len(), 1);
        assert_eq!(
            texts(&layout),
            vec![
                "GUIADOR IDMJI",
                "Fecha: 1970-01-01 00:00:00",
                "PREDICADOR:",
                "NOTA:"
            ]
        );
    }

    #[test]
    fn test_title_is_centered() {
        let doc = document(|s| s.confirm(WizardConfig::new(0, 0)).unwrap());
        let layout = LayoutEngine::new(&FixedWidth).layout(&doc);
        let DrawOp::Text { x, size, text, .. } = &layout.pages[0].ops[0] else {
            panic!("expected title text");
        };
        let width = FixedWidth.text_width(text, *size);
        let cell_width = PAGE_WIDTH - RIGHT_MARGIN;
        assert!((x - (cell_width - width) / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_logo_only_when_requested() {
        let doc = document(|s| s.confirm(WizardConfig::new(0, 0)).unwrap());
        let plain = LayoutEngine::new(&FixedWidth).layout(&doc);
        assert!(!plain.pages[0].ops.iter().any(|op| matches!(op, DrawOp::Logo { .. })));

        let with_logo = LayoutEngine::new(&FixedWidth).with_logo(true).layout(&doc);
        assert_eq!(
            with_logo.pages[0].ops[0],
            DrawOp::Logo {
                x: LOGO_X,
                y: LOGO_Y,
                width: LOGO_WIDTH
            }
        );
    }

    #[test]
    fn test_entries_keep_double_space() {
        let catalog = sample_catalog();
        let doc = document(|s| {
            s.confirm(WizardConfig::new(2, 0).with_tithe_chorus(true)).unwrap();
            s.set_code(&catalog, Slot::Hymn(0), "101").unwrap();
            s.set_code(&catalog, Slot::Hymn(1), "").unwrap();
            s.set_code(&catalog, Slot::TitheChorus, "205").unwrap();
        });
        let layout = LayoutEngine::new(&FixedWidth).layout(&doc);
        let lines = texts(&layout);

        assert!(lines.contains(&"HIMNOS:"));
        assert!(lines.contains(&"101  Amor de Dios"));
        assert!(lines.contains(&"CORO DIEZMO:"));
        assert!(lines.contains(&"205  Gracia Sublime"));
        assert!(!lines.contains(&"COROS:"));
        assert!(!lines.contains(&"CORO FINAL:"));
    }

    #[test]
    fn test_long_notes_wrap_inside_box() {
        let notes = "Oracion por los enfermos y anuncios. ".repeat(14);
        let notes = &notes[..500];
        let doc = document(|s| {
            s.confirm(WizardConfig::new(0, 0)).unwrap();
            s.set_preacher("").unwrap();
            s.set_notes(notes).unwrap();
        });
        let layout = LayoutEngine::new(&FixedWidth).layout(&doc);

        let rect = layout.pages[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Rect { x, width, height, .. } => Some((*x, *width, *height)),
                _ => None,
            })
            .unwrap();
        assert_eq!(rect, (LEFT_MARGIN, NOTES_BOX_WIDTH, NOTES_BOX_HEIGHT));

        let lines = texts(&layout);
        let note_lines = &lines[lines.iter().position(|l| *l == "NOTA:").unwrap() + 1..];
        assert!(note_lines.len() > 1);
        assert_eq!(
            note_lines.join(" ").split_whitespace().collect::<Vec<_>>(),
            notes.split_whitespace().collect::<Vec<_>>()
        );
        assert!(max_right_edge(&layout) <= LEFT_MARGIN + NOTES_BOX_WIDTH);
    }

    #[test]
    fn test_many_entries_paginate() {
        let catalog = sample_catalog();
        let doc = document(|s| {
            s.confirm(WizardConfig::new(10, 10)).unwrap();
            for i in 0..10 {
                s.set_code(&catalog, Slot::Hymn(i), "101").unwrap();
                s.set_code(&catalog, Slot::Chorus(i), "205").unwrap();
            }
            s.set_notes("linea\n".repeat(40)).unwrap();
        });
        let layout = LayoutEngine::new(&FixedWidth).layout(&doc);

        assert!(layout.pages.len() > 1);
        for page in &layout.pages {
            for op in &page.ops {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y < PAGE_HEIGHT - BREAK_MARGIN + 6.0);
                }
            }
        }
        let entries = layout.texts().filter(|t| t.starts_with("101  ")).count();
        assert_eq!(entries, 10);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let pen = Pen::new(&FixedWidth);
        // 11pt -> 2.2mm per char, so 23mm fits 10 chars.
        let lines = pen.wrap("abcdefghijklmnopqrstuvwxyz", 23.0);
        assert_eq!(lines, vec!["abcdefghij", "klmnopqrst", "uvwxyz"]);
    }

    #[test]
    fn test_wrap_words_and_newlines() {
        let pen = Pen::new(&FixedWidth);
        let lines = pen.wrap("uno dos tres\n\ncuatro", 23.0);
        assert_eq!(lines, vec!["uno dos", "tres", "", "cuatro"]);
        assert_eq!(pen.wrap("", 23.0), vec![""]);
    }
}
