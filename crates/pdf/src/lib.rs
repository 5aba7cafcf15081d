//! PDF export backend for GUIADOR service sheets.
//!
//! Turns a laid-out [`guiador_core::ServiceDocument`] into a single PDF blob
//! with an embedded TrueType font.

pub mod exporter;
pub mod font;

pub use exporter::PdfExporter;
pub use font::PdfFont;
