//! Core domain types, reference-table lookup, wizard state and page layout
//! for GUIADOR service program sheets.

pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod lookup;
pub mod normalize;
pub mod table;
pub mod types;
pub mod wizard;

pub use config::AssetPaths;
pub use document::{Section, SectionKind, ServiceDocument};
pub use error::{Error, Result};
pub use layout::{DrawOp, Layout, LayoutEngine, Page, TextMeasure};
pub use lookup::{Catalog, Lookup, LookupIndex, Miss};
pub use normalize::{normalize_header, strip_accents};
pub use table::{Cell, ColumnRef, ReferenceTable};
pub use types::{Code, SlotEntry};
pub use wizard::{Phase, Slot, WizardConfig, WizardState};
