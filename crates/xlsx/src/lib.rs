//! Spreadsheet loader for the hymn and chorus reference tables.
//!
//! Reads any workbook format `calamine` recognizes (.xlsx, .xlsm, .xlsb,
//! .xls, .ods) into a [`guiador_core::ReferenceTable`].

pub mod loader;

pub use loader::TableLoader;
