//! Error types for loading reference tables, driving the wizard and exporting.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a service sheet.
///
/// A lookup miss is not an error; see [`crate::Lookup::NotFound`].
#[derive(Error, Debug)]
pub enum Error {
    /// A required input file does not exist.
    #[error("No se encontró el archivo '{}'", .0.display())]
    FileNotFound(PathBuf),

    /// The input file exists but could not be read as a table.
    #[error("Error leyendo '{}': {message}", path.display())]
    LoadError { path: PathBuf, message: String },

    /// The input table has no data rows.
    #[error("'{}' está vacío o no tiene filas", .0.display())]
    EmptyTable(PathBuf),

    /// The document could not be rendered (missing font, encoder failure).
    #[error("Render error: {0}")]
    RenderError(String),

    /// The wizard configuration is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested action is not available in the current wizard phase.
    #[error("Action not available in phase {0:?}")]
    InvalidTransition(crate::Phase),

    /// The slot was not allocated by the wizard configuration.
    #[error("Slot {0} is not part of this service")]
    UnknownSlot(crate::Slot),

    /// Failed to read or write a file.
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),
}
