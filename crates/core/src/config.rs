//! Locations of the input tables and export assets.

use std::path::{Path, PathBuf};

/// Default hymn table file name.
pub const HYMNS_FILE: &str = "HIMNOS.xlsx";
/// Default chorus table file name.
pub const CHORUSES_FILE: &str = "COROS.xlsx";
/// Default logo image file name.
pub const LOGO_FILE: &str = "logo.png";
/// Default TrueType font file name.
pub const FONT_FILE: &str = "DejaVuSans.ttf";

/// Where to find the reference tables and export assets, and where to write
/// the exported sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub hymns: PathBuf,
    pub choruses: PathBuf,
    /// Optional; the sheet is exported without a logo when it is missing.
    pub logo: PathBuf,
    /// Required for export.
    pub font: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

impl AssetPaths {
    /// Default file names resolved against `base`.
    pub fn in_dir(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            hymns: base.join(HYMNS_FILE),
            choruses: base.join(CHORUSES_FILE),
            logo: base.join(LOGO_FILE),
            font: base.join(FONT_FILE),
            output_dir: base.to_path_buf(),
        }
    }

    /// Logo path, if the file exists.
    pub fn existing_logo(&self) -> Option<&Path> {
        self.logo.is_file().then_some(self.logo.as_path())
    }
}
