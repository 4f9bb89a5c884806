//! Upload kinds and MIME type detection.

use serde::Serialize;
use std::path::Path;

use super::schema::{IMAGE_EXTENSIONS, PDF_EXTENSIONS};

/// What the report can do with a stored upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    /// Embedded inline, scaled into a bordered box.
    Image,
    /// Pages appended to the end of the report.
    Pdf,
    Unsupported,
}

impl UploadKind {
    /// Parse from extension string (without the dot, any case).
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if PDF_EXTENSIONS.contains(&ext.as_str()) {
            Self::Pdf
        } else {
            Self::Unsupported
        }
    }

    /// Parse from filename.
    pub fn from_filename(filename: &str) -> Self {
        file_extension(filename)
            .map(|ext| Self::from_extension(&ext))
            .unwrap_or(Self::Unsupported)
    }
}

/// Lowercased extension of a filename, without the dot.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
