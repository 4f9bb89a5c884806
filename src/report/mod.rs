//! Report module - business logic for assembling lab reports as PDF documents.
//!
//! The pipeline runs in a fixed order:
//! - `record` - collect form fields into a [`Record`]
//! - `crate::storage` - validate and persist uploads
//! - `scoring` - completion score over the required fields
//! - `composer` - lay out the report through the `render` engine
//! - `merge` - append uploaded PDF pages
//! - `access` - apply the public or instructor access policy

pub mod access;
pub mod common;
pub mod composer;
pub mod decorator;
pub mod file;
pub mod handlers;
pub mod layout;
pub mod merge;
pub mod multipart_parser;
pub mod narrative;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod schema;
pub mod scoring;
pub mod sections;
pub mod traits;
pub mod validation;

pub use access::{apply_access_policy, AccessPolicy};
pub use composer::Composer;
pub use layout::LayoutConfig;
pub use merge::merge_attachments;
pub use pipeline::{ReportService, Submission};
pub use file::UploadKind;
pub use record::{Record, StoredUpload, UploadRef};
pub use scoring::{score, Score};
pub use traits::Validator;
pub use validation::{ValidationError, ValidationErrors};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while generating a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("Unsupported upload type: {extension}. Allowed: {allowed}")]
    UnsupportedUploadType { extension: String, allowed: String },
    #[error("failed to merge attachment '{reference}': {reason}")]
    AttachmentMergeFailure { reference: String, reason: String },
    #[error("failed to read uploaded image '{reference}': {reason}")]
    ImageDecode { reference: String, reason: String },
    #[error("storage I/O failed for {path}: {source}")]
    StorageIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render document: {0}")]
    Render(String),
    #[error("failed to apply access policy: {0}")]
    AccessPolicy(String),
}

impl ReportError {
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageIo {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure was caused by the submitted data rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::UnsupportedUploadType { .. }
                | Self::AttachmentMergeFailure { .. }
                | Self::ImageDecode { .. }
        )
    }
}

impl From<lopdf::Error> for ReportError {
    fn from(error: lopdf::Error) -> Self {
        Self::Render(error.to_string())
    }
}

/// Result of a successful report generation.
#[derive(Debug)]
pub struct GeneratedReport {
    /// Download name of the student copy, e.g. `Jane_Doe_2026-01-15_STUDENT.pdf`.
    pub filename: String,
    pub pdf: Vec<u8>,
    pub score: Score,
    /// Name of the persisted instructor copy, when one was generated.
    pub instructor_filename: Option<String>,
}
