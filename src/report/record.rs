//! The validated record of one submission.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::file::UploadKind;
use super::schema::{self, DATE_KEY, PRIMARY_NAME_KEY, TEXT_KEYS, UPLOAD_KEYS};
use super::traits::Validator;
use super::validation::{validate_required, ValidationErrors};

static EMPTY_UPLOAD: UploadRef = UploadRef::Empty;

/// A file persisted by the upload store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredUpload {
    /// Filename as sent by the client.
    pub original_name: String,
    pub path: PathBuf,
    pub kind: UploadKind,
}

/// Handle to a stored upload, or nothing when the field was left empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(untagged)]
pub enum UploadRef {
    #[default]
    Empty,
    Stored(StoredUpload),
}

impl UploadRef {
    pub fn stored(original_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = UploadKind::from_filename(&path.to_string_lossy());
        Self::Stored(StoredUpload {
            original_name: original_name.into(),
            path,
            kind,
        })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Empty => None,
            Self::Stored(upload) => Some(&upload.path),
        }
    }

    pub fn kind(&self) -> Option<UploadKind> {
        match self {
            Self::Empty => None,
            Self::Stored(upload) => Some(upload.kind),
        }
    }

    /// Whether the referenced file currently exists. Never touches storage.
    pub fn exists(&self) -> bool {
        self.path().map(Path::is_file).unwrap_or(false)
    }

    /// Stored file name, as shown next to "Uploaded file:" in the report.
    pub fn display_name(&self) -> String {
        self.path()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Every text answer and upload reference of one submission.
///
/// All schema keys are always present; values default to empty.
#[derive(Debug, Clone)]
pub struct Record {
    text: BTreeMap<&'static str, String>,
    uploads: BTreeMap<&'static str, UploadRef>,
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl Record {
    /// Record with every schema key set to empty.
    pub fn new() -> Self {
        Self {
            text: TEXT_KEYS.iter().map(|key| (*key, String::new())).collect(),
            uploads: UPLOAD_KEYS
                .iter()
                .map(|(key, _)| (*key, UploadRef::Empty))
                .collect(),
        }
    }

    /// Build a record from flat `(name, value)` form fields.
    ///
    /// Values are trimmed and line endings normalised. Names outside the
    /// schema are ignored.
    pub fn collect<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = Self::new();
        for (name, value) in fields {
            if !record.set_text(name, value) {
                log::debug!("ignoring unknown form field '{}'", name);
            }
        }
        record
    }

    /// Set a text value. Returns `false` when the key is not in the schema.
    pub fn set_text(&mut self, key: &str, value: &str) -> bool {
        match schema::text_key(key) {
            Some(key) => {
                self.text.insert(key, normalize_text(value));
                true
            }
            None => false,
        }
    }

    /// Set an upload reference. Returns `false` when the key is not in the schema.
    pub fn set_upload(&mut self, key: &str, reference: UploadRef) -> bool {
        match schema::upload_key(key) {
            Some((key, _)) => {
                self.uploads.insert(key, reference);
                true
            }
            None => false,
        }
    }

    pub fn text(&self, key: &str) -> &str {
        self.text.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn upload(&self, key: &str) -> &UploadRef {
        self.uploads.get(key).unwrap_or(&EMPTY_UPLOAD)
    }

    /// Upload references in schema order, which is also the PDF append order.
    pub fn uploads_in_order(&self) -> Vec<&UploadRef> {
        UPLOAD_KEYS.iter().map(|(key, _)| self.upload(key)).collect()
    }
}

impl Validator for Record {
    /// The name and date are mandatory; everything else is scored, not enforced.
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(self.text(PRIMARY_NAME_KEY), PRIMARY_NAME_KEY, "Lab member name 1", &mut errors);
        validate_required(self.text(DATE_KEY), DATE_KEY, "Date", &mut errors);
        errors.into_result()
    }
}

fn normalize_text(value: &str) -> String {
    value.trim().replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_fills_every_key() {
        let record = Record::collect([("member1", "  Jane Doe "), ("bogus", "x")]);
        assert_eq!(record.text("member1"), "Jane Doe");
        let filled = TEXT_KEYS.iter().filter(|key| !record.text(key).is_empty()).count();
        assert_eq!(filled, 1);
        assert_eq!(record.text("bogus"), "");
        assert!(record.upload("signed_data").is_empty());
        assert_eq!(record.uploads_in_order().len(), UPLOAD_KEYS.len());
    }

    #[test]
    fn test_collect_normalizes_line_endings() {
        let record = Record::collect([("p2_expr", "a\r\nb\rc\n")]);
        assert_eq!(record.text("p2_expr"), "a\nb\nc");
    }

    #[test]
    fn test_validate_requires_name_and_date() {
        let record = Record::collect([("member1", "Jane")]);
        let errors = record.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.to_message().contains("lab_date"));

        let record = Record::collect([("member1", "Jane"), ("lab_date", "2026-01-15")]);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_upload_ref_accessors() {
        let reference = UploadRef::stored("Work.PDF", "/nonexistent/p2_unc_20260115_101010_Work.PDF");
        assert_eq!(reference.kind(), Some(UploadKind::Pdf));
        assert_eq!(reference.display_name(), "p2_unc_20260115_101010_Work.PDF");
        assert!(!reference.exists());
        assert!(!reference.is_empty());
        assert_eq!(UploadRef::Empty.display_name(), "");
    }

    #[test]
    fn test_set_upload_rejects_unknown_key() {
        let mut record = Record::new();
        assert!(!record.set_upload("nope", UploadRef::stored("a.png", "/tmp/a.png")));
        assert!(record.set_upload("d1_upload", UploadRef::stored("a.png", "/tmp/a.png")));
        assert_eq!(record.upload("d1_upload").kind(), Some(UploadKind::Image));
    }
}
