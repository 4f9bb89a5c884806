use chrono::{Local, NaiveDateTime};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::report::common::sanitize_upload_filename;
use crate::report::file::{file_extension, UploadKind};
use crate::report::schema::allowed_extensions;
use crate::report::{ReportError, UploadRef};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// Upper bound on same-second collisions before giving up.
const MAX_NAME_ATTEMPTS: usize = 10_000;

/// An uploaded file as received from the client, not yet validated.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl RawUpload {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

/// Persists uploads under a single directory. Never overwrites a file.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory when missing.
    pub fn ensure_dir(&self) -> Result<(), ReportError> {
        fs::create_dir_all(&self.root).map_err(|e| ReportError::storage(&self.root, e))
    }

    /// Validate the upload type and store it as
    /// `{prefix}_{YYYYmmdd_HHMMSS}_{sanitised name}`.
    ///
    /// An absent upload or a blank filename yields an empty reference.
    pub fn validate_and_store(
        &self,
        upload: Option<&RawUpload>,
        prefix: &str,
    ) -> Result<UploadRef, ReportError> {
        self.store_at(upload, prefix, Local::now().naive_local())
    }

    /// Same as [`validate_and_store`](Self::validate_and_store) with an explicit timestamp.
    pub fn store_at(
        &self,
        upload: Option<&RawUpload>,
        prefix: &str,
        timestamp: NaiveDateTime,
    ) -> Result<UploadRef, ReportError> {
        let upload = match upload {
            Some(upload) if !upload.filename.trim().is_empty() => upload,
            _ => return Ok(UploadRef::Empty),
        };

        validate_type(upload)?;
        self.ensure_dir()?;
        let safe_name = sanitize_upload_filename(&upload.filename);
        let stamp = timestamp.format(TIMESTAMP_FORMAT).to_string();
        let path = self.write_new(prefix, &stamp, &safe_name, &upload.data)?;

        log::debug!("stored upload {} as {}", upload.filename, path.display());
        Ok(UploadRef::stored(upload.filename.clone(), path))
    }

    /// Write under the first free name, adding `_{n}` after the timestamp on collision.
    fn write_new(&self, prefix: &str, stamp: &str, name: &str, data: &[u8]) -> Result<PathBuf, ReportError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let filename = if attempt == 0 {
                format!("{}_{}_{}", prefix, stamp, name)
            } else {
                format!("{}_{}_{}_{}", prefix, stamp, attempt, name)
            };
            let path = self.root.join(filename);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    fill_new(file, &path, data)?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(ReportError::storage(&path, e)),
            }
        }
        Err(ReportError::storage(
            &self.root,
            std::io::Error::new(ErrorKind::AlreadyExists, "no free upload name"),
        ))
    }
}

/// Write `data` into a file just created at `path`, removing it if the write fails.
fn fill_new(mut file: impl Write, path: &Path, data: &[u8]) -> Result<(), ReportError> {
    if let Err(e) = file.write_all(data) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            log::warn!("could not remove partial upload {}: {}", path.display(), cleanup);
        }
        return Err(ReportError::storage(path, e));
    }
    Ok(())
}

/// Kind of an upload, or `UnsupportedUploadType` when its extension is not accepted.
pub fn validate_type(upload: &RawUpload) -> Result<UploadKind, ReportError> {
    let extension = file_extension(&upload.filename).unwrap_or_default();
    match UploadKind::from_extension(&extension) {
        UploadKind::Unsupported => Err(ReportError::UnsupportedUploadType {
            extension: if extension.is_empty() {
                "(none)".to_string()
            } else {
                format!(".{}", extension)
            },
            allowed: allowed_extensions().join(", "),
        }),
        kind => Ok(kind),
    }
}

/// Write a generated document, replacing an earlier one of the same name.
pub fn persist_output(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).map_err(|e| ReportError::storage(dir, e))?;
    let path = dir.join(filename);
    fs::write(&path, bytes).map_err(|e| ReportError::storage(&path, e))?;
    Ok(path)
}
