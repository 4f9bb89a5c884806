//! One submission, start to finish.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::storage::{persist_output, validate_type, RawUpload, UploadStore};

use super::access::{apply_access_policy, AccessPolicy};
use super::common::{instructor_filename, output_base_name, student_filename};
use super::composer::Composer;
use super::layout::LayoutConfig;
use super::merge::merge_attachments;
use super::record::{Record, UploadRef};
use super::schema::{DATE_KEY, PRIMARY_NAME_KEY, REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS, UPLOAD_KEYS};
use super::scoring::{score, Score};
use super::traits::Validator;
use super::{GeneratedReport, ReportError};

/// Everything the client sent for one report.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Text fields in arrival order. Later values win.
    pub fields: Vec<(String, String)>,
    /// Uploads keyed by form field name.
    pub files: HashMap<String, RawUpload>,
    /// Whether an instructor copy was asked for.
    pub include_privileged: bool,
    /// Instructor secret from the form, trimmed before use. Blank falls back
    /// to the configured one.
    pub secret: String,
}

impl Submission {
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_file(mut self, name: &str, upload: RawUpload) -> Self {
        self.files.insert(name.to_string(), upload);
        self
    }
}

/// Whether a form flag asks for the option: any non-empty value except
/// `0`, `false` or `off`.
pub fn flag_requested(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    !value.is_empty() && !matches!(value.as_str(), "0" | "false" | "off")
}

/// Runs the report pipeline: collect, store, score, compose, merge, protect, persist.
#[derive(Debug, Clone)]
pub struct ReportService {
    composer: Composer,
    store: UploadStore,
    output_dir: PathBuf,
    default_secret: String,
}

impl ReportService {
    pub fn new(
        composer: Composer,
        store: UploadStore,
        output_dir: impl Into<PathBuf>,
        default_secret: impl Into<String>,
    ) -> Self {
        Self {
            composer,
            store,
            output_dir: output_dir.into(),
            default_secret: default_secret.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Composer::new(LayoutConfig::default(), &config.static_dir, config.show_score),
            UploadStore::new(&config.uploads_dir),
            &config.output_dir,
            &config.instructor_password,
        )
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate the student copy, and the instructor copy when one was
    /// requested with a secret available.
    ///
    /// Nothing is stored unless the mandatory fields are present and every
    /// upload has an accepted type.
    pub fn generate(&self, submission: &Submission) -> Result<GeneratedReport, ReportError> {
        let mut record = Record::collect(
            submission
                .fields
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );
        record.validate()?;

        let uploads: Vec<(&str, &str, &RawUpload)> = UPLOAD_KEYS
            .iter()
            .filter_map(|(key, prefix)| submission.files.get(*key).map(|upload| (*key, *prefix, upload)))
            .filter(|(_, _, upload)| !upload.filename.trim().is_empty())
            .collect();
        for (_, _, upload) in &uploads {
            validate_type(upload)?;
        }

        log::info!(
            "generating report for '{}' ({} fields, {} uploads)",
            record.text(PRIMARY_NAME_KEY),
            submission.fields.len(),
            uploads.len()
        );

        for (key, prefix, upload) in uploads {
            let reference = self.store.validate_and_store(Some(upload), prefix)?;
            record.set_upload(key, reference);
        }

        let score = score(&record, REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS);
        log::info!("completion score {}", score.summary());

        let secret = match submission.secret.trim() {
            "" => self.default_secret.trim(),
            typed => typed,
        };
        let policy = AccessPolicy::resolve(submission.include_privileged, secret);
        if submission.include_privileged && !policy.includes_restricted_section() {
            log::warn!("instructor copy requested without a secret, generating the student copy only");
        }

        let attachments = record.uploads_in_order();
        let base = output_base_name(record.text(PRIMARY_NAME_KEY), record.text(DATE_KEY));

        let student = self.build(&record, &score, &attachments, &AccessPolicy::Public)?;
        let filename = student_filename(&base);
        let path = persist_output(&self.output_dir, &filename, &student)?;
        log::info!("saved student report to {}", path.display());

        let instructor_name = if policy.includes_restricted_section() {
            let instructor = self.build(&record, &score, &attachments, &policy)?;
            let name = instructor_filename(&base);
            let path = persist_output(&self.output_dir, &name, &instructor)?;
            log::info!("saved instructor report to {}", path.display());
            Some(name)
        } else {
            None
        };

        Ok(GeneratedReport {
            filename,
            pdf: student,
            score,
            instructor_filename: instructor_name,
        })
    }

    fn build(
        &self,
        record: &Record,
        score: &Score,
        attachments: &[&UploadRef],
        policy: &AccessPolicy,
    ) -> Result<Vec<u8>, ReportError> {
        let composed = self
            .composer
            .compose(record, policy.includes_restricted_section(), score)?;
        let composed_len = composed.len();
        let merged = merge_attachments(composed, attachments)?;
        let protected = apply_access_policy(&merged, policy)?;
        log::info!(
            "document sizes: composed {} bytes, merged {} bytes, protected {} bytes",
            composed_len,
            merged.len(),
            protected.len()
        );
        Ok(protected)
    }
}
