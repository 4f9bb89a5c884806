use actix_multipart::{Field, Multipart};
use actix_web::HttpResponse;
use futures::StreamExt;
use log::debug;

use crate::storage::RawUpload;
use crate::ErrorResponse;

use super::pipeline::{flag_requested, Submission};
use super::schema;

/// Form flag that asks for the instructor copy.
pub const PRIVILEGED_FLAG_FIELD: &str = "include_appendix_ii";
/// Form field carrying the instructor secret.
pub const SECRET_FIELD: &str = "instructor_password";

#[derive(Debug, thiserror::Error)]
pub enum MultipartParseError {
    #[error("Multipart field error: {0}")]
    FieldError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Invalid UTF-8 data in field '{0}'")]
    Utf8Error(String),
    #[error("Request body exceeds the {0} byte limit")]
    PayloadTooLarge(usize),
}

impl From<MultipartParseError> for HttpResponse {
    fn from(error: MultipartParseError) -> Self {
        match error {
            MultipartParseError::FieldError(_) | MultipartParseError::Utf8Error(_) => {
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(&error.to_string()))
            }
            MultipartParseError::PayloadTooLarge(_) => HttpResponse::PayloadTooLarge()
                .json(ErrorResponse::payload_too_large(&error.to_string())),
            MultipartParseError::IoError(_) => HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&error.to_string())),
        }
    }
}

pub struct MultipartParser;

impl MultipartParser {
    /// Read a report form into a [`Submission`].
    ///
    /// File parts are kept only for known upload fields; text parts outside
    /// the schema are passed through and dropped later by the record.
    pub async fn parse_report_multipart(
        mut multipart: Multipart,
        max_bytes: usize,
    ) -> Result<Submission, MultipartParseError> {
        let mut submission = Submission::default();
        let mut received = 0usize;

        while let Some(item) = multipart.next().await {
            let mut field = item.map_err(|e| MultipartParseError::FieldError(e.to_string()))?;
            let content_disposition = field
                .content_disposition()
                .ok_or_else(|| MultipartParseError::FieldError("Content disposition not found".to_string()))?;
            let name = content_disposition
                .get_name()
                .ok_or_else(|| MultipartParseError::FieldError("Field name not found".to_string()))?
                .to_string();
            let maybe_filename = content_disposition.get_filename().map(|s| s.to_string());

            let data = read_field(&mut field, &mut received, max_bytes).await?;

            if let Some(filename) = maybe_filename {
                if schema::upload_key(&name).is_none() {
                    debug!("ignoring file part '{}'", name);
                    continue;
                }
                if filename.trim().is_empty() && data.is_empty() {
                    continue;
                }
                submission.files.insert(name, RawUpload::new(filename, data));
                continue;
            }

            let value = String::from_utf8(data).map_err(|_| MultipartParseError::Utf8Error(name.clone()))?;
            match name.as_str() {
                PRIVILEGED_FLAG_FIELD => submission.include_privileged = flag_requested(&value),
                SECRET_FIELD => submission.secret = value,
                _ => submission.fields.push((name, value)),
            }
        }

        debug!(
            "parsed report form: {} fields, {} files, {} bytes",
            submission.fields.len(),
            submission.files.len(),
            received
        );
        Ok(submission)
    }
}

async fn read_field(
    field: &mut Field,
    received: &mut usize,
    max_bytes: usize,
) -> Result<Vec<u8>, MultipartParseError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.next().await {
        let data_chunk = chunk.map_err(|e| MultipartParseError::IoError(e.to_string()))?;
        *received += data_chunk.len();
        if *received > max_bytes {
            return Err(MultipartParseError::PayloadTooLarge(max_bytes));
        }
        buffer.extend_from_slice(&data_chunk);
    }
    Ok(buffer)
}
