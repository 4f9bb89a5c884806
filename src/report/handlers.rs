use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpResponse, Responder};
use log::{debug, error, info, warn};
use serde::Serialize;
use utoipa::ToSchema;

use crate::ErrorResponse;

use super::multipart_parser::MultipartParser;
use super::pipeline::ReportService;
use super::schema::{
    allowed_extensions, DATE_KEY, PRIMARY_NAME_KEY, REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS, TEXT_KEYS,
    UPLOAD_KEYS,
};
use super::ReportError;

/// Response header carrying `score/total` of the returned report.
pub const COMPLETION_SCORE_HEADER: &str = "X-Completion-Score";

/// Shared state of the report endpoints.
pub struct ReportState {
    pub service: ReportService,
    pub max_upload_bytes: usize,
}

impl From<ReportError> for HttpResponse {
    fn from(error: ReportError) -> Self {
        let message = match &error {
            ReportError::Validation(errors) => errors.to_message(),
            other => other.to_string(),
        };
        if error.is_client_error() {
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message))
        } else {
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&message))
        }
    }
}

#[derive(Debug, serde::Deserialize, ToSchema)]
pub struct GenerateReportRequest {
    /// Primary lab member; required.
    pub member1: String,
    /// Lab date; required.
    pub lab_date: String,
    pub member2: Option<String>,
    pub member3: Option<String>,
    pub professor_name: Option<String>,
    /// Any non-empty value except `0`, `false` or `off` requests the instructor copy.
    pub include_appendix_ii: Option<String>,
    pub instructor_password: Option<String>,
    /// Signed data sheet, one of the upload fields listed by `/reports/schema`.
    #[allow(unused)]
    #[schema(value_type = Option<String>, format = Binary)]
    pub signed_data: Option<Vec<u8>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadField {
    pub key: String,
    /// Prefix of the stored filename.
    pub prefix: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportSchema {
    pub text_keys: Vec<String>,
    pub upload_keys: Vec<UploadField>,
    pub required_text_keys: Vec<String>,
    pub required_upload_keys: Vec<String>,
    pub mandatory_keys: Vec<String>,
    pub allowed_extensions: Vec<String>,
}

impl ReportSchema {
    pub fn current() -> Self {
        Self {
            text_keys: owned(TEXT_KEYS),
            upload_keys: UPLOAD_KEYS
                .iter()
                .map(|(key, prefix)| UploadField {
                    key: key.to_string(),
                    prefix: prefix.to_string(),
                })
                .collect(),
            required_text_keys: owned(REQUIRED_TEXT_KEYS),
            required_upload_keys: owned(REQUIRED_UPLOAD_KEYS),
            mandatory_keys: owned(&[PRIMARY_NAME_KEY, DATE_KEY]),
            allowed_extensions: allowed_extensions(),
        }
    }
}

fn owned(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| key.to_string()).collect()
}

#[utoipa::path(
    context_path = "/api",
    tag = "Report Service",
    post,
    path = "/reports",
    request_body(content = inline(GenerateReportRequest), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Student report PDF", content_type = "application/pdf"),
        (status = 400, description = "Invalid submission", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn generate_report(payload: Multipart, state: web::Data<ReportState>) -> impl Responder {
    info!("Executing generate_report handler");
    let submission = match MultipartParser::parse_report_multipart(payload, state.max_upload_bytes).await {
        Ok(submission) => submission,
        Err(e) => {
            warn!("Rejected report form: {}", e);
            return HttpResponse::from(e);
        }
    };
    debug!(
        "Report form received with {} fields and {} files",
        submission.fields.len(),
        submission.files.len()
    );

    let worker_state = state.clone();
    let result = web::block(move || worker_state.service.generate(&submission)).await;

    match result {
        Ok(Ok(report)) => {
            info!(
                "Report {} generated, score {}",
                report.filename,
                report.score.summary()
            );
            HttpResponse::Ok()
                .content_type("application/pdf")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", report.filename),
                ))
                .insert_header((
                    COMPLETION_SCORE_HEADER,
                    format!("{}/{}", report.score.score, report.score.total),
                ))
                .body(report.pdf)
        }
        Ok(Err(e)) => {
            if e.is_client_error() {
                warn!("Report generation rejected: {}", e);
            } else {
                error!("Report generation failed: {}", e);
            }
            HttpResponse::from(e)
        }
        Err(e) => {
            error!("Report worker failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Report generation was interrupted"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Report Service",
    get,
    path = "/reports/schema",
    responses(
        (status = 200, description = "Fields accepted by the report form", body = ReportSchema)
    )
)]
pub async fn report_schema() -> impl Responder {
    HttpResponse::Ok().json(ReportSchema::current())
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/reports").route(web::post().to(generate_report)))
        .service(web::resource("/reports/schema").route(web::get().to(report_schema)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ValidationError, ValidationErrors};
    use actix_web::http::StatusCode;

    #[test]
    fn test_report_error_status_mapping() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::empty_field("member1", "Lab member name 1"));
        assert_eq!(
            HttpResponse::from(ReportError::Validation(errors)).status(),
            StatusCode::BAD_REQUEST
        );
        let merge = ReportError::AttachmentMergeFailure {
            reference: "scan.pdf".to_string(),
            reason: "broken".to_string(),
        };
        assert_eq!(HttpResponse::from(merge).status(), StatusCode::BAD_REQUEST);
        let storage = ReportError::storage("/tmp", std::io::Error::other("disk full"));
        assert_eq!(HttpResponse::from(storage).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            HttpResponse::from(ReportError::AccessPolicy("rc4".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_schema_matches_keys() {
        let schema = ReportSchema::current();
        assert_eq!(schema.text_keys.len(), TEXT_KEYS.len());
        assert_eq!(schema.upload_keys.len(), UPLOAD_KEYS.len());
        assert_eq!(schema.mandatory_keys, vec!["member1", "lab_date"]);
    }
}
