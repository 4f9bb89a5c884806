mod common;

#[cfg(test)]
mod api_tests {
    use super::common::*;
    use actix_web::{http::header, http::StatusCode, test, web, App};
    use lab_report_server::report::handlers::{self, ReportState, COMPLETION_SCORE_HEADER};
    use lab_report_server::ErrorResponse;
    use std::path::Path;

    const BOUNDARY: &str = "----labreportboundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, filename, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n",
                            name, filename
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn state(dir: &Path, max_upload_bytes: usize) -> web::Data<ReportState> {
        web::Data::new(ReportState {
            service: test_service(dir, ""),
            max_upload_bytes,
        })
    }

    fn report_request(parts: &[Part]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/reports")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(multipart_body(parts))
    }

    #[actix_web::test]
    async fn test_generate_report_returns_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(dir.path(), 10 * 1024 * 1024))
                .service(web::scope("/api").configure(handlers::config)),
        )
        .await;

        let png = png_bytes(20, 20);
        let req = report_request(&[
            Part::Text("member1", "Jane Doe"),
            Part::Text("lab_date", "2026-01-15"),
            Part::Text("include_appendix_ii", "off"),
            Part::File("d1_upload", "photo.png", &png),
            Part::File("perr_upload", "", b""),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap();
        assert_eq!(
            disposition.to_str().unwrap(),
            "attachment; filename=\"Jane_Doe_2026-01-15_STUDENT.pdf\""
        );
        let score = resp.headers().get(COMPLETION_SCORE_HEADER).unwrap().to_str().unwrap().to_string();
        assert!(score.starts_with("3/"), "unexpected score header {}", score);

        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"%PDF"));
        assert_eq!(file_count(&dir.path().join("uploads")), 1);
    }

    #[actix_web::test]
    async fn test_missing_member_is_bad_request_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(dir.path(), 10 * 1024 * 1024))
                .service(web::scope("/api").configure(handlers::config)),
        )
        .await;

        let png = png_bytes(8, 8);
        let req = report_request(&[
            Part::Text("lab_date", "2026-01-15"),
            Part::File("d1_upload", "photo.png", &png),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(error.error, "BadRequest");
        assert!(error.message.contains("member1"));
        assert!(!dir.path().join("uploads").exists());
        assert!(!dir.path().join("generated").exists());
    }

    #[actix_web::test]
    async fn test_unsupported_upload_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(dir.path(), 10 * 1024 * 1024))
                .service(web::scope("/api").configure(handlers::config)),
        )
        .await;

        let req = report_request(&[
            Part::Text("member1", "Jane Doe"),
            Part::Text("lab_date", "2026-01-15"),
            Part::File("sample_calc", "calc.docx", b"not allowed"),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = test::read_body_json(resp).await;
        assert!(error.message.contains(".docx"));
    }

    #[actix_web::test]
    async fn test_oversized_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(dir.path(), 1024))
                .service(web::scope("/api").configure(handlers::config)),
        )
        .await;

        let big = vec![0u8; 4096];
        let req = report_request(&[
            Part::Text("member1", "Jane Doe"),
            Part::Text("lab_date", "2026-01-15"),
            Part::File("signed_data", "signed.pdf", &big),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!dir.path().join("uploads").exists());
    }

    #[actix_web::test]
    async fn test_schema_lists_fields() {
        let app = test::init_service(App::new().service(web::scope("/api").configure(handlers::config))).await;

        let req = test::TestRequest::get().uri("/api/reports/schema").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["mandatory_keys"], serde_json::json!(["member1", "lab_date"]));
        assert_eq!(
            body["allowed_extensions"],
            serde_json::json!([".jpeg", ".jpg", ".pdf", ".png", ".webp"])
        );
        let uploads = body["upload_keys"].as_array().unwrap();
        assert!(uploads.iter().any(|field| field["key"] == "signed_data"));
    }

    #[::core::prelude::v1::test]
    fn test_error_response_serialization() {
        let error = ErrorResponse::payload_too_large("too big");
        let json = serde_json::to_string(&error).unwrap();
        let parsed: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.error, "PayloadTooLarge");
        assert_eq!(parsed.message, "too big");
    }
}
