use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod report;
pub mod storage;

use crate::config::AppConfig;
use crate::report::handlers::ReportState;
use crate::report::ReportService;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn payload_too_large(message: &str) -> Self {
        Self::new("PayloadTooLarge", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::report::handlers::generate_report,
        crate::report::handlers::report_schema,
    ),
    components(
        schemas(
            report::handlers::GenerateReportRequest,
            report::handlers::ReportSchema,
            report::handlers::UploadField,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Report Service", description = "Lab report generation endpoints.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Localhost server")
    )
)]
pub struct ApiDoc;

/// Build the report state and create the storage directories.
pub fn report_state(config: &AppConfig) -> Result<ReportState, report::ReportError> {
    let service = ReportService::from_config(config);
    service.store().ensure_dir()?;
    std::fs::create_dir_all(service.output_dir())
        .map_err(|e| report::ReportError::storage(service.output_dir(), e))?;
    Ok(ReportState {
        service,
        max_upload_bytes: config.max_upload_bytes,
    })
}

pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let state = match report_state(&config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to prepare storage directories: {}", e);
            std::process::exit(1);
        }
    };
    if config.instructor_password.is_empty() {
        log::warn!("INSTRUCTOR_PDF_PASSWORD not set, instructor copies need a password in the form");
    }

    let prometheus = match PrometheusMetricsBuilder::new("lab_report_server")
        .endpoint("/metrics")
        .build()
    {
        Ok(prometheus) => prometheus,
        Err(e) => {
            log::error!("Failed to create Prometheus metrics middleware: {}", e);
            std::process::exit(1);
        }
    };

    let max_upload_bytes = config.max_upload_bytes;
    let cors_origins = config.cors_origins.clone();
    log::info!("Starting server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let state = state.clone();
        let prometheus = prometheus.clone();
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![
                header::CONTENT_DISPOSITION,
                header::HeaderName::from_static("x-completion-score"),
            ])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(state)
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .service(web::scope("/api").configure(report::handlers::config))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
