use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_UPLOADS_DIR: &str = "./uploads";
const DEFAULT_OUTPUT_DIR: &str = "./generated_pdfs";
const DEFAULT_STATIC_DIR: &str = "./static";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 30 * 1024 * 1024;
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "http://localhost:8080",
    "http://127.0.0.1:8080",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be true or false, got '{value}'")]
    InvalidFlag { key: &'static str, value: String },
}

/// Runtime configuration read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub uploads_dir: PathBuf,
    pub output_dir: PathBuf,
    pub static_dir: PathBuf,
    /// Fallback secret for instructor copies when the form carries none.
    pub instructor_password: String,
    pub show_score: bool,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            uploads_dir: PathBuf::from(DEFAULT_UPLOADS_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            instructor_password: String::new(),
            show_score: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(host) = get("SERVER_HOST") {
            config.host = host;
        }
        if let Some(port) = get("SERVER_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidNumber {
                key: "SERVER_PORT",
                value: port,
            })?;
        }
        if let Some(dir) = get("REPORT_UPLOADS_DIR") {
            config.uploads_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("REPORT_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("REPORT_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        // The secret is used verbatim, surrounding spaces included.
        if let Some(password) = lookup("INSTRUCTOR_PDF_PASSWORD") {
            config.instructor_password = password;
        }
        if let Some(flag) = get("REPORT_SHOW_SCORE") {
            config.show_score = parse_flag(&flag).ok_or(ConfigError::InvalidFlag {
                key: "REPORT_SHOW_SCORE",
                value: flag,
            })?;
        }
        if let Some(limit) = get("REPORT_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit.parse().map_err(|_| ConfigError::InvalidNumber {
                key: "REPORT_MAX_UPLOAD_BYTES",
                value: limit,
            })?;
        }
        if let Some(origins) = get("CORS_ALLOWED_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(config)
    }
}

/// Parse a boolean flag as used in the environment and in form fields.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
