//! Configuration module for the SaveSpace backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::AppError;

/// Default upload limit: 25 MiB.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Client API key required on every /api request (disabled when unset)
    pub api_key: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Root directory for uploaded file blobs
    pub storage_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Externally visible base URL, used to build download URLs
    pub public_url: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Session lifetime in hours
    pub session_ttl_hours: i64,
    /// Maximum accepted upload body size in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("SAVESPACE_API_KEY").ok().filter(|k| !k.is_empty());

        let db_path = env::var("SAVESPACE_DB_PATH")
            .unwrap_or_else(|_| "./data/savespace.sqlite".to_string())
            .into();

        let index_path = env::var("SAVESPACE_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let storage_path = env::var("SAVESPACE_STORAGE_PATH")
            .unwrap_or_else(|_| "./data/storage".to_string())
            .into();

        let bind_addr: SocketAddr = parse_var("SAVESPACE_BIND_ADDR", "127.0.0.1:8080")?;

        let public_url = env::var("SAVESPACE_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}", bind_addr))
            .trim_end_matches('/')
            .to_string();

        let log_level = env::var("SAVESPACE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let session_ttl_hours = parse_var("SAVESPACE_SESSION_TTL_HOURS", "168")?;
        if session_ttl_hours <= 0 {
            return Err(AppError::Config(
                "SAVESPACE_SESSION_TTL_HOURS must be positive".to_string(),
            ));
        }

        let max_upload_bytes = parse_var(
            "SAVESPACE_MAX_UPLOAD_BYTES",
            &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
        )?;

        Ok(Self {
            api_key,
            db_path,
            index_path,
            storage_path,
            bind_addr,
            public_url,
            log_level,
            session_ttl_hours,
            max_upload_bytes,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, AppError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| AppError::Config(format!("Invalid {} value: {:?}", name, raw)))
}
