//! Server configuration
//!
//! Everything the relay needs at startup is read from environment variables.
//! Priority is runtime env var > built-in default, the same way the API host
//! is resolved for the upload clients. Invalid values are reported as startup
//! errors instead of being silently replaced.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Per-file cap applied while parsing the multipart body (50 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
/// Cap on the whole request body (512 MiB)
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 512 * 1024 * 1024;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format '{}' (expected text or json)", other)),
        }
    }
}

/// Process-wide, read-only server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub max_file_size: u64,
    pub max_request_size: usize,
    pub temp_dir: PathBuf,
    pub upload_concurrency: usize,
    pub drive_upload_base: String,
    pub http_timeout: Duration,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            temp_dir: env::temp_dir(),
            upload_concurrency: 1,
            drive_upload_base: DEFAULT_DRIVE_UPLOAD_BASE.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            log_format: LogFormat::Text,
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values count as unset so that `RELAY_LOG_DIR=` in a `.env`
    /// file behaves like a missing variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = get("RELAY_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid RELAY_BIND_ADDR: {}", e))?;

        let max_file_size = parse_or("RELAY_MAX_FILE_SIZE", get("RELAY_MAX_FILE_SIZE"), defaults.max_file_size)?;
        let max_request_size = parse_or("RELAY_MAX_REQUEST_SIZE", get("RELAY_MAX_REQUEST_SIZE"), defaults.max_request_size)?;
        let upload_concurrency = parse_or("RELAY_UPLOAD_CONCURRENCY", get("RELAY_UPLOAD_CONCURRENCY"), defaults.upload_concurrency)?;
        let timeout_secs = parse_or("RELAY_HTTP_TIMEOUT_SECS", get("RELAY_HTTP_TIMEOUT_SECS"), DEFAULT_HTTP_TIMEOUT_SECS)?;

        if max_file_size == 0 {
            return Err("RELAY_MAX_FILE_SIZE must be greater than zero".to_string());
        }
        if upload_concurrency == 0 {
            return Err("RELAY_UPLOAD_CONCURRENCY must be at least 1".to_string());
        }

        let log_format = match get("RELAY_LOG_FORMAT") {
            Some(value) => LogFormat::parse(&value)?,
            None => defaults.log_format,
        };

        let drive_upload_base = get("RELAY_DRIVE_UPLOAD_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or(defaults.drive_upload_base);

        Ok(Self {
            bind_addr,
            max_file_size,
            max_request_size,
            temp_dir: get("RELAY_TEMP_DIR").map(PathBuf::from).unwrap_or(defaults.temp_dir),
            upload_concurrency,
            drive_upload_base,
            http_timeout: Duration::from_secs(timeout_secs),
            log_format,
            log_dir: get("RELAY_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| format!("Invalid {}: {}", key, e)),
        None => Ok(default),
    }
}
