use std::path::PathBuf;

/// Client configuration
///
/// # Environment variables
///
/// All settings can be overridden through environment variables:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/turno | Working directory (queue database, logs) |
/// | REMOTE_URL | http://localhost:3000 | Base URL of the remote service |
/// | DEVICE_ID | generated per boot | Identifies this device in sync batches |
/// | OPERATOR_ID | 1 | Operator this device is bound to |
/// | REQUEST_TIMEOUT_MS | 30000 | HTTP request timeout (ms) |
/// | SYNC_ERROR_DISPLAY_MS | 8000 | How long a transient sync error stays visible |
/// | ENVIRONMENT | development | development \| staging \| production |
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory, holds the queue database and log files
    pub work_dir: String,
    /// Base URL of the remote service
    pub remote_url: String,
    /// Device identity stamped on sync batches
    pub device_id: String,
    /// Operator this device is bound to (one operator, one device)
    pub operator_id: i64,
    /// HTTP request timeout (milliseconds)
    pub request_timeout_ms: u64,
    /// Display window for transient transport errors (milliseconds)
    pub sync_error_display_ms: u64,
    /// Runtime environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset. Reads `.env` first when present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/turno".into()),
            remote_url: std::env::var("REMOTE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            device_id: std::env::var("DEVICE_ID")
                .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string()),
            operator_id: std::env::var("OPERATOR_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30000),
            sync_error_display_ms: std::env::var("SYNC_ERROR_DISPLAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the paths and remote URL, common in tests
    pub fn with_overrides(work_dir: impl Into<String>, remote_url: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.remote_url = remote_url.into();
        config
    }

    /// Path of the durable queue database
    pub fn queue_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("queue.redb")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
