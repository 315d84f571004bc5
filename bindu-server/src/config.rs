//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.
//! Capture timings (stability window, poll interval, deadline) are not read
//! from the environment; they come from `bindu_core::WatchTimings`.

use std::net::SocketAddr;
use std::path::PathBuf;

use bindu_core::CaptureSettings;

/// File name the scanner SDK writes its capture to
pub const SCANNER_OUTPUT_FILE: &str = "Fingerprint.bmp";

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 8080)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 1)
    pub body_limit_mb: usize,
    /// Request timeout in seconds (default: 60, must exceed the capture deadline)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Base directory for provisioned folders and uploads (default: ".")
    pub data_dir: PathBuf,
    /// Where the scanner SDK drops its image (default: `<data_dir>/Fingerprint.bmp`)
    pub scanner_output: PathBuf,
    /// Postgres connection string; the in-memory user store is used when unset
    pub database_url: Option<String>,
    /// Database connection pool maximum connections (default: 10)
    pub database_max_connections: u32,
    /// JSON file used to seed the in-memory user store
    pub users_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = PathBuf::from(".");
        Self {
            port: 8080,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 1,
            timeout_secs: 60,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            scanner_output: data_dir.join(SCANNER_OUTPUT_FILE),
            data_dir,
            database_url: None,
            database_max_connections: 10,
            users_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or([127, 0, 0, 1]);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let body_limit_mb = std::env::var("BODY_LIMIT_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        let timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let rate_limit_per_sec = std::env::var("RATE_LIMIT_PER_SEC")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let rate_limit_burst = std::env::var("RATE_LIMIT_BURST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let data_dir = std::env::var("BINDU_DATA_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let scanner_output = std::env::var("BINDU_SCANNER_OUTPUT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(SCANNER_OUTPUT_FILE));

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let users_file = std::env::var("BINDU_USERS_FILE").ok().map(PathBuf::from);

        Self {
            port,
            host,
            allowed_origins,
            body_limit_mb,
            timeout_secs,
            rate_limit_enabled,
            rate_limit_per_sec,
            rate_limit_burst,
            data_dir,
            scanner_output,
            database_url,
            database_max_connections,
            users_file,
        }
    }

    /// Default config rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            scanner_output: data_dir.join(SCANNER_OUTPUT_FILE),
            data_dir,
            ..Self::default()
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Root of the statically served uploads directory
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings::new(&self.scanner_output, self.uploads_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindu_core::CAPTURE_DEADLINE;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert!(config.database_url.is_none());
        assert!(!config.rate_limit_enabled);
        assert_eq!(config.scanner_output, PathBuf::from("./Fingerprint.bmp"));
    }

    #[test]
    fn test_request_timeout_outlasts_capture_deadline() {
        let config = Config::default();
        assert!(config.timeout_secs > CAPTURE_DEADLINE.as_secs());
    }

    #[test]
    fn test_with_data_dir_derives_paths() {
        let config = Config::with_data_dir("/srv/bindu");
        assert_eq!(config.uploads_dir(), PathBuf::from("/srv/bindu/uploads"));
        assert_eq!(
            config.scanner_output,
            PathBuf::from("/srv/bindu/Fingerprint.bmp")
        );

        let settings = config.capture_settings();
        assert_eq!(
            settings.fingerprints_dir(),
            PathBuf::from("/srv/bindu/uploads/fingerprints")
        );
    }
}
