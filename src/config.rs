use crate::error::{ComicgrepError, Result};
use serde::{Deserialize, Serialize};

/// Top-level application configuration loaded from a TOML file, env vars, or defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings (bind address, timeouts).
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream comic source (base URL, per-request timeout).
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Ingest worker-pool settings.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Admission control for the search endpoints.
    #[serde(default)]
    pub admission: AdmissionConfig,
    /// Administrator credentials and token signing.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Structured logging level and format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP server. Default: `"0.0.0.0"`.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port to listen on. Default: `8080`.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request read timeout in seconds. Default: `15`.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

/// Upstream comic source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the comic archive. Default: `"https://xkcd.com"`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds. Default: `10`.
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

/// Ingest engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Number of concurrent fetch workers. Default: `10`.
    #[serde(default = "default_ingest_concurrency")]
    pub concurrency: usize,
}

/// Admission control for the two search endpoints: `/api/search` sheds
/// excess callers, `/api/isearch` paces them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Maximum concurrent `/api/search` requests. Default: `10`.
    #[serde(default = "default_search_concurrency")]
    pub search_concurrency: usize,
    /// `/api/isearch` requests per second. Default: `2`.
    #[serde(default = "default_search_rate")]
    pub search_rate: usize,
}

/// Administrator credentials and token signing material. All three secrets
/// are env-only by default and required at boot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Administrator login name (`ADMIN_USER`).
    #[serde(default)]
    pub admin_user: Option<String>,
    /// Administrator password (`ADMIN_PASSWORD`).
    #[serde(default)]
    pub admin_password: Option<String>,
    /// HS256 signing secret (`TOKEN_SECRET`).
    #[serde(default)]
    pub token_secret: Option<String>,
    /// Issued-token lifetime in seconds. Default: `7200`.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

/// Structured logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log verbosity filter (e.g. `"info"`, `"debug"`). Default: `"info"`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: `"json"` or `"pretty"`. Default: `"json"`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions — hardcoded defaults only.
// Env var overrides are applied in `apply_env_overrides()`.
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_read_timeout() -> u64 {
    15
}
fn default_base_url() -> String {
    "https://xkcd.com".to_string()
}
fn default_upstream_timeout() -> u64 {
    10
}
fn default_ingest_concurrency() -> usize {
    10
}
fn default_search_concurrency() -> usize {
    10
}
fn default_search_rate() -> usize {
    2
}
fn default_token_ttl() -> u64 {
    7200
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: default_ingest_concurrency(),
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            search_concurrency: default_search_concurrency(),
            search_rate: default_search_rate(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load config from a TOML file, falling back to defaults.
    /// After loading, env var overrides are applied so that:
    /// env var > TOML file > defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p).map_err(|e| {
                    ComicgrepError::Config(format!("failed to read config file {p}: {e}"))
                })?;
                toml::from_str(&content)
                    .map_err(|e| ComicgrepError::Config(format!("failed to parse config: {e}")))?
            }
            None => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides on top of file/default values.
    fn apply_env_overrides(&mut self) {
        // Server
        if let Ok(v) = std::env::var("COMICGREP_HOST") {
            self.server.host = v;
        }
        if let Some(v) = std::env::var("COMICGREP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.server.port = v;
        }
        if let Some(v) = std::env::var("COMICGREP_READ_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.server.read_timeout_secs = v;
        }

        // Upstream
        if let Ok(v) = std::env::var("XKCD_BASE_URL") {
            self.upstream.base_url = v;
        }
        if let Some(v) = std::env::var("XKCD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.upstream.timeout_secs = v;
        }

        // Ingest
        if let Some(v) = std::env::var("UPDATE_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.ingest.concurrency = v;
        }

        // Admission
        if let Some(v) = std::env::var("SEARCH_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.admission.search_concurrency = v;
        }
        if let Some(v) = std::env::var("SEARCH_RATE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.admission.search_rate = v;
        }

        // Auth
        if let Ok(v) = std::env::var("ADMIN_USER") {
            self.auth.admin_user = Some(v);
        }
        if let Ok(v) = std::env::var("ADMIN_PASSWORD") {
            self.auth.admin_password = Some(v);
        }
        if let Ok(v) = std::env::var("TOKEN_SECRET") {
            self.auth.token_secret = Some(v);
        }
        if let Some(v) = std::env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.auth.token_ttl_secs = v;
        }

        // Logging
        if let Ok(v) = std::env::var("COMICGREP_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("COMICGREP_LOG_FORMAT") {
            self.logging.format = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.upstream.base_url, "https://xkcd.com");
        assert_eq!(config.ingest.concurrency, 10);
        assert_eq!(config.admission.search_concurrency, 10);
        assert_eq!(config.admission.search_rate, 2);
        assert_eq!(config.auth.token_ttl_secs, 7200);
        assert!(config.auth.admin_user.is_none());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = Config::load(Some("/nonexistent/comicgrep.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9999

[admission]
search_rate = 7
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str()).unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.admission.search_rate, 7);
        // Untouched sections keep defaults.
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.admission.search_concurrency, 10);
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();
        let result = Config::load(file.path().to_str());
        assert!(matches!(result, Err(ComicgrepError::Config(_))));
    }
}
