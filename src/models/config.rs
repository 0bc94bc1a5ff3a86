//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Vendor API and HTTP behavior settings
    #[serde(default)]
    pub vendor: VendorConfig,

    /// Input and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or `None` if the file does not exist.
    ///
    /// An unreadable or malformed file is an error, never a silent fallback.
    pub fn load_if_present(path: impl AsRef<Path>) -> Result<Option<Self>> {
        match Self::load(path) {
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            loaded => loaded.map(Some),
        }
    }

    /// Apply the process environment (`token`, `HTTP_PROXY`) on top of the file values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a key lookup.
    ///
    /// The token comes from `token`, then from `paths.token_file` when the
    /// configured token is still empty.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("token").filter(|t| !t.trim().is_empty()) {
            self.vendor.token = token.trim().to_string();
        } else if self.vendor.token.is_empty() {
            if let Ok(token) = fs::read_to_string(&self.paths.token_file) {
                self.vendor.token = token.trim().to_string();
            }
        }

        if let Some(proxy) = lookup("HTTP_PROXY").filter(|p| !p.trim().is_empty()) {
            self.vendor.proxy = Some(proxy.trim().to_string());
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.vendor.user_agent.trim().is_empty() {
            return Err(AppError::config("vendor.user_agent is empty"));
        }
        if self.vendor.timeout_secs == 0 {
            return Err(AppError::config("vendor.timeout_secs must be > 0"));
        }
        if self.vendor.max_attempts == 0 {
            return Err(AppError::config("vendor.max_attempts must be > 0"));
        }
        if self.vendor.max_concurrent == 0 {
            return Err(AppError::config("vendor.max_concurrent must be > 0"));
        }
        Url::parse(self.vendor.base_url())?;
        if let Some(proxy) = &self.vendor.proxy {
            Url::parse(proxy)?;
        }
        if self.paths.stations_file.trim().is_empty() {
            return Err(AppError::config("paths.stations_file is empty"));
        }
        Ok(())
    }
}

/// Vendor API generation, which decides endpoints and payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiGeneration {
    /// JSON list and JSON detail, token header
    #[default]
    Current,
    /// JSON list and HTML detail page, session cookie
    Legacy,
}

impl ApiGeneration {
    pub fn default_base_url(self) -> &'static str {
        match self {
            ApiGeneration::Current => "https://wemp.issks.com",
            ApiGeneration::Legacy => "https://api.issks.com",
        }
    }
}

/// Vendor API and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Which API generation to talk to
    #[serde(default)]
    pub generation: ApiGeneration,

    /// Override for the generation's base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Value of the `token` header
    #[serde(default)]
    pub token: String,

    /// Session cookie (e.g. `JSESSIONID=...`), legacy API only
    #[serde(default)]
    pub session_cookie: Option<String>,

    /// HTTP proxy URL
    #[serde(default)]
    pub proxy: Option<String>,

    /// Skip TLS certificate validation (the vendor chain is invalid)
    #[serde(default = "defaults::accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts per request, including the first
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Maximum concurrent requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl VendorConfig {
    /// Effective base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.generation.default_base_url())
            .trim_end_matches('/')
    }
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            generation: ApiGeneration::default(),
            base_url: None,
            user_agent: defaults::user_agent(),
            token: String::new(),
            session_cookie: None,
            proxy: None,
            accept_invalid_certs: defaults::accept_invalid_certs(),
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Station directory (JSON array)
    #[serde(default = "defaults::stations_file")]
    pub stations_file: String,

    /// Outlet number cache; disabled when absent
    #[serde(default)]
    pub outlet_cache: Option<String>,

    /// File holding the token when the environment does not
    #[serde(default = "defaults::token_file")]
    pub token_file: String,

    /// Where the report and snapshots are written
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            stations_file: defaults::stations_file(),
            outlet_cache: None,
            token_file: defaults::token_file(),
            output_dir: defaults::output_dir(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Vendor defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/81.0.4044.138 Safari/537.36 NetType/WIFI MicroMessenger/7.0.20.1781(0x6700143B) \
         WindowsWechat(0x6307061d)"
            .into()
    }
    pub fn accept_invalid_certs() -> bool {
        true
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn max_concurrent() -> usize {
        16
    }

    // Path defaults
    pub fn stations_file() -> String {
        "stations.json".into()
    }
    pub fn token_file() -> String {
        "token.json".into()
    }
    pub fn output_dir() -> String {
        "build".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vendor.max_attempts, 3);
        assert!(config.vendor.accept_invalid_certs);
        assert_eq!(config.vendor.base_url(), "https://wemp.issks.com");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [vendor]
            generation = "legacy"
            base_url = "http://localhost:8080/"
            session_cookie = "JSESSIONID=abc"

            [paths]
            outlet_cache = "cache/outlets.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.vendor.generation, ApiGeneration::Legacy);
        assert_eq!(config.vendor.base_url(), "http://localhost:8080");
        assert_eq!(config.vendor.timeout_secs, 30);
        assert_eq!(config.paths.stations_file, "stations.json");
        assert_eq!(config.paths.outlet_cache.as_deref(), Some("cache/outlets.json"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.vendor.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.vendor.proxy = Some("not a url".into());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.vendor.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "token" => Some(" abc123 \n".to_string()),
            "HTTP_PROXY" => Some("http://127.0.0.1:7890".to_string()),
            _ => None,
        });
        assert_eq!(config.vendor.token, "abc123");
        assert_eq!(config.vendor.proxy.as_deref(), Some("http://127.0.0.1:7890"));
    }

    #[test]
    fn test_token_file_fallback() {
        let dir = TempDir::new().unwrap();
        let token_path = dir.path().join("token.json");
        fs::write(&token_path, "from-file\n").unwrap();

        let mut config = Config::default();
        config.paths.token_file = token_path.to_string_lossy().into_owned();
        config.apply_overrides(|_| None);

        assert_eq!(config.vendor.token, "from-file");
        assert_eq!(config.vendor.proxy, None);
    }

    #[test]
    fn test_load_if_present_on_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_if_present(dir.path().join("missing.toml")).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_load_if_present_rejects_malformed_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[vendor\nbroken").unwrap();

        let err = Config::load_if_present(&path).unwrap_err();
        assert!(matches!(err, AppError::Toml(_)));
    }

    #[test]
    fn test_load_if_present_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chargewatch.toml");
        fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let config = Config::load_if_present(&path).unwrap().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.vendor.max_attempts, 3);
    }
}
