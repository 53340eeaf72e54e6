//! Process configuration, read once at start-up.
//!
//! Every setting comes from the environment (a `.env` file is loaded first when present).
//! The resulting [`AppConfig`] is shared read-only with the handlers through
//! [`AppState`], so no component reaches for `std::env` on its own.

use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_SHEET_RANGE: &str = "Sheet1!A:P";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// Where service-account credentials may be found, in precedence order.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    /// Raw JSON key taken from `GOOGLE_CREDENTIALS_JSON`.
    pub inline_json: Option<String>,
    /// Key file checked on every write when no inline key resolves.
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub public_dir: PathBuf,
    pub fallback_csv: PathBuf,
    pub spreadsheet_id: Option<String>,
    pub sheet_range: String,
    pub sheets_api_base: String,
    pub credentials: CredentialSources,
    pub remote_timeout: Duration,
    pub verify_image_content: bool,
    /// Overrides the scheme and host used when building image URLs.
    pub public_base_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from("uploads"),
            public_dir: PathBuf::from("public"),
            fallback_csv: PathBuf::from("data_backup.csv"),
            spreadsheet_id: None,
            sheet_range: DEFAULT_SHEET_RANGE.to_string(),
            sheets_api_base: DEFAULT_SHEETS_API_BASE.to_string(),
            credentials: CredentialSources {
                inline_json: None,
                file: PathBuf::from("service-account.json"),
            },
            remote_timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            verify_image_content: true,
            public_base_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("PORT", &port))?;
        }
        if let Some(dir) = get("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("PUBLIC_DIR") {
            config.public_dir = PathBuf::from(dir);
        }
        if let Some(path) = get("FALLBACK_CSV") {
            config.fallback_csv = PathBuf::from(path);
        }
        config.spreadsheet_id = get("SPREADSHEET_ID").map(|id| id.trim().to_string());
        if let Some(range) = get("SHEET_RANGE") {
            config.sheet_range = range;
        }
        if let Some(base) = get("SHEETS_API_BASE") {
            config.sheets_api_base = base.trim_end_matches('/').to_string();
        }
        config.credentials.inline_json = get("GOOGLE_CREDENTIALS_JSON");
        if let Some(path) = get("SERVICE_ACCOUNT_FILE") {
            config.credentials.file = PathBuf::from(path);
        }
        if let Some(secs) = get("REMOTE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("REMOTE_TIMEOUT_SECS", &secs))?;
            config.remote_timeout = Duration::from_secs(secs);
        }
        if let Some(flag) = get("VERIFY_IMAGE_CONTENT") {
            config.verify_image_content = parse_flag(&flag)
                .ok_or_else(|| ConfigError::invalid("VERIFY_IMAGE_CONTENT", &flag))?;
        }
        config.public_base_url =
            get("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_string());

        Ok(config)
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// State shared with every worker.
#[derive(Clone)]
pub struct AppState {
    pub config: std::sync::Arc<AppConfig>,
    /// Client for the spreadsheet and token endpoints, carrying the remote timeout.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.remote_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            config: std::sync::Arc::new(config),
            http,
        })
    }
}
