//! Application configuration for regfetch.
//!
//! User config lives at `~/.regfetch/regfetch.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{RegfetchError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "regfetch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".regfetch";

// ---------------------------------------------------------------------------
// Config structs (matching regfetch.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Remote service endpoints.
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Root of the cache tree.
    #[serde(default = "default_root_dir")]
    pub root_dir: String,

    /// Pause before every live batch fetch.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Academic years walked back by `--schedules --archive`.
    #[serde(default = "default_archive_years")]
    pub archive_years: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            request_delay_ms: default_request_delay(),
            archive_years: default_archive_years(),
        }
    }
}

fn default_root_dir() -> String {
    "/var/www".into()
}
fn default_request_delay() -> u64 {
    10_000
}
fn default_archive_years() -> u32 {
    3
}

/// `[endpoints]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Degree-audit script endpoint.
    #[serde(default = "default_degreeworks_url")]
    pub degreeworks_url: String,

    /// Schedule of classes.
    #[serde(default = "default_websoc_url")]
    pub websoc_url: String,

    /// Prerequisite listing.
    #[serde(default = "default_prereqs_url")]
    pub prereqs_url: String,

    /// Course catalogue department index.
    #[serde(default = "default_catalogue_url")]
    pub catalogue_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            degreeworks_url: default_degreeworks_url(),
            websoc_url: default_websoc_url(),
            prereqs_url: default_prereqs_url(),
            catalogue_url: default_catalogue_url(),
        }
    }
}

fn default_degreeworks_url() -> String {
    "https://www.reg.uci.edu/dgw/IRISLink.cgi".into()
}
fn default_websoc_url() -> String {
    "https://www.reg.uci.edu/perl/WebSoc".into()
}
fn default_prereqs_url() -> String {
    "https://www.reg.uci.edu/cob/prrqcgi".into()
}
fn default_catalogue_url() -> String {
    "http://catalogue.uci.edu/allcourses/".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout; 0 disables it.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Fetch config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration, merged from config file and CLI flags.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Root of the cache tree.
    pub root_dir: PathBuf,
    /// Pause before every live batch fetch.
    pub request_delay: Duration,
    /// Academic years walked back in archive mode.
    pub archive_years: u32,
    /// Remote service endpoints.
    pub endpoints: EndpointsConfig,
    /// Per-request timeout; zero disables it.
    pub timeout: Duration,
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            root_dir: expand_home(&config.defaults.root_dir),
            request_delay: Duration::from_millis(config.defaults.request_delay_ms),
            archive_years: config.defaults.archive_years,
            endpoints: config.endpoints.clone(),
            timeout: Duration::from_secs(config.http.timeout_secs),
        }
    }
}

impl FetchConfig {
    /// Check that every endpoint parses as an http(s) URL and the archive span is sane.
    pub fn validate(&self) -> Result<()> {
        let endpoints = [
            ("degreeworks_url", &self.endpoints.degreeworks_url),
            ("websoc_url", &self.endpoints.websoc_url),
            ("prereqs_url", &self.endpoints.prereqs_url),
            ("catalogue_url", &self.endpoints.catalogue_url),
        ];
        for (name, raw) in endpoints {
            let url = Url::parse(raw)
                .map_err(|e| RegfetchError::config(format!("{name} `{raw}` is not a URL: {e}")))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(RegfetchError::config(format!(
                    "{name} `{raw}` must use http or https"
                )));
            }
        }
        if self.archive_years == 0 {
            return Err(RegfetchError::config("archive_years must be at least 1"));
        }
        Ok(())
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.regfetch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RegfetchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.regfetch/regfetch.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RegfetchError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        RegfetchError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| RegfetchError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RegfetchError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RegfetchError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("root_dir"));
        assert!(toml_str.contains("IRISLink.cgi"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.request_delay_ms, 10_000);
        assert_eq!(parsed.defaults.archive_years, 3);
        assert_eq!(parsed.endpoints, EndpointsConfig::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[defaults]
root_dir = "/tmp/registrar-cache"

[endpoints]
websoc_url = "http://localhost:8080/perl/WebSoc"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.root_dir, "/tmp/registrar-cache");
        assert_eq!(config.defaults.request_delay_ms, 10_000);
        assert_eq!(config.endpoints.websoc_url, "http://localhost:8080/perl/WebSoc");
        assert_eq!(config.endpoints.prereqs_url, default_prereqs_url());
    }

    #[test]
    fn fetch_config_from_app_config() {
        let app = AppConfig::default();
        let fetch = FetchConfig::from(&app);
        assert_eq!(fetch.root_dir, PathBuf::from("/var/www"));
        assert_eq!(fetch.request_delay, Duration::from_secs(10));
        assert_eq!(fetch.timeout, Duration::from_secs(30));
        assert!(fetch.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_endpoints() {
        let mut fetch = FetchConfig::from(&AppConfig::default());
        fetch.endpoints.catalogue_url = "not a url".into();
        let err = fetch.validate().unwrap_err();
        assert!(err.to_string().contains("catalogue_url"));

        let mut fetch = FetchConfig::from(&AppConfig::default());
        fetch.endpoints.websoc_url = "ftp://example.com/soc".into();
        assert!(fetch.validate().is_err());

        let mut fetch = FetchConfig::from(&AppConfig::default());
        fetch.archive_years = 0;
        assert!(fetch.validate().is_err());
    }
}
