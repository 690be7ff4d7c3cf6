//! Configuration management for the relay agent.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default remote API base URL (can be set at compile time via CUSTOMS_RELAY_DEFAULT_URL).
pub const DEFAULT_URL: &str = match option_env!("CUSTOMS_RELAY_DEFAULT_URL") {
    Some(url) => url,
    None => "",
};

#[cfg(windows)]
const PLATFORM_DATA_PATH: &str = "C:\\ImpPath";
#[cfg(not(windows))]
const PLATFORM_DATA_PATH: &str = "/var/lib/customs-relay/ImpPath";

/// Default exchange directory of the single-window client
/// (can be set at compile time via CUSTOMS_RELAY_DEFAULT_DATA_PATH).
pub const DEFAULT_DATA_PATH: &str = match option_env!("CUSTOMS_RELAY_DEFAULT_DATA_PATH") {
    Some(path) => path,
    None => PLATFORM_DATA_PATH,
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default polling interval for the remote command list, in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Default HTTP request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default notification verbosity (3 = informational tips and above).
pub const DEFAULT_DEBUG_LEVEL: u8 = 3;

/// Highest notification verbosity; also enables HTTP request/response dumps.
pub const MAX_DEBUG_LEVEL: u8 = 4;

const ENV_LOG_LEVEL: &str = "CUSTOMS_RELAY_LOG_LEVEL";
const ENV_PASSWORD: &str = "CUSTOMS_RELAY_PASSWORD";

/// Outcome of a successful [`Config::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Values are usable as they are.
    Ready,
    /// A password was supplied; the credentials must be checked against the
    /// server (and the session identifiers refreshed) before saving.
    NeedsAuth,
}

/// Relay agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Base URL of the remote command/data API.
    #[serde(default = "default_url")]
    pub url: String,
    /// Root of the local document-exchange directory.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    /// Seconds between two polls of the remote command list.
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Notification verbosity, 0 (silent) to 4 (debug + HTTP dumps).
    #[serde(default = "default_debug")]
    pub debug: u8,
    /// Login user name.
    #[serde(default)]
    pub uname: String,
    /// Login password. Never written to disk.
    #[serde(skip)]
    pub pwd: String,
    /// Enterprise id assigned by the server at login.
    #[serde(default)]
    pub ecid: String,
    /// User id assigned by the server at login.
    #[serde(default)]
    pub uid: String,
    /// User name as it was when the configuration was loaded.
    #[serde(skip)]
    loaded_uname: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_debug() -> u8 {
    DEFAULT_DEBUG_LEVEL
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            url: default_url(),
            data_path: default_data_path(),
            interval: DEFAULT_INTERVAL_SECS,
            timeout: DEFAULT_TIMEOUT_SECS,
            debug: DEFAULT_DEBUG_LEVEL,
            uname: String::new(),
            pwd: String::new(),
            ecid: String::new(),
            uid: String::new(),
            loaded_uname: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&content)?;
        config.normalize();
        config.loaded_uname = config.uname.clone();
        Ok(config)
    }

    /// Save configuration to the config file. The password is not persisted.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Check that the configuration can drive the relay.
    ///
    /// A non-empty password means the credentials still have to be verified
    /// against the server, reported as [`Validation::NeedsAuth`].
    pub fn validate(&self) -> CoreResult<Validation> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(CoreError::Config(
                "server URL must start with http:// or https://".to_string(),
            ));
        }
        self.base_url()?;

        if self.data_path.as_os_str().is_empty() {
            return Err(CoreError::Config("data path must not be empty".to_string()));
        }
        if self.interval == 0 {
            return Err(CoreError::Config(
                "polling interval must be at least one second".to_string(),
            ));
        }
        if self.uname.is_empty() {
            return Err(CoreError::Config("user name must not be empty".to_string()));
        }
        if self.pwd.is_empty() && self.uname != self.loaded_uname {
            return Err(CoreError::Config(
                "password is required after changing the user name".to_string(),
            ));
        }

        if self.pwd.is_empty() {
            Ok(Validation::Ready)
        } else {
            Ok(Validation::NeedsAuth)
        }
    }

    /// Parsed base URL of the remote API.
    pub fn base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.url).map_err(CoreError::from)
    }

    /// Interval between two polls of the remote command list.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }

    /// Whether identifiers from a previous login are available.
    pub fn has_session(&self) -> bool {
        !self.ecid.is_empty() && !self.uid.is_empty()
    }

    /// Record the identifiers returned by a successful login.
    pub fn set_session(&mut self, ecid: impl Into<String>, uid: impl Into<String>) {
        self.ecid = ecid.into();
        self.uid = uid.into();
        self.loaded_uname = self.uname.clone();
    }

    /// Replace zero values with their defaults.
    fn normalize(&mut self) {
        if self.interval == 0 {
            self.interval = DEFAULT_INTERVAL_SECS;
        }
        if self.timeout == 0 {
            self.timeout = DEFAULT_TIMEOUT_SECS;
        }
        if self.data_path.as_os_str().is_empty() {
            self.data_path = default_data_path();
        }
        self.debug = self.debug.min(MAX_DEBUG_LEVEL);
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(log_level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.log_level = log_level.trim().to_string();
        }
        if let Some(pwd) = lookup(ENV_PASSWORD).filter(|v| !v.is_empty()) {
            self.pwd = pwd;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn valid_config() -> Config {
        Config {
            url: "https://relay.example.com/".to_string(),
            data_path: PathBuf::from("/tmp/ImpPath"),
            uname: "operator".to_string(),
            loaded_uname: "operator".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.interval, 300);
        assert_eq!(config.timeout, 10);
        assert_eq!(config.debug, DEFAULT_DEBUG_LEVEL);
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert!(!config.has_session());
    }

    #[test]
    fn test_config_load_from_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let config_json = r#"{
            "url": "https://relay.example.com/",
            "uname": "operator",
            "interval": 0,
            "ecid": "E1",
            "uid": "100"
        }"#;
        std::fs::write(&config_path, config_json).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.url, "https://relay.example.com/");
        assert_eq!(config.interval, DEFAULT_INTERVAL_SECS);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECS);
        assert!(config.has_session());
    }

    #[test]
    fn test_config_save_and_load_roundtrip_skips_password() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = valid_config();
        config.pwd = "secret".to_string();
        config.interval = 60;
        config.set_session("E1", "100");
        config.save(&paths).unwrap();

        let raw = std::fs::read_to_string(paths.config_file()).unwrap();
        assert!(!raw.contains("secret"));
        assert!(!raw.contains("pwd"));

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded.interval, 60);
        assert_eq!(loaded.ecid, "E1");
        assert_eq!(loaded.uid, "100");
        assert!(loaded.pwd.is_empty());
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.interval, DEFAULT_INTERVAL_SECS);
        assert_eq!(config.url, DEFAULT_URL);
    }

    #[test]
    fn test_validate_ready_without_password() {
        assert_eq!(valid_config().validate().unwrap(), Validation::Ready);
    }

    #[test]
    fn test_validate_needs_auth_with_password() {
        let mut config = valid_config();
        config.pwd = "secret".to_string();
        assert_eq!(config.validate().unwrap(), Validation::NeedsAuth);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = valid_config();
        config.url = "ftp://relay.example.com".to_string();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        config.url = "https://".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_user() {
        let mut config = valid_config();
        config.uname.clear();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_validate_requires_password_after_user_change() {
        let mut config = valid_config();
        config.uname = "someone-else".to_string();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        config.pwd = "secret".to_string();
        assert_eq!(config.validate().unwrap(), Validation::NeedsAuth);
    }

    #[test]
    fn test_set_session_accepts_new_user_name() {
        let mut config = valid_config();
        config.uname = "someone-else".to_string();
        config.set_session("E2", "7");
        assert_eq!(config.validate().unwrap(), Validation::Ready);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|name| match name {
            ENV_LOG_LEVEL => Some(" debug ".to_string()),
            ENV_PASSWORD => Some("from-env".to_string()),
            _ => None,
        });
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.pwd, "from-env");
    }

    #[test]
    fn test_env_overrides_ignore_empty_values() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some(String::new()));
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.pwd.is_empty());
    }

    #[test]
    fn test_durations_never_zero() {
        let mut config = Config::default();
        config.interval = 0;
        config.timeout = 0;
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
