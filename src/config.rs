/*!
 * Configuration support for the BloomAPI client
 *
 * A `BloomConfig` is handed to the client when it is constructed. For scripts
 * that prefer ambient setup, a process-wide configuration can be installed
 * once with `set_global_config` and is snapshotted by `BloomClient::new`.
 */

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use serde::{Deserialize, Serialize};

use crate::{BloomError, Result};

/// Public BloomAPI host
pub const DEFAULT_BASE_URL: &str = "http://www.bloomapi.com";

/// Prefix for configuration environment variables (`BLOOM_API_KEY`, ...)
pub const ENV_PREFIX: &str = "BLOOM";

/// Largest page size the search endpoints accept
pub const MAX_LIMIT: u32 = 100;

/// Client configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct BloomConfig {
    /// Secret key appended to every request as `secret`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Scheme and host requests are sent to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User agent sent with each request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Page size used by `BloomClient::search`
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
            default_limit: default_limit(),
        }
    }
}

// The secret must never end up in logs.
impl fmt::Debug for BloomConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("user_agent", &self.user_agent)
            .field("default_limit", &self.default_limit)
            .finish()
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("bloom-api-rust/{}", env!("CARGO_PKG_VERSION"))
}

fn default_limit() -> u32 {
    20
}

fn configuration_error(message: String, suggestion: Option<&str>) -> BloomError {
    BloomError::Configuration {
        message,
        suggestion: suggestion.map(str::to_string),
    }
}

impl BloomConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a secret key is configured (it is sent even if empty)
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Check that the configuration can be used to build a client
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(configuration_error(
                format!("base_url '{}' is not an http(s) URL", self.base_url),
                Some("Use a value such as 'http://www.bloomapi.com'"),
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(configuration_error(
                "timeout_seconds must be greater than zero".to_string(),
                None,
            ));
        }

        if self.default_limit == 0 || self.default_limit > MAX_LIMIT {
            return Err(configuration_error(
                format!("default_limit must be between 1 and {}, got {}", MAX_LIMIT, self.default_limit),
                None,
            ));
        }

        Ok(())
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `BLOOM_API_KEY`: secret key
    /// - `BLOOM_BASE_URL`: scheme and host, e.g. `http://www.bloomapi.com`
    /// - `BLOOM_TIMEOUT_SECONDS`: number
    /// - `BLOOM_USER_AGENT`: string
    /// - `BLOOM_DEFAULT_LIMIT`: number between 1 and 100
    pub fn from_env() -> Result<Self> {
        Self::load_layered(None)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| configuration_error(
                format!("Failed to parse config file: {}", e),
                Some("Check that the file is valid TOML format"),
            ))?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| configuration_error(format!("Failed to serialize config: {}", e), None))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/bloom-api/config.toml` on Linux,
    /// `~/Library/Application Support/bloom-api/config.toml` on macOS
    /// or `%APPDATA%\bloom-api\config\config.toml` on Windows
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "bloom-api")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Merge built-in defaults, an optional TOML file and the environment
    ///
    /// Later sources win: environment variables override the file, which
    /// overrides the defaults. A missing file is not an error.
    pub fn load_layered(path: Option<&Path>) -> Result<Self> {
        let defaults = ::config::Config::try_from(&Self::default())
            .map_err(|e| configuration_error(format!("Failed to prepare defaults: {}", e), None))?;

        let mut builder = ::config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(::config::Environment::with_prefix(ENV_PREFIX));

        builder
            .build()
            .and_then(|merged| merged.try_deserialize::<Self>())
            .map_err(|e| configuration_error(
                format!("Failed to load configuration: {}", e),
                Some("Check the config file and BLOOM_* environment variables"),
            ))
    }

    /// Load configuration from the default file location and the environment
    ///
    /// Falls back to built-in defaults if either source cannot be read.
    pub fn load() -> Self {
        let path = Self::default_config_path();
        match Self::load_layered(path.as_deref()) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to default configuration");
                Self::default()
            }
        }
    }
}

// Global configuration support
lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: RwLock<Option<BloomConfig>> = RwLock::new(None);
}

/// Set the global configuration
pub fn set_global_config(config: BloomConfig) {
    *GLOBAL_CONFIG.write().unwrap_or_else(PoisonError::into_inner) = Some(config);
}

/// Get the global configuration (or the loaded default if not set)
pub fn global_config() -> BloomConfig {
    GLOBAL_CONFIG.read().unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .cloned()
        .unwrap_or_else(BloomConfig::load)
}

/// Clear the global configuration
pub fn clear_global_config() {
    *GLOBAL_CONFIG.write().unwrap_or_else(PoisonError::into_inner) = None;
}

/// Set the secret key on the global configuration
pub fn set_api_key(api_key: impl Into<String>) {
    let mut guard = GLOBAL_CONFIG.write().unwrap_or_else(PoisonError::into_inner);
    guard.get_or_insert_with(BloomConfig::load).api_key = Some(api_key.into());
}

/// Secret key of the global configuration, if one is set
pub fn api_key() -> Option<String> {
    GLOBAL_CONFIG.read().unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .and_then(|config| config.api_key.clone())
}

/// Builder for customizing configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: BloomConfig,
}

impl ConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self {
            config: BloomConfig::default(),
        }
    }

    /// Set the secret key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.timeout_seconds = seconds;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set the default page size
    pub fn default_limit(mut self, limit: u32) -> Self {
        self.config.default_limit = limit;
        self
    }

    /// Build the configuration
    pub fn build(self) -> BloomConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests that read or write BLOOM_* variables hold this lock
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes the listed variables when dropped
    struct EnvVars(&'static [&'static str]);

    impl Drop for EnvVars {
        fn drop(&mut self) {
            for name in self.0 {
                std::env::remove_var(name);
            }
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = BloomConfig::default();
        assert_eq!(config.api_key, None);
        assert_eq!(config.base_url, "http://www.bloomapi.com");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.default_limit, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .api_key("s3cret")
            .base_url("https://bloom.example.org")
            .timeout_seconds(5)
            .default_limit(100)
            .build();

        assert!(config.has_api_key());
        assert_eq!(config.base_url, "https://bloom.example.org");
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.default_limit, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ConfigBuilder::new().base_url("www.bloomapi.com").build();
        assert!(matches!(config.validate(), Err(BloomError::Configuration { .. })));

        let config = ConfigBuilder::new().default_limit(101).build();
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new().timeout_seconds(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ConfigBuilder::new().api_key("top-secret-key").build();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("top-secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = ConfigBuilder::new()
            .api_key("abc123")
            .timeout_seconds(12)
            .build();
        config.save(&path).unwrap();

        let loaded = BloomConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let _env = lock_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_limit = 50\n").unwrap();

        let loaded = BloomConfig::from_file(&path).unwrap();
        assert_eq!(loaded.default_limit, 50);
        assert_eq!(loaded.base_url, DEFAULT_BASE_URL);

        let layered = BloomConfig::load_layered(Some(&path)).unwrap();
        assert_eq!(layered.default_limit, 50);
        assert_eq!(layered.timeout_seconds, 30);
    }

    #[test]
    fn test_environment_overrides_file() {
        let _env = lock_env();
        let _vars = EnvVars(&["BLOOM_API_KEY", "BLOOM_DEFAULT_LIMIT", "BLOOM_TIMEOUT_SECONDS"]);
        std::env::set_var("BLOOM_API_KEY", "12345");
        std::env::set_var("BLOOM_DEFAULT_LIMIT", "50");
        std::env::set_var("BLOOM_TIMEOUT_SECONDS", "7");

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_limit = 10\nuser_agent = \"from-file\"\n").unwrap();

        let layered = BloomConfig::load_layered(Some(&path)).unwrap();
        assert_eq!(layered.api_key.as_deref(), Some("12345"));
        assert_eq!(layered.default_limit, 50);
        assert_eq!(layered.timeout_seconds, 7);
        assert_eq!(layered.user_agent, "from-file");
        assert_eq!(layered.base_url, DEFAULT_BASE_URL);

        let from_env = BloomConfig::from_env().unwrap();
        assert_eq!(from_env.api_key.as_deref(), Some("12345"));
        assert_eq!(from_env.default_limit, 50);
        assert_eq!(from_env.timeout_seconds, 7);
    }

    #[test]
    fn test_empty_api_key_counts_as_configured() {
        let config = ConfigBuilder::new().api_key("").build();
        assert!(config.has_api_key());
        assert!(!BloomConfig::default().has_api_key());
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_limit = [").unwrap();

        let err = BloomConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, BloomError::Configuration { suggestion: Some(_), .. }));
    }

    #[test]
    fn test_global_api_key() {
        set_global_config(ConfigBuilder::new().build());
        assert_eq!(api_key(), None);

        set_api_key("global-key");
        assert_eq!(api_key().as_deref(), Some("global-key"));
        assert_eq!(global_config().api_key.as_deref(), Some("global-key"));

        clear_global_config();
        assert_eq!(api_key(), None);
    }
}
