//! Configuration loaded from a TOML file, with environment overrides.
//!
//! ```toml
//! [service]
//! url = "https://frost.example.org/FROST-Server/v1.1"
//! username = "reader"
//! password = "secret"
//!
//! [http]
//! timeout_secs = 30
//! pool_max_idle = 20
//! max_retries = 3
//! backoff_factor = 0.3
//!
//! [query]
//! max_pages = 50
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{FrostaError, Result};

pub const ENV_URL: &str = "FROSTA_URL";
pub const ENV_USERNAME: &str = "FROSTA_USERNAME";
pub const ENV_PASSWORD: &str = "FROSTA_PASSWORD";

/// Upper bound accepted for `http.max_retries`.
pub const MAX_RETRIES: u32 = 10;
/// Upper bound accepted for `http.backoff_factor`, in seconds.
pub const MAX_BACKOFF_FACTOR: f64 = 60.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub http: HttpConfig,
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service root, e.g. `https://host/FROST-Server/v1.1`.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Idle connections kept per host.
    pub pool_max_idle: usize,
    /// Retries for idempotent requests on transient failures.
    pub max_retries: u32,
    /// Seconds; the n-th retry waits `backoff_factor * 2^n`.
    pub backoff_factor: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            pool_max_idle: 20,
            max_retries: 3,
            backoff_factor: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Stop following `@iot.nextLink` after this many pages. Unset means
    /// follow until the service stops paging.
    pub max_pages: Option<usize>,
}

impl Config {
    /// Read a TOML file, apply environment overrides, then validate.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let text = fs::read_to_string(path)?;
        let mut config = Self::parse(&text)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config = Self::parse(text)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| FrostaError::Config(e.to_string()))
    }

    /// `FROSTA_URL`, `FROSTA_USERNAME` and `FROSTA_PASSWORD` win over file values.
    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var(ENV_URL) {
            self.service.url = url;
        }
        if let Ok(username) = env::var(ENV_USERNAME) {
            self.service.username = Some(username);
        }
        if let Ok(password) = env::var(ENV_PASSWORD) {
            self.service.password = Some(password);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let factor = self.http.backoff_factor;
        if !(0.0..=MAX_BACKOFF_FACTOR).contains(&factor) {
            return Err(FrostaError::Config(format!(
                "http.backoff_factor must be between 0 and {}, got {}",
                MAX_BACKOFF_FACTOR, factor
            )));
        }
        if self.http.max_retries > MAX_RETRIES {
            return Err(FrostaError::Config(format!(
                "http.max_retries must be at most {}, got {}",
                MAX_RETRIES, self.http.max_retries
            )));
        }
        if self.query.max_pages == Some(0) {
            return Err(FrostaError::Config(
                "query.max_pages must be at least 1".to_string(),
            ));
        }
        if !self.service.url.is_empty()
            && !(self.service.url.starts_with("http://") || self.service.url.starts_with("https://"))
        {
            return Err(FrostaError::Config(format!(
                "service.url must be an http(s) URL, got '{}'",
                self.service.url
            )));
        }
        Ok(())
    }

    /// The service URL, or an error if none is configured.
    pub fn service_url(&self) -> Result<&str> {
        if self.service.url.is_empty() {
            return Err(FrostaError::Config(format!(
                "no service url configured (set service.url or {})",
                ENV_URL
            )));
        }
        Ok(self.service.url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    /// Environment variables are process-wide; tests that read or set them
    /// take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.http, HttpConfig::default());
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.query.max_pages, None);
        assert!(config.service_url().is_err());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml_str(
            r#"
[service]
url = "https://frost.example.org/v1.1/"

[http]
max_retries = 5
"#,
        )
        .unwrap();
        assert_eq!(config.service_url().unwrap(), "https://frost.example.org/v1.1");
        assert_eq!(config.http.max_retries, 5);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            Config::from_toml_str("[service]\nurl = \"ftp://x\""),
            Err(FrostaError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[http]\nbackoff_factor = -1.0"),
            Err(FrostaError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[query]\nmax_pages = 0"),
            Err(FrostaError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[http\n"),
            Err(FrostaError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frosta.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[query]\nmax_pages = 4").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.query.max_pages, Some(4));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, FrostaError::Io(_)));
    }

    #[test]
    fn test_env_overrides_file_values_and_is_validated() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frosta.toml");
        fs::write(
            &path,
            "[service]\nurl = \"https://file.example.org\"\nusername = \"file-user\"\n",
        )
        .unwrap();

        env::set_var(ENV_URL, "https://env.example.org/v1.1/");
        env::set_var(ENV_USERNAME, "env-user");
        let overridden = Config::load(&path);

        env::set_var(ENV_URL, "ftp://env.example.org");
        let rejected = Config::load(&path);

        env::remove_var(ENV_URL);
        env::remove_var(ENV_USERNAME);
        let from_file = Config::load(&path);

        let overridden = overridden.unwrap();
        assert_eq!(overridden.service_url().unwrap(), "https://env.example.org/v1.1");
        assert_eq!(overridden.service.username.as_deref(), Some("env-user"));
        assert!(matches!(rejected, Err(FrostaError::Config(_))));
        assert_eq!(
            from_file.unwrap().service_url().unwrap(),
            "https://file.example.org"
        );
    }

    #[test]
    fn test_retry_settings_have_upper_bounds() {
        assert!(Config::from_toml_str("[http]\nmax_retries = 10\nbackoff_factor = 60.0").is_ok());
        assert!(matches!(
            Config::from_toml_str("[http]\nmax_retries = 11"),
            Err(FrostaError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[http]\nbackoff_factor = 60.5"),
            Err(FrostaError::Config(_))
        ));
    }
}
