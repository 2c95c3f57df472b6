//! Runtime configuration: where the backend lives, which drivers to run and
//! the simulation parameters, loaded from a JSON file with every field
//! optional.
//!
//! ```json
//! {
//!   "base_url": "http://localhost:3000",
//!   "tokens": ["eyJhbGciOi..."],
//!   "request_timeout_secs": 10,
//!   "timing": { "dwell": { "min_secs": 30, "max_secs": 60 }, "seed": 7 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::params::{ParamsError, SimulationParams};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Comma-separated driver tokens, merged after any from the config file.
pub const TOKENS_ENV_VAR: &str = "SIM_DRIVER_TOKENS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid timing: {0}")]
    Invalid(#[from] ParamsError),

    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("no driver tokens configured (use --token, the config file or SIM_DRIVER_TOKENS)")]
    NoTokens,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub base_url: String,
    pub tokens: Vec<String>,
    pub request_timeout_secs: u64,
    pub timing: SimulationParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            tokens: Vec::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            timing: SimulationParams::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Append tokens, skipping blanks and ones already present.
    pub fn add_tokens<I, T>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for token in tokens {
            let token = token.as_ref().trim();
            if !token.is_empty() && !self.tokens.iter().any(|known| known == token) {
                self.tokens.push(token.to_string());
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.tokens.is_empty() {
            return Err(ConfigError::NoTokens);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::params::DelayRange;

    #[test]
    fn empty_file_yields_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{}}").expect("write");

        let config = SimulationConfig::from_file(file.path()).expect("config");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn file_overrides_selected_fields() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{
                "base_url": "https://buses.example.org",
                "tokens": ["tok-a", "tok-b"],
                "timing": {{ "dwell": {{ "min_secs": 5, "max_secs": 10 }}, "seed": 3 }}
            }}"#
        )
        .expect("write");

        let config = SimulationConfig::from_file(file.path()).expect("config");
        assert_eq!(config.base_url, "https://buses.example.org");
        assert_eq!(config.tokens, vec!["tok-a", "tok-b"]);
        assert_eq!(config.timing.dwell, DelayRange::new(5.0, 10.0));
        assert_eq!(config.timing.travel, DelayRange::new(3.0, 8.0));
        assert_eq!(config.timing.seed, Some(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_and_malformed_files_are_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.json");
        assert!(matches!(
            SimulationConfig::from_file(&missing),
            Err(ConfigError::Io { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{ not json").expect("write");
        assert!(matches!(
            SimulationConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn token_list_is_trimmed_and_deduplicated() {
        let mut config = SimulationConfig::default();
        config.add_tokens(["tok-a"]);
        config.add_tokens(" tok-b, ,tok-a,tok-c ".split(','));
        assert_eq!(config.tokens, vec!["tok-a", "tok-b", "tok-c"]);
    }

    #[test]
    fn validation_requires_tokens_and_timeout() {
        let mut config = SimulationConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::NoTokens)));

        config.add_tokens(["tok"]);
        config.request_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));

        config.request_timeout_secs = 10;
        config.timing.dwell = DelayRange::new(9.0, 1.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
