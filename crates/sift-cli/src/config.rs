//! Configuration file (`~/.config/sift/config.ron`).
//!
//! ```ron
//! (
//!     database: Some("~/notes/sift.db"),
//!     log_filter: Some("sift_engine=debug,info"),
//!     engine: (
//!         highlight_color: "yellow",
//!         summary_title: "Summary",
//!         spacer_count: 3,
//!     ),
//! )
//! ```
//!
//! Every field is optional. A missing file means defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sift_engine::EngineOptions;
use thiserror::Error;
use tracing::{debug, info};

/// Errors loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse RON: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// SQLite database path; `~` is expanded.
    pub database: Option<String>,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    /// Where interactive triage writes its log file.
    pub log_dir: Option<String>,
    pub engine: EngineOptions,
}

/// Default config file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sift").join("config.ron"))
}

fn expand(path: &str) -> PathBuf {
    shellexpand::tilde(path).as_ref().into()
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sift")
}

impl SiftConfig {
    /// Parse config text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; the default one may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };
        if !required && !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_ron(&text)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        match &self.database {
            Some(p) => expand(p),
            None => data_dir().join("sift.db"),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        match &self.log_dir {
            Some(p) => expand(p),
            None => data_dir().join("logs"),
        }
    }

    /// Filter directives: config value, else `"info"`.
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or("info")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = SiftConfig::from_ron("()").unwrap();
        assert!(config.database.is_none());
        assert_eq!(config.engine, EngineOptions::default());
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_partial_engine_section() {
        let config = SiftConfig::from_ron(
            r#"(
                database: Some("/tmp/sift-test.db"),
                engine: (summary_title: "Kept", spacer_count: 1),
            )"#,
        )
        .unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/sift-test.db"));
        assert_eq!(config.engine.summary_title, "Kept");
        assert_eq!(config.engine.spacer_count, 1);
        assert_eq!(config.engine.highlight_color, "yellow");
    }

    #[test]
    fn test_tilde_is_expanded() {
        let config = SiftConfig {
            log_dir: Some("~/sift-logs".into()),
            ..SiftConfig::default()
        };
        assert!(!config.log_dir().to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_bad_ron_is_an_error() {
        assert!(matches!(SiftConfig::from_ron("(database: ["), Err(ConfigError::Ron(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ron");
        assert!(matches!(SiftConfig::load(Some(&missing)), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, r#"(log_filter: Some("debug"))"#).unwrap();
        let config = SiftConfig::load(Some(&path)).unwrap();
        assert_eq!(config.log_filter(), "debug");
    }
}
