//! Runtime configuration read from the environment.
//!
//! | Variable                  | Default      |
//! |---------------------------|--------------|
//! | `EMRA_MODEL_DIR`          | `models`     |
//! | `EMRA_REQUIRE_MANIFEST`   | off          |
//! | `EMRA_LOG_MODE`           | `stderr`     |
//! | `EMRA_LOG_FILE`           | `emra.log`   |
//! | `EMRA_SANITIZE_MAX_BYTES` | 16 KiB       |
//!
//! Log verbosity itself is controlled by `RUST_LOG`.

use std::path::PathBuf;

use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;

pub const MODEL_DIR_ENV: &str = "EMRA_MODEL_DIR";
pub const REQUIRE_MANIFEST_ENV: &str = "EMRA_REQUIRE_MANIFEST";
pub const LOG_MODE_ENV: &str = "EMRA_LOG_MODE";
pub const LOG_FILE_ENV: &str = "EMRA_LOG_FILE";
pub const SANITIZE_MAX_BYTES_ENV: &str = "EMRA_SANITIZE_MAX_BYTES";

/// Where log lines go. Stdout is reserved for the assessment output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Stderr,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub model_dir: PathBuf,
    pub require_manifest: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    pub sanitize_max_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            require_manifest: false,
            log_mode: LogMode::Stderr,
            log_file: PathBuf::from("emra.log"),
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Unrecognized or unparsable values fall back to the default.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let log_mode = match lookup(LOG_MODE_ENV).as_deref() {
            Some("file") => LogMode::File,
            Some("stderr") | None => LogMode::Stderr,
            Some(other) => {
                tracing::warn!("Unknown {LOG_MODE_ENV}={other}; logging to stderr");
                LogMode::Stderr
            }
        };

        Self {
            model_dir: lookup(MODEL_DIR_ENV)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            require_manifest: lookup(REQUIRE_MANIFEST_ENV)
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.require_manifest),
            log_mode,
            log_file: lookup(LOG_FILE_ENV)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            sanitize_max_bytes: lookup(SANITIZE_MAX_BYTES_ENV)
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|&v| v > 0)
                .unwrap_or(defaults.sanitize_max_bytes),
        }
    }
}
