//! Environment configuration for the binary.

use std::path::PathBuf;

use wraith_dispatch::DispatchConfig;

use crate::error::AppError;

/// Default save file, relative to the working directory.
pub const DEFAULT_SAVE_PATH: &str = "wraith_save.json";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable lines.
    Pretty,
}

/// Everything the binary reads from its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Dispatch worker count (`WRAITH_WORKERS`).
    pub workers: usize,
    /// Optional YAML timeline script (`WRAITH_SCRIPT_PATH`).
    pub script_path: Option<PathBuf>,
    /// Progress save file (`WRAITH_SAVE_PATH`).
    pub save_path: PathBuf,
    /// Log format (`WRAITH_LOG_FORMAT`: `json` or `pretty`).
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workers: DispatchConfig::default().workers,
            script_path: None,
            save_path: PathBuf::from(DEFAULT_SAVE_PATH),
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; unset variables keep defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("WRAITH_WORKERS") {
            let workers: usize = raw.trim().parse().map_err(|e| {
                AppError::Config(format!("WRAITH_WORKERS must be a positive integer: {e}"))
            })?;
            if workers == 0 {
                return Err(AppError::Config(
                    "WRAITH_WORKERS must be at least 1".to_owned(),
                ));
            }
            config.workers = workers;
        }

        if let Some(raw) = lookup("WRAITH_SCRIPT_PATH").filter(|v| !v.trim().is_empty()) {
            config.script_path = Some(PathBuf::from(raw));
        }

        if let Some(raw) = lookup("WRAITH_SAVE_PATH") {
            if raw.trim().is_empty() {
                return Err(AppError::Config(
                    "WRAITH_SAVE_PATH must not be empty".to_owned(),
                ));
            }
            config.save_path = PathBuf::from(raw);
        }

        if let Some(raw) = lookup("WRAITH_LOG_FORMAT") {
            config.log_format = match raw.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                other => {
                    return Err(AppError::Config(format!(
                        "WRAITH_LOG_FORMAT must be 'json' or 'pretty', got '{other}'"
                    )));
                }
            };
        }

        Ok(config)
    }

    /// Dispatch settings derived from this config.
    #[must_use]
    pub fn dispatch(&self) -> DispatchConfig {
        DispatchConfig::with_workers(self.workers)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.workers, 4);
        assert_eq!(config.save_path, PathBuf::from(DEFAULT_SAVE_PATH));
    }

    #[test]
    fn test_reads_every_variable() {
        // Arrange
        let env = lookup(&[
            ("WRAITH_WORKERS", "8"),
            ("WRAITH_SCRIPT_PATH", "/tmp/script.yaml"),
            ("WRAITH_SAVE_PATH", "/tmp/save.json"),
            ("WRAITH_LOG_FORMAT", "Pretty"),
        ]);

        // Act
        let config = AppConfig::from_lookup(env).unwrap();

        // Assert
        assert_eq!(config.workers, 8);
        assert_eq!(config.script_path, Some(PathBuf::from("/tmp/script.yaml")));
        assert_eq!(config.save_path, PathBuf::from("/tmp/save.json"));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.dispatch().workers, 8);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let result = AppConfig::from_lookup(lookup(&[("WRAITH_WORKERS", "0")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_non_numeric_workers() {
        let result = AppConfig::from_lookup(lookup(&[("WRAITH_WORKERS", "many")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let result = AppConfig::from_lookup(lookup(&[("WRAITH_LOG_FORMAT", "xml")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_blank_save_path() {
        let result = AppConfig::from_lookup(lookup(&[("WRAITH_SAVE_PATH", " ")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
