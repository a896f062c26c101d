//! Runtime settings read from `HEALTHGUARD_*` environment variables.
//!
//! Unset variables take their defaults. Set but unusable values also fall
//! back to the default, with a warning once logging is up.

use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "HEALTHGUARD_DB_PATH";
pub const MODEL_FILE_ENV: &str = "HEALTHGUARD_MODEL_FILE";
pub const LOG_MODE_ENV: &str = "HEALTHGUARD_LOG_MODE";
pub const LOG_FILE_ENV: &str = "HEALTHGUARD_LOG_FILE";
pub const HISTORY_LIMIT_ENV: &str = "HEALTHGUARD_HISTORY_LIMIT";

pub const DEFAULT_DB_PATH: &str = "data/healthguard.db";
pub const DEFAULT_LOG_FILE: &str = "data/healthguard.log";
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    File,
    /// Standard error, so command output on stdout stays clean.
    Console,
    /// The console, unless a log file is configured.
    Auto,
}

impl LogMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "console" | "stderr" | "stdout" => Some(Self::Console),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// SQLite database path; `:memory:` keeps history for this process only.
    pub db_path: PathBuf,
    /// Parameter file to load instead of the built-in coefficients.
    pub model_file: Option<PathBuf>,
    pub log_mode: LogMode,
    pub log_file: Option<PathBuf>,
    pub history_limit: usize,
    /// Problems found while reading the environment, reported after
    /// logging is initialized.
    pub warnings: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            model_file: None,
            log_mode: LogMode::Auto,
            log_file: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            warnings: Vec::new(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = var(DB_PATH_ENV) {
            settings.db_path = PathBuf::from(path.trim());
        }
        settings.model_file = var(MODEL_FILE_ENV).map(|p| PathBuf::from(p.trim()));
        settings.log_file = var(LOG_FILE_ENV).map(|p| PathBuf::from(p.trim()));

        if let Some(raw) = var(LOG_MODE_ENV) {
            match LogMode::parse(&raw) {
                Some(mode) => settings.log_mode = mode,
                None => settings
                    .warnings
                    .push(format!("{LOG_MODE_ENV}={raw:?} is not file/stdout/auto, using auto")),
            }
        }

        if let Some(raw) = var(HISTORY_LIMIT_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => settings.history_limit = limit,
                _ => settings.warnings.push(format!(
                    "{HISTORY_LIMIT_ENV}={raw:?} is not a positive integer, using {DEFAULT_HISTORY_LIMIT}"
                )),
            }
        }

        settings
    }

    /// Resolved log destination: `Some(path)` for a file, `None` for stderr.
    #[must_use]
    pub fn log_destination(&self) -> Option<PathBuf> {
        match self.log_mode {
            LogMode::Console => None,
            LogMode::File => Some(
                self.log_file
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            ),
            LogMode::Auto => self.log_file.clone(),
        }
    }
}
