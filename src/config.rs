//! Runtime configuration resolved from the process environment.
//!
//! A `.env` file in the working directory is loaded first (via `dotenv`), so the
//! same variables can be pinned per checkout.

use crate::error::{AppError, Result};
use std::env;
use std::path::PathBuf;
use tracing::debug;

/// Root directory holding `input/` and `output/`.
pub const ROOT_VAR: &str = "ENV_MENU_ROOT";
/// Directory for rolling log files; logs go to stderr when unset.
pub const LOG_DIR_VAR: &str = "ENV_MENU_LOG_DIR";
/// Emit JSON log lines when set to `1` or `true`.
pub const LOG_JSON_VAR: &str = "ENV_MENU_LOG_JSON";

const INPUT_DIR: &str = "input";
const OUTPUT_DIR: &str = "output";
const EXPORT_FILE: &str = "env_variables.csv";
const ADD_FILE: &str = "to_add.csv";
const DELETE_FILE: &str = "to_delete.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub root: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub log_json: bool,
}

impl AppConfig {
    /// Builds a configuration rooted at `root` with default logging.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            log_dir: None,
            log_json: false,
        }
    }

    /// Loads configuration from `.env` and the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Env` if a variable is set but not valid Unicode, or
    /// `AppError::Io` if the working directory cannot be determined.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let root = match read_var(ROOT_VAR)? {
            Some(root) => PathBuf::from(root),
            None => env::current_dir()?,
        };
        let log_dir = read_var(LOG_DIR_VAR)?.map(PathBuf::from);
        let log_json = read_var(LOG_JSON_VAR)?
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let config = Self {
            root,
            log_dir,
            log_json,
        };
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root.join(INPUT_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    /// `<root>/output/env_variables.csv`
    pub fn export_file(&self) -> PathBuf {
        self.output_dir().join(EXPORT_FILE)
    }

    /// `<root>/input/to_add.csv`
    pub fn add_file(&self) -> PathBuf {
        self.input_dir().join(ADD_FILE)
    }

    /// `<root>/input/to_delete.csv`
    pub fn delete_file(&self) -> PathBuf {
        self.input_dir().join(DELETE_FILE)
    }
}

/// Reads a variable, treating unset and empty as absent.
fn read_var(name: &str) -> Result<Option<String>> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(AppError::Env(e)),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
