//! Defines the application's primary error type `AppError` and a convenience `Result` alias.
//!
//! Uses the `thiserror` crate for ergonomic error definition and provides `From`
//! implementations to convert common external errors into `AppError` variants.
//! Errors that do not implement `Clone` are wrapped in `Arc` to allow `AppError` to be cloneable.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// The primary error enumeration for all application-specific errors.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// The host operating system is not Windows.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// A CSV input file expected under the data root does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputFileMissing(PathBuf),

    /// Error reading or writing CSV files (`csv`).
    #[error("CSV Error: {0}")]
    Csv(Arc<csv::Error>),

    /// An external command (`setx`, `reg`) exited with a non-zero status.
    #[error("{program} exited with {}: {stderr}", describe_status(.code))]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Error while opening or enumerating the registry key.
    #[error("Registry Error: {0}")]
    Registry(Arc<std::io::Error>),

    /// Error related to standard I/O operations (process spawn, filesystem).
    #[error("I/O Error: {0}")]
    Io(Arc<std::io::Error>),

    /// Error originating from user interaction prompts (`dialoguer`).
    #[error("Dialoguer Error: {0}")]
    Dialoguer(Arc<dialoguer::Error>),

    /// The console has no more input to offer.
    #[error("Console input closed")]
    InputClosed,

    /// Error related to accessing environment variables.
    #[error("Environment Error: {0}")]
    Env(#[from] std::env::VarError),

    /// Error specific to CLI logic or argument handling.
    #[error("CLI Error: {0}")]
    Cli(String),
}

impl AppError {
    /// Returns `true` for errors that leave the interactive loop unable to continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Dialoguer(_) | AppError::InputClosed)
    }
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status".to_string(),
    }
}

/// A specialized `Result` type using the application's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// --- From implementations ---
// Arc is used for non-Clone error types.

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(Arc::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(err: dialoguer::Error) -> Self {
        AppError::Dialoguer(Arc::new(err))
    }
}
