//! Error types for radio_repeat.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings or report (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line of a play log could not be understood
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A play's date and time do not form a valid timestamp
    #[error("Invalid timestamp for {radio} play on {date}: '{time}'")]
    InvalidTimestamp {
        radio: String,
        date: String,
        time: String,
    },

    /// Station tag outside the tracked set
    #[error("Unknown station '{0}'. Expected: cidadefm, comercial, megafm, rfm")]
    UnknownStation(String),

    /// Station day file whose name does not carry a date
    #[error("Invalid log file name '{0}'. Expected <station>_<DD>_<MM>_<YYYY>.csv")]
    InvalidFilename(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
