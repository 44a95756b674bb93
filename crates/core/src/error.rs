// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Phase failures never surface here; they are folded into the report.
/// Only problems that prevent probing at all become an AppError.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lock error: {0}")]
    Lock(#[from] crate::port::LockError),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
