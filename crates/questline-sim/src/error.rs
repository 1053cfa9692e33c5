//! Questline sim error types.

use questline_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the simulation driver.
#[derive(Debug, Error)]
pub enum AppError {
    /// A configuration variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The engine or the save store refused an operation.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Report output failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
