//! Common error types for VCD

use thiserror::Error;

/// Common result type for VCD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across VCD services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
