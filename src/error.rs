//! Error types for vde-net

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias using vde-net Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vde-net operations
#[derive(Error, Debug)]
pub enum Error {
    /// Memory for the switch path copy could not be obtained
    #[error("Failed to allocate memory: {0}")]
    Allocation(#[from] TryReserveError),

    /// Switch path cannot be passed to libvdeplug
    #[error("Invalid switch path: {0}")]
    InvalidPath(String),

    /// The switch could not be reached or refused the connection
    #[error("Failed to connect to vde switch at {path}: {source}")]
    Connection {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Built without the `vde` feature
    #[error(
        "The host library was compiled without support for VDE networking. \
         Please rebuild with VDE enabled."
    )]
    Unsupported,

    /// Channel not ready; retry after the next successful poll
    #[error("Resource temporarily unavailable")]
    WouldBlock,

    /// The switch connection died (hang-up or invalid descriptor)
    #[error("Connection to vde switch lost: {0}")]
    ConnectionLost(&'static str),

    /// Timeout waiting for operation
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the operation may succeed if retried later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::WouldBlock)
    }
}
