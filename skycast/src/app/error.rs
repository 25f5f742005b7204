//! Application error types.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use crate::config::ConfigError;
use crate::geocode::GeocodeError;
use crate::provider::ProviderError;

/// Errors that can occur during application lifecycle.
#[derive(Debug)]
pub enum AppError {
    /// Invalid or incomplete configuration.
    Config(ConfigError),

    /// Failed to build the HTTP client.
    HttpClient(ProviderError),

    /// The ZIP table exists but could not be loaded.
    ZipTable(GeocodeError),

    /// Failed to bind the listener.
    Bind { addr: SocketAddr, source: io::Error },

    /// The server stopped with an error.
    Serve(io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            AppError::ZipTable(e) => write!(f, "Failed to load ZIP table: {}", e),
            AppError::Bind { addr, source } => {
                write!(f, "Failed to bind {}: {}", addr, source)
            }
            AppError::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::HttpClient(e) => Some(e),
            AppError::ZipTable(e) => Some(e),
            AppError::Bind { source, .. } => Some(source),
            AppError::Serve(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::HttpClient(e)
    }
}
