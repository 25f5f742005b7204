//! Provider error type

use std::fmt;
use std::time::Duration;

/// Errors talking to an upstream tile or data server.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Transport failure (connect, TLS, reading the body).
    HttpError(String),
    /// Server answered with a non-success status.
    Status { status: u16, url: String },
    /// No response within the per-request deadline.
    Timeout { url: String, after: Duration },
    /// Body could not be decoded (image or JSON).
    Decode(String),
    /// The layer needs a credential that was not configured.
    MissingApiKey(&'static str),
    /// Layer name not recognised by the provider.
    UnknownLayer(String),
    /// Zoom level not served by the provider.
    UnsupportedZoom(u8),
}

impl ProviderError {
    /// Whether a repeat of the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::HttpError(_) | ProviderError::Timeout { .. } => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::Status { status, url } => write!(f, "HTTP {} from {}", status, url),
            ProviderError::Timeout { url, after } => {
                write!(f, "Timed out after {:?} waiting for {}", after, url)
            }
            ProviderError::Decode(msg) => write!(f, "Failed to decode response: {}", msg),
            ProviderError::MissingApiKey(provider) => {
                write!(f, "No API key configured for {}", provider)
            }
            ProviderError::UnknownLayer(layer) => write!(f, "Unknown layer: {}", layer),
            ProviderError::UnsupportedZoom(zoom) => write!(f, "Unsupported zoom level: {}", zoom),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Decode(e.to_string())
    }
}
