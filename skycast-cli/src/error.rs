//! CLI error type.

use std::fmt;

use skycast::app::AppError;
use skycast::composite::CompositeError;
use skycast::config::ConfigError;
use skycast::geocode::GeocodeError;
use skycast::logging::LoggingError;
use skycast::provider::ProviderError;

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem, already phrased for the user.
    Config(String),

    /// Could not resolve the requested location.
    Location(GeocodeError),

    /// Building the composite failed.
    Composite(CompositeError),

    /// Server startup or shutdown failed.
    App(AppError),

    /// Logging could not be initialised.
    Logging(LoggingError),

    /// Reading or writing a file failed.
    Io(String),

    /// Failed to create the Tokio runtime.
    Runtime(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Location(e) => write!(f, "Location error: {}", e),
            CliError::Composite(e) => write!(f, "Composite failed: {}", e),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Io(msg) => write!(f, "I/O error: {}", msg),
            CliError::Runtime(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<GeocodeError> for CliError {
    fn from(e: GeocodeError) -> Self {
        CliError::Location(e)
    }
}

impl From<CompositeError> for CliError {
    fn from(e: CompositeError) -> Self {
        CliError::Composite(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Composite(CompositeError::Provider(e))
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_message() {
        let err: CliError = ConfigError::MissingKey {
            key: "keys.climacell",
            env: "WEATHER_KEY",
        }
        .into();
        let message = err.to_string();
        assert!(message.starts_with("Configuration error"));
        assert!(message.contains("WEATHER_KEY"));
    }

    #[test]
    fn test_provider_error_is_composite_failure() {
        let err: CliError = ProviderError::UnknownLayer("radar".into()).into();
        assert!(matches!(
            err,
            CliError::Composite(CompositeError::Provider(_))
        ));
    }
}
