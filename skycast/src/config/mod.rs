//! Configuration file, credentials and environment overrides.
//!
//! Settings live in `~/.skycast/config.ini`. API keys may also come from the
//! environment, which takes precedence over the file.

mod credentials;
mod error;
mod file;
mod keys;

use std::path::PathBuf;

pub use credentials::{
    Credentials, ENV_CLIMACELL_KEY, ENV_OPENCAGE_KEY, ENV_OPENWEATHERMAP_KEY, ENV_WUNDERGROUND_KEY,
};
pub use error::ConfigError;
pub use file::{
    ConfigFile, DataSettings, LoggingSettings, ServerSettings, TileSettings, DEFAULT_BIND,
    DEFAULT_IMAGE_CAPACITY, DEFAULT_PUBLIC_URL, DEFAULT_ZIP_CSV, DEFAULT_ZOOM,
};
pub use keys::ConfigKey;

/// Directory holding skycast's configuration.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".skycast")
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
