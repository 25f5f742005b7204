//! Application bootstrap and lifecycle management.
//!
//! [`SkycastApp`] wires the configured clients into a [`WeatherService`],
//! binds the listener and runs the endpoint until Ctrl-C or an explicit
//! shutdown.
//!
//! # Example
//!
//! ```ignore
//! use skycast::app::{AppConfig, SkycastApp};
//!
//! let config = AppConfig::from_config_file(&config_file)?;
//! let app = SkycastApp::start(config).await?;
//! app.run().await?;
//! ```
//!
//! [`WeatherService`]: crate::server::WeatherService

mod bootstrap;
mod config;
mod error;

pub use bootstrap::SkycastApp;
pub use config::AppConfig;
pub use error::AppError;
