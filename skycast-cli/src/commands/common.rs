//! Helpers shared across CLI commands.

use tokio::runtime::Runtime;

use skycast::app::AppConfig;
use skycast::config::ConfigFile;
use skycast::logging::WorkerGuard;

use crate::error::CliError;

/// Loads the config file, falling back to defaults when it is absent.
pub fn load_config() -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load()?)
}

/// Resolves the application config from the file and environment.
pub fn app_config(config: &ConfigFile) -> Result<AppConfig, CliError> {
    Ok(AppConfig::from_config_file(config)?)
}

/// Installs logging as configured; keep the guard for the life of the command.
pub fn init_logging(config: &ConfigFile) -> Result<Option<WorkerGuard>, CliError> {
    Ok(skycast::logging::init(&config.logging)?)
}

pub fn runtime() -> Result<Runtime, CliError> {
    Runtime::new().map_err(|e| CliError::Runtime(e.to_string()))
}
