//! Application bootstrap implementation.
//!
//! Start order: HTTP client, ZIP table, command service, listener. The server
//! runs on a spawned task so the caller can read the bound address before
//! waiting on it.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::geocode::ZipTable;
use crate::provider::AsyncReqwestClient;
use crate::server::{self, WeatherService};

/// Skycast application with service lifecycle management.
pub struct SkycastApp {
    service: Arc<WeatherService<AsyncReqwestClient>>,
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    server: JoinHandle<std::io::Result<()>>,
}

impl SkycastApp {
    /// Start the application with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the ZIP table is
    /// malformed or the listener cannot be bound.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        config.validate()?;
        info!(bind = %config.bind, zoom = config.zoom, "Starting skycast");

        let http_client = AsyncReqwestClient::with_timeout(config.fetch.timeout)?;
        let zips = Arc::new(Self::load_zips(&config)?);
        Self::log_disabled_features(&config);

        let service = Arc::new(config.weather_service(http_client, zips));

        let listener = TcpListener::bind(config.bind)
            .await
            .map_err(|source| AppError::Bind {
                addr: config.bind,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(AppError::Serve)?;

        let shutdown = CancellationToken::new();
        let server = tokio::spawn(server::serve(
            listener,
            Arc::clone(&service),
            shutdown.clone(),
        ));

        Ok(Self {
            service,
            local_addr,
            shutdown,
            server,
        })
    }

    /// A missing table only disables NWS; a malformed one is an error.
    fn load_zips(config: &AppConfig) -> Result<ZipTable, AppError> {
        if !config.zip_csv.exists() {
            warn!(
                path = %config.zip_csv.display(),
                "ZIP table not found; ZIP lookups will fail"
            );
            return Ok(ZipTable::default());
        }
        let zips = ZipTable::load(&config.zip_csv).map_err(AppError::ZipTable)?;
        info!(entries = zips.len(), "ZIP table loaded");
        Ok(zips)
    }

    fn log_disabled_features(config: &AppConfig) {
        let keys = &config.credentials;
        let features = [
            (keys.wunderground.is_none(), "weather, forecast", "WUNDERGROUND_API_KEY"),
            (keys.climacell.is_none(), "conditions", "WEATHER_KEY"),
            (keys.openweathermap.is_none(), "precip, satellite", "OWM_API_KEY"),
        ];
        for (disabled, commands, env) in features {
            if disabled {
                warn!(commands, env, "API key not set; commands disabled");
            }
        }
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn service(&self) -> &Arc<WeatherService<AsyncReqwestClient>> {
        &self.service
    }

    /// Token that stops the server when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serves until Ctrl-C or until the shutdown token is cancelled.
    pub async fn run(self) -> Result<(), AppError> {
        let token = self.shutdown.clone();
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Ctrl-C received");
            }
            _ = token.cancelled() => {}
        }
        self.shutdown().await
    }

    /// Graceful shutdown: stop accepting, finish in-flight requests.
    pub async fn shutdown(self) -> Result<(), AppError> {
        info!("Shutting down");
        self.shutdown.cancel();
        match self.server.await {
            Ok(result) => result.map_err(AppError::Serve),
            Err(e) => Err(AppError::Serve(std::io::Error::other(e))),
        }
    }
}
