//! Serve command - run the weather endpoint.

use std::net::SocketAddr;

use skycast::app::SkycastApp;
use skycast::compose::Opacity;
use tracing::info;

use super::common::{app_config, init_logging, load_config, runtime};
use crate::error::CliError;

/// Arguments for the serve command.
pub struct ServeArgs {
    pub bind: Option<SocketAddr>,
    pub public_url: Option<String>,
    pub zoom: Option<u8>,
    pub opacity: Option<Opacity>,
}

/// Run the serve command; blocks until Ctrl-C.
pub fn run(args: ServeArgs) -> Result<(), CliError> {
    let config = load_config()?;
    let _guard = init_logging(&config)?;

    // CLI takes precedence, then config
    let mut app_config = app_config(&config)?;
    if let Some(bind) = args.bind {
        app_config = app_config.with_bind(bind);
    }
    if let Some(public_url) = args.public_url {
        app_config = app_config.with_public_url(public_url);
    }
    if let Some(zoom) = args.zoom {
        app_config = app_config.with_zoom(zoom);
    }
    if let Some(opacity) = args.opacity {
        app_config = app_config.with_opacity(opacity);
    }

    let runtime = runtime()?;
    runtime.block_on(async {
        let app = SkycastApp::start(app_config).await?;
        println!("Listening on http://{}/", app.local_addr());
        println!("Press Ctrl-C to stop");
        app.run().await?;
        info!("Server stopped");
        Ok::<(), CliError>(())
    })
}
