//! Composite command - render a map overlay to a PNG file.

use std::path::PathBuf;

use skycast::app::AppConfig;
use skycast::compose::Opacity;
use skycast::config::{ConfigError, ENV_OPENCAGE_KEY};
use skycast::coord::Coordinates;
use skycast::geocode::{Geocoder, LocationQuery, OpenCageGeocoder, Place, ZipTable};
use skycast::provider::{AsyncReqwestClient, TileLayer};
use tracing::info;

use super::common::{app_config, init_logging, load_config, runtime};
use crate::error::CliError;

/// Where to centre the image.
pub enum Target {
    /// Free-form query: ZIP, "city, st" or a place name.
    Query(String),
    Point { lat: f64, lon: f64 },
}

/// Arguments for the composite command.
pub struct CompositeArgs {
    pub target: Target,
    pub zoom: Option<u8>,
    pub layers: Vec<TileLayer>,
    pub opacity: Option<Opacity>,
    pub mosaic: bool,
    pub output: PathBuf,
}

/// Layers used when none are given: street map with precipitation.
pub fn default_layers() -> Vec<TileLayer> {
    vec![
        TileLayer::OpenStreetMap,
        TileLayer::ClimaCell("precipitation".to_string()),
    ]
}

/// Run the composite command.
pub fn run(args: CompositeArgs) -> Result<(), CliError> {
    let config = load_config()?;
    let _guard = init_logging(&config)?;
    let app = app_config(&config)?;

    let layers = if args.layers.is_empty() {
        default_layers()
    } else {
        args.layers
    };
    app.validate_layers(&layers)?;
    let zoom = args.zoom.unwrap_or(app.zoom);
    let opacity = args.opacity.unwrap_or(app.opacity);

    let client = AsyncReqwestClient::with_timeout(app.fetch.timeout)?;
    let runtime = runtime()?;

    let png = runtime.block_on(async {
        let place = resolve(&app, &client, args.target).await?;
        info!(location = %place.coordinates, name = %place.name, zoom, "Building composite");

        let builder = app.composite_builder(client.clone());
        let png = if args.mosaic {
            builder
                .build_mosaic(&place.coordinates, zoom, &layers, opacity)
                .await?
        } else {
            builder
                .build(&place.coordinates, zoom, &layers, opacity)
                .await?
        };
        Ok::<Vec<u8>, CliError>(png)
    })?;

    std::fs::write(&args.output, &png)
        .map_err(|e| CliError::Io(format!("{}: {}", args.output.display(), e)))?;
    println!("Wrote {} ({} bytes)", args.output.display(), png.len());
    Ok(())
}

/// Turns the target into coordinates: ZIPs through the local table when it
/// exists, everything else through OpenCage.
async fn resolve(
    app: &AppConfig,
    client: &AsyncReqwestClient,
    target: Target,
) -> Result<Place, CliError> {
    let text = match target {
        Target::Point { lat, lon } => {
            return Ok(Place {
                coordinates: Coordinates::new(lat, lon),
                name: format!("{:.4},{:.4}", lat, lon),
            })
        }
        Target::Query(text) => text,
    };

    let query = LocationQuery::parse(&text)?;
    if query.is_zip() && app.zip_csv.exists() {
        let zips = ZipTable::load(&app.zip_csv)?;
        return Ok(zips.geocode(&query).await?);
    }

    let key = app
        .credentials
        .opencage
        .clone()
        .ok_or(ConfigError::MissingKey {
            key: "keys.opencage",
            env: ENV_OPENCAGE_KEY,
        })?;
    Ok(OpenCageGeocoder::new(client.clone(), key)
        .geocode(&query)
        .await?)
}
