//! Skycast CLI - Command-line interface
//!
//! Runs the weather endpoint, renders composites to files, and manages the
//! configuration file.

mod commands;
mod error;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser, Subcommand};
use skycast::compose::Opacity;
use skycast::provider::TileLayer;

use commands::composite::{CompositeArgs, Target};
use commands::config::ConfigCommands;
use commands::serve::ServeArgs;
use commands::tile::TileArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather reports and radar composites")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP endpoint for chat integrations
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Base URL for image links (overrides server.public_url)
        #[arg(long)]
        public_url: Option<String>,

        /// Zoom level for map images (overrides tiles.zoom)
        #[arg(long)]
        zoom: Option<u8>,

        /// Overlay opacity between 0 and 1 (overrides tiles.opacity)
        #[arg(long)]
        opacity: Option<Opacity>,
    },

    /// Render a map composite around a location to a PNG file
    #[command(group(ArgGroup::new("target").required(true).args(["location", "lat"])))]
    Composite {
        /// ZIP code, "city, st" or place name
        #[arg(long)]
        location: Option<String>,

        /// Latitude in degrees
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude in degrees
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Zoom level (overrides tiles.zoom)
        #[arg(long)]
        zoom: Option<u8>,

        /// Layer, bottom first: osm, satellite, precipitation, climacell:<feature>,
        /// owm:precipitation, owm:clouds or a URL template (repeatable)
        #[arg(long = "layer")]
        layers: Vec<TileLayer>,

        /// Overlay opacity between 0 and 1 (overrides tiles.opacity)
        #[arg(long)]
        opacity: Option<Opacity>,

        /// Render the 3×3 mosaic instead of the 2×2 overlay
        #[arg(long)]
        mosaic: bool,

        /// Output PNG path
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Show the tile, quadrant and tile set for a point
    Tile {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Zoom level
        #[arg(long, default_value_t = skycast::config::DEFAULT_ZOOM)]
        zoom: u8,

        /// Show the 3×3 mosaic grid
        #[arg(long)]
        mosaic: bool,
    },

    /// View and edit the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Serve {
            bind,
            public_url,
            zoom,
            opacity,
        } => commands::serve::run(ServeArgs {
            bind,
            public_url,
            zoom,
            opacity,
        }),
        Commands::Composite {
            location,
            lat,
            lon,
            zoom,
            layers,
            opacity,
            mosaic,
            output,
        } => {
            let target = match (location, lat, lon) {
                (Some(query), _, _) => Target::Query(query),
                (None, Some(lat), Some(lon)) => Target::Point { lat, lon },
                _ => {
                    return Err(CliError::Config(
                        "provide --location or both --lat and --lon".to_string(),
                    ))
                }
            };
            commands::composite::run(CompositeArgs {
                target,
                zoom,
                layers,
                opacity,
                mosaic,
                output,
            })
        }
        Commands::Tile {
            lat,
            lon,
            zoom,
            mosaic,
        } => commands::tile::run(TileArgs {
            lat,
            lon,
            zoom,
            mosaic,
        }),
        Commands::Config { command } => commands::config::run(command),
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
