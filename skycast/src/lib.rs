//! Skycast - weather maps and reports for chat integrations
//!
//! The core of the library turns a latitude/longitude into a composited map
//! image: the point is projected onto Web Mercator tiles, a 2×2 (or 3×3)
//! neighbourhood is chosen so the point sits near the centre, every tile of
//! every layer is fetched concurrently, and the layers are stitched and
//! blended into one PNG.
//!
//! Around that core sit the weather provider clients, geocoding, and a small
//! HTTP endpoint that answers chat commands.

pub mod app;
pub mod compose;
pub mod composite;
pub mod config;
pub mod coord;
pub mod fetch;
pub mod geocode;
pub mod grid;
pub mod logging;
pub mod provider;
pub mod server;
pub mod weather;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert!(provider::USER_AGENT.ends_with(VERSION));
    }
}
