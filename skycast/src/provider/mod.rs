//! Upstream tile servers and the HTTP seam.
//!
//! Every network call in the crate goes through [`AsyncHttpClient`], so tests
//! swap in a canned client instead of touching the network.

mod http;
mod layer;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS, USER_AGENT};
pub use layer::{
    OwmLayer, TileLayer, TileServers, UrlTemplate, CLIMACELL_FEATURES, DEFAULT_CLIMACELL_URL,
    DEFAULT_OPENWEATHERMAP_URL, DEFAULT_OSM_URL, DEFAULT_SATELLITE_URL,
};
pub use types::ProviderError;

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
