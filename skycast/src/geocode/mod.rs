//! Turning user queries into coordinates.

mod opencage;
mod query;
mod zip;

use std::future::Future;

use thiserror::Error;

use crate::coord::Coordinates;
use crate::provider::ProviderError;

pub use opencage::{OpenCageGeocoder, OPENCAGE_URL};
pub use query::LocationQuery;
pub use zip::ZipTable;

/// A resolved location.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub coordinates: Coordinates,
    /// Human-readable name, e.g. "Austin, Texas".
    pub name: String,
}

/// Errors resolving a location.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("empty location")]
    EmptyQuery,

    #[error("can't understand location '{0}'")]
    InvalidQuery(String),

    #[error("no results found for location '{0}'")]
    NotFound(String),

    #[error("only ZIP codes are accepted here, got '{0}'")]
    ZipRequired(String),

    #[error("failed to load ZIP table {path}: {message}")]
    ZipTable { path: String, message: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Resolves a query to a single place.
pub trait Geocoder: Send + Sync {
    fn geocode(
        &self,
        query: &LocationQuery,
    ) -> impl Future<Output = Result<Place, GeocodeError>> + Send;
}
