//! ZIP code to coordinates lookup table.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::coord::Coordinates;

use super::{GeocodeError, Geocoder, LocationQuery, Place};

#[derive(Debug, Deserialize)]
struct ZipRecord {
    #[serde(rename = "ZIP")]
    zip: String,
    #[serde(rename = "LAT")]
    lat: f64,
    #[serde(rename = "LNG")]
    lng: f64,
}

/// In-memory table loaded from a `ZIP,LAT,LNG` CSV file.
#[derive(Debug, Clone, Default)]
pub struct ZipTable {
    entries: HashMap<String, Coordinates>,
}

impl ZipTable {
    /// Loads the table from a CSV file with a `ZIP,LAT,LNG` header row.
    pub fn load(path: &Path) -> Result<Self, GeocodeError> {
        let file = std::fs::File::open(path).map_err(|e| GeocodeError::ZipTable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_reader(file).map_err(|e| match e {
            GeocodeError::ZipTable { message, .. } => GeocodeError::ZipTable {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Reads CSV rows; surrounding whitespace in fields is ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GeocodeError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = HashMap::new();
        for record in csv.deserialize::<ZipRecord>() {
            let record = record.map_err(|e| GeocodeError::ZipTable {
                path: "<reader>".to_string(),
                message: e.to_string(),
            })?;
            entries.insert(record.zip, Coordinates::new(record.lat, record.lng));
        }
        Ok(Self { entries })
    }

    pub fn lookup(&self, zip: &str) -> Option<Coordinates> {
        self.entries.get(zip.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Geocoder for ZipTable {
    /// Resolves ZIP queries only; the place name is the ZIP itself.
    async fn geocode(&self, query: &LocationQuery) -> Result<Place, GeocodeError> {
        match query {
            LocationQuery::Zip(zip) => self
                .lookup(zip)
                .map(|coordinates| Place {
                    coordinates,
                    name: zip.clone(),
                })
                .ok_or_else(|| GeocodeError::NotFound(zip.clone())),
            other => Err(GeocodeError::ZipRequired(other.to_string())),
        }
    }
}
