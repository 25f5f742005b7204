//! Location query parsing.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use super::GeocodeError;

fn zip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{5}$").unwrap())
}

fn city_state_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // letters, spaces, dots, apostrophes and hyphens: "St. Mary's", "Winston-Salem"
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z .'-]*$").unwrap())
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationQuery {
    /// Five-digit US ZIP code.
    Zip(String),
    /// "City, ST" or "City ST".
    CityState { city: String, state: String },
    /// Anything else that names a place, e.g. "austin".
    Place(String),
}

impl LocationQuery {
    /// Parses a free-form query.
    ///
    /// A comma splits city from state; without one, the last word is taken as
    /// the state so that "san antonio tx" works. A single word is a place.
    pub fn parse(input: &str) -> Result<Self, GeocodeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }
        if zip_pattern().is_match(input) {
            return Ok(LocationQuery::Zip(input.to_string()));
        }

        let split = input
            .split_once(',')
            .or_else(|| input.rsplit_once(char::is_whitespace));
        match split {
            Some((city, state)) => {
                let (city, state) = (city.trim(), state.trim());
                if city.is_empty() || state.is_empty() {
                    return Err(GeocodeError::InvalidQuery(input.to_string()));
                }
                if !city_state_pattern().is_match(city) || !city_state_pattern().is_match(state) {
                    return Ok(LocationQuery::Place(input.to_string()));
                }
                Ok(LocationQuery::CityState {
                    city: city.to_string(),
                    state: state.to_string(),
                })
            }
            None => Ok(LocationQuery::Place(input.to_string())),
        }
    }

    pub fn is_zip(&self) -> bool {
        matches!(self, LocationQuery::Zip(_))
    }
}

impl FromStr for LocationQuery {
    type Err = GeocodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocationQuery::parse(s)
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::Zip(zip) => write!(f, "{}", zip),
            LocationQuery::CityState { city, state } => write!(f, "{}, {}", city, state),
            LocationQuery::Place(place) => write!(f, "{}", place),
        }
    }
}
