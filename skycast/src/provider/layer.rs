//! Tile layers and their URL templates.
//!
//! A [`TileLayer`] names what to draw; [`TileServers`] knows where each layer
//! lives and which credential it needs. URL templates use `{z}`, `{x}`, `{y}`
//! plus the optional `{s}` (subdomain), `{layer}` and `{key}` placeholders.

use std::fmt;
use std::str::FromStr;

use crate::config::Credentials;
use crate::coord::TileCoord;

use super::types::ProviderError;

/// OpenStreetMap standard tiles, spread over the a/b/c subdomains.
pub const DEFAULT_OSM_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// ClimaCell map layers.
pub const DEFAULT_CLIMACELL_URL: &str =
    "https://api.climacell.co/v3/weather/layers/{layer}/now/{z}/{x}/{y}.png?apikey={key}";

/// OpenWeatherMap map layers.
pub const DEFAULT_OPENWEATHERMAP_URL: &str =
    "https://tile.openweathermap.org/map/{layer}/{z}/{x}/{y}.png?cities=true&appid={key}";

/// OpenWeatherMap cloudless satellite imagery.
pub const DEFAULT_SATELLITE_URL: &str = "https://sat.owm.io/sql/{z}/{x}/{y}?APPID={key}&op=rgb&from=cloudless&select=red,green,blue&order=best";

/// Feature names served by the ClimaCell layer endpoint.
pub const CLIMACELL_FEATURES: &[&str] = &[
    "temp",
    "precipitation",
    "wind_speed",
    "wind_direction",
    "wind_gust",
    "visibility",
    "baro_pressure",
    "dewpoint",
    "humidity",
    "cloud_cover",
    "cloud_base",
    "cloud_ceiling",
    "cloud_satellite",
];

const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// OpenWeatherMap overlay layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwmLayer {
    Precipitation,
    Clouds,
}

impl OwmLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwmLayer::Precipitation => "precipitation_new",
            OwmLayer::Clouds => "clouds_new",
        }
    }
}

/// A single drawable tile layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TileLayer {
    /// OpenStreetMap base map.
    OpenStreetMap,
    /// ClimaCell weather layer for one feature.
    ClimaCell(String),
    /// OpenWeatherMap overlay.
    OpenWeatherMap(OwmLayer),
    /// OpenWeatherMap satellite imagery.
    Satellite,
    /// Any other XYZ server, keyless.
    Custom(UrlTemplate),
}

impl TileLayer {
    /// ClimaCell layer for `feature`, rejecting names the service does not serve.
    pub fn climacell(feature: &str) -> Result<Self, ProviderError> {
        if CLIMACELL_FEATURES.contains(&feature) {
            Ok(TileLayer::ClimaCell(feature.to_string()))
        } else {
            Err(ProviderError::UnknownLayer(feature.to_string()))
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &str {
        match self {
            TileLayer::OpenStreetMap => "osm",
            TileLayer::ClimaCell(feature) => feature,
            TileLayer::OpenWeatherMap(layer) => layer.as_str(),
            TileLayer::Satellite => "satellite",
            TileLayer::Custom(_) => "custom",
        }
    }
}

impl FromStr for TileLayer {
    type Err = ProviderError;

    /// Parses `osm`, `satellite`, `precipitation`, `climacell:<feature>`,
    /// `owm:precipitation`, `owm:clouds`, or a raw URL template.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "osm" | "openstreetmap" => return Ok(TileLayer::OpenStreetMap),
            "satellite" => return Ok(TileLayer::Satellite),
            "precipitation" => return TileLayer::climacell("precipitation"),
            "owm:precipitation" => return Ok(TileLayer::OpenWeatherMap(OwmLayer::Precipitation)),
            "owm:clouds" => return Ok(TileLayer::OpenWeatherMap(OwmLayer::Clouds)),
            _ => {}
        }
        if let Some(feature) = s.strip_prefix("climacell:") {
            return TileLayer::climacell(feature);
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return UrlTemplate::parse(s).map(TileLayer::Custom);
        }
        Err(ProviderError::UnknownLayer(s.to_string()))
    }
}

impl fmt::Display for TileLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileLayer::OpenStreetMap => write!(f, "osm"),
            TileLayer::ClimaCell(feature) => write!(f, "climacell:{}", feature),
            TileLayer::OpenWeatherMap(OwmLayer::Precipitation) => write!(f, "owm:precipitation"),
            TileLayer::OpenWeatherMap(OwmLayer::Clouds) => write!(f, "owm:clouds"),
            TileLayer::Satellite => write!(f, "satellite"),
            TileLayer::Custom(template) => write!(f, "{}", template),
        }
    }
}

/// An XYZ URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Accepts a template that mentions all of `{z}`, `{x}` and `{y}`.
    pub fn parse(template: &str) -> Result<Self, ProviderError> {
        let complete = ["{z}", "{x}", "{y}"]
            .iter()
            .all(|placeholder| template.contains(placeholder));
        if !complete {
            return Err(ProviderError::UnknownLayer(format!(
                "template must contain {{z}}, {{x}} and {{y}}: {}",
                template
            )));
        }
        Ok(Self(template.to_string()))
    }

    /// Wraps one of the built-in default templates.
    pub(crate) fn from_default(template: &'static str) -> Self {
        Self(template.to_string())
    }

    /// Whether rendering needs an API key.
    pub fn needs_key(&self) -> bool {
        self.0.contains("{key}")
    }

    /// Substitutes the placeholders for one tile.
    ///
    /// The subdomain is picked from the tile position so a grid spreads over
    /// all servers while the same tile always maps to the same host.
    pub fn render(&self, tile: &TileCoord, layer: &str, key: Option<&str>) -> String {
        let subdomain = SUBDOMAINS[((tile.x + tile.y) % SUBDOMAINS.len() as u32) as usize];
        self.0
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
            .replace("{s}", subdomain)
            .replace("{layer}", layer)
            .replace("{key}", key.unwrap_or_default())
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where each layer is served from, with the keys to reach it.
#[derive(Debug, Clone)]
pub struct TileServers {
    osm: UrlTemplate,
    climacell: UrlTemplate,
    openweathermap: UrlTemplate,
    satellite: UrlTemplate,
    climacell_key: Option<String>,
    openweathermap_key: Option<String>,
}

impl Default for TileServers {
    fn default() -> Self {
        Self {
            osm: UrlTemplate::from_default(DEFAULT_OSM_URL),
            climacell: UrlTemplate::from_default(DEFAULT_CLIMACELL_URL),
            openweathermap: UrlTemplate::from_default(DEFAULT_OPENWEATHERMAP_URL),
            satellite: UrlTemplate::from_default(DEFAULT_SATELLITE_URL),
            climacell_key: None,
            openweathermap_key: None,
        }
    }
}

impl TileServers {
    /// Default servers using the given credentials.
    pub fn new(credentials: &Credentials) -> Self {
        Self::default().with_credentials(credentials)
    }

    pub fn with_credentials(mut self, credentials: &Credentials) -> Self {
        self.climacell_key = credentials.climacell.clone();
        self.openweathermap_key = credentials.openweathermap.clone();
        self
    }

    pub fn with_osm(mut self, template: UrlTemplate) -> Self {
        self.osm = template;
        self
    }

    pub fn with_climacell(mut self, template: UrlTemplate) -> Self {
        self.climacell = template;
        self
    }

    pub fn with_openweathermap(mut self, template: UrlTemplate) -> Self {
        self.openweathermap = template;
        self
    }

    pub fn with_satellite(mut self, template: UrlTemplate) -> Self {
        self.satellite = template;
        self
    }

    /// Builds the request URL for one tile of `layer`.
    pub fn url(&self, layer: &TileLayer, tile: &TileCoord) -> Result<String, ProviderError> {
        let (template, key, provider) = match layer {
            TileLayer::OpenStreetMap => (&self.osm, None, "OpenStreetMap"),
            TileLayer::ClimaCell(_) => (
                &self.climacell,
                self.climacell_key.as_deref(),
                "ClimaCell",
            ),
            TileLayer::OpenWeatherMap(_) => (
                &self.openweathermap,
                self.openweathermap_key.as_deref(),
                "OpenWeatherMap",
            ),
            TileLayer::Satellite => (
                &self.satellite,
                self.openweathermap_key.as_deref(),
                "OpenWeatherMap",
            ),
            TileLayer::Custom(template) => (template, None, "custom"),
        };

        if template.needs_key() && key.is_none() {
            return Err(ProviderError::MissingApiKey(provider));
        }
        Ok(template.render(tile, layer.name(), key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed() -> TileServers {
        TileServers::new(&Credentials {
            climacell: Some("cc-key".into()),
            openweathermap: Some("owm-key".into()),
            ..Default::default()
        })
    }

    #[test]
    fn test_osm_url_uses_subdomain() {
        let url = keyed()
            .url(&TileLayer::OpenStreetMap, &TileCoord::new(29, 52, 7))
            .unwrap();
        // (29 + 52) % 3 == 0
        assert_eq!(url, "https://a.tile.openstreetmap.org/7/29/52.png");
    }

    #[test]
    fn test_subdomain_spreads_over_grid() {
        let servers = keyed();
        let hosts: Vec<String> = [(28, 52), (29, 52), (28, 53)]
            .iter()
            .map(|&(x, y)| {
                servers
                    .url(&TileLayer::OpenStreetMap, &TileCoord::new(x, y, 7))
                    .unwrap()
            })
            .collect();
        assert!(hosts[0].starts_with("https://c."));
        assert!(hosts[1].starts_with("https://a."));
        assert!(hosts[2].starts_with("https://a."));
    }

    #[test]
    fn test_climacell_url() {
        let layer = TileLayer::climacell("precipitation").unwrap();
        let url = keyed().url(&layer, &TileCoord::new(28, 53, 7)).unwrap();
        assert_eq!(
            url,
            "https://api.climacell.co/v3/weather/layers/precipitation/now/7/28/53.png?apikey=cc-key"
        );
    }

    #[test]
    fn test_owm_urls() {
        let servers = keyed();
        let tile = TileCoord::new(37, 48, 7);
        let precip = servers
            .url(&TileLayer::OpenWeatherMap(OwmLayer::Precipitation), &tile)
            .unwrap();
        assert_eq!(
            precip,
            "https://tile.openweathermap.org/map/precipitation_new/7/37/48.png?cities=true&appid=owm-key"
        );
        let sat = servers.url(&TileLayer::Satellite, &tile).unwrap();
        assert!(sat.starts_with("https://sat.owm.io/sql/7/37/48?APPID=owm-key&"));
    }

    #[test]
    fn test_missing_key_rejected() {
        let servers = TileServers::default();
        let layer = TileLayer::climacell("temp").unwrap();
        let result = servers.url(&layer, &TileCoord::new(0, 0, 1));
        assert_eq!(result, Err(ProviderError::MissingApiKey("ClimaCell")));
        // OSM needs no key
        assert!(servers
            .url(&TileLayer::OpenStreetMap, &TileCoord::new(0, 0, 1))
            .is_ok());
    }

    #[test]
    fn test_unknown_climacell_feature() {
        assert!(matches!(
            TileLayer::climacell("foo"),
            Err(ProviderError::UnknownLayer(_))
        ));
        for feature in CLIMACELL_FEATURES {
            assert!(TileLayer::climacell(feature).is_ok());
        }
    }

    #[test]
    fn test_parse_layer_names() {
        assert_eq!("osm".parse::<TileLayer>().unwrap(), TileLayer::OpenStreetMap);
        assert_eq!(
            "precipitation".parse::<TileLayer>().unwrap(),
            TileLayer::ClimaCell("precipitation".into())
        );
        assert_eq!(
            "climacell:wind_gust".parse::<TileLayer>().unwrap(),
            TileLayer::ClimaCell("wind_gust".into())
        );
        assert_eq!(
            "owm:clouds".parse::<TileLayer>().unwrap(),
            TileLayer::OpenWeatherMap(OwmLayer::Clouds)
        );
        assert!("nonsense".parse::<TileLayer>().is_err());
    }

    #[test]
    fn test_custom_template() {
        let layer: TileLayer = "http://localhost:9000/{z}/{x}/{y}.png".parse().unwrap();
        let url = TileServers::default()
            .url(&layer, &TileCoord::new(3, 4, 5))
            .unwrap();
        assert_eq!(url, "http://localhost:9000/5/3/4.png");
        assert_eq!(layer.to_string(), "http://localhost:9000/{z}/{x}/{y}.png");
    }

    #[test]
    fn test_template_requires_xyz() {
        assert!(UrlTemplate::parse("http://localhost/{z}/{x}.png").is_err());
    }

    #[test]
    fn test_display_round_trips_names() {
        for name in ["osm", "satellite", "owm:precipitation", "climacell:temp"] {
            let layer: TileLayer = name.parse().unwrap();
            assert_eq!(layer.to_string(), name);
        }
    }
}
