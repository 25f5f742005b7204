//! Addressable configuration keys (`section.key`).

use std::path::PathBuf;
use std::str::FromStr;

use crate::compose::Opacity;
use crate::coord::MAX_ZOOM;
use crate::provider::UrlTemplate;

use super::error::ConfigError;
use super::file::ConfigFile;

/// Every setting that can be read or written by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServerBind,
    ServerPublicUrl,
    ServerImageCapacity,
    KeysClimacell,
    KeysOpencage,
    KeysOpenweathermap,
    KeysWunderground,
    TilesZoom,
    TilesOpacity,
    TilesTimeout,
    TilesMaxAttempts,
    TilesOsmUrl,
    TilesClimacellUrl,
    TilesOpenweathermapUrl,
    TilesSatelliteUrl,
    DataZipCsv,
    LoggingLevel,
    LoggingDirectory,
}

const ALL_KEYS: [ConfigKey; 18] = [
    ConfigKey::ServerBind,
    ConfigKey::ServerPublicUrl,
    ConfigKey::ServerImageCapacity,
    ConfigKey::KeysClimacell,
    ConfigKey::KeysOpencage,
    ConfigKey::KeysOpenweathermap,
    ConfigKey::KeysWunderground,
    ConfigKey::TilesZoom,
    ConfigKey::TilesOpacity,
    ConfigKey::TilesTimeout,
    ConfigKey::TilesMaxAttempts,
    ConfigKey::TilesOsmUrl,
    ConfigKey::TilesClimacellUrl,
    ConfigKey::TilesOpenweathermapUrl,
    ConfigKey::TilesSatelliteUrl,
    ConfigKey::DataZipCsv,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingDirectory,
];

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    /// INI section holding this key.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::ServerBind
            | ConfigKey::ServerPublicUrl
            | ConfigKey::ServerImageCapacity => "server",
            ConfigKey::KeysClimacell
            | ConfigKey::KeysOpencage
            | ConfigKey::KeysOpenweathermap
            | ConfigKey::KeysWunderground => "keys",
            ConfigKey::TilesZoom
            | ConfigKey::TilesOpacity
            | ConfigKey::TilesTimeout
            | ConfigKey::TilesMaxAttempts
            | ConfigKey::TilesOsmUrl
            | ConfigKey::TilesClimacellUrl
            | ConfigKey::TilesOpenweathermapUrl
            | ConfigKey::TilesSatelliteUrl => "tiles",
            ConfigKey::DataZipCsv => "data",
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => "logging",
        }
    }

    /// Key name within its section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::ServerBind => "bind",
            ConfigKey::ServerPublicUrl => "public_url",
            ConfigKey::ServerImageCapacity => "image_capacity",
            ConfigKey::KeysClimacell => "climacell",
            ConfigKey::KeysOpencage => "opencage",
            ConfigKey::KeysOpenweathermap => "openweathermap",
            ConfigKey::KeysWunderground => "wunderground",
            ConfigKey::TilesZoom => "zoom",
            ConfigKey::TilesOpacity => "opacity",
            ConfigKey::TilesTimeout => "timeout",
            ConfigKey::TilesMaxAttempts => "max_attempts",
            ConfigKey::TilesOsmUrl => "osm_url",
            ConfigKey::TilesClimacellUrl => "climacell_url",
            ConfigKey::TilesOpenweathermapUrl => "openweathermap_url",
            ConfigKey::TilesSatelliteUrl => "satellite_url",
            ConfigKey::DataZipCsv => "zip_csv",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Full dotted name, e.g. `tiles.zoom`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Whether the value is a secret that should be masked when listed.
    pub fn is_secret(&self) -> bool {
        self.section() == "keys"
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        fn opt(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }
        match self {
            ConfigKey::ServerBind => config.server.bind.clone(),
            ConfigKey::ServerPublicUrl => config.server.public_url.clone(),
            ConfigKey::ServerImageCapacity => config.server.image_capacity.to_string(),
            ConfigKey::KeysClimacell => opt(&config.keys.climacell),
            ConfigKey::KeysOpencage => opt(&config.keys.opencage),
            ConfigKey::KeysOpenweathermap => opt(&config.keys.openweathermap),
            ConfigKey::KeysWunderground => opt(&config.keys.wunderground),
            ConfigKey::TilesZoom => config.tiles.zoom.to_string(),
            ConfigKey::TilesOpacity => config.tiles.opacity.to_string(),
            ConfigKey::TilesTimeout => config.tiles.timeout_secs.to_string(),
            ConfigKey::TilesMaxAttempts => config.tiles.max_attempts.to_string(),
            ConfigKey::TilesOsmUrl => config.tiles.osm_url.to_string(),
            ConfigKey::TilesClimacellUrl => config.tiles.climacell_url.to_string(),
            ConfigKey::TilesOpenweathermapUrl => config.tiles.openweathermap_url.to_string(),
            ConfigKey::TilesSatelliteUrl => config.tiles.satellite_url.to_string(),
            ConfigKey::DataZipCsv => config.data.zip_csv.display().to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parses and stores `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let name = self.name();
        let value = value.trim();
        let key_value = || {
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        };

        match self {
            ConfigKey::ServerBind => {
                value
                    .parse::<std::net::SocketAddr>()
                    .map_err(|e| ConfigError::invalid(&name, value, e.to_string()))?;
                config.server.bind = value.to_string();
            }
            ConfigKey::ServerPublicUrl => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(ConfigError::invalid(&name, value, "must be an http(s) URL"));
                }
                config.server.public_url = value.to_string();
            }
            ConfigKey::ServerImageCapacity => {
                let capacity: usize = value
                    .parse()
                    .map_err(|_| ConfigError::invalid(&name, value, "not a number"))?;
                if capacity == 0 {
                    return Err(ConfigError::invalid(&name, value, "must be at least 1"));
                }
                config.server.image_capacity = capacity;
            }
            ConfigKey::KeysClimacell => config.keys.climacell = key_value(),
            ConfigKey::KeysOpencage => config.keys.opencage = key_value(),
            ConfigKey::KeysOpenweathermap => config.keys.openweathermap = key_value(),
            ConfigKey::KeysWunderground => config.keys.wunderground = key_value(),
            ConfigKey::TilesZoom => {
                let zoom: u8 = value
                    .parse()
                    .map_err(|_| ConfigError::invalid(&name, value, "not a number"))?;
                if zoom > MAX_ZOOM {
                    return Err(ConfigError::invalid(
                        &name,
                        value,
                        format!("must be at most {}", MAX_ZOOM),
                    ));
                }
                config.tiles.zoom = zoom;
            }
            ConfigKey::TilesOpacity => {
                config.tiles.opacity = value
                    .parse::<Opacity>()
                    .map_err(|e| ConfigError::invalid(&name, value, e.to_string()))?;
            }
            ConfigKey::TilesTimeout => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| ConfigError::invalid(&name, value, "not a number of seconds"))?;
                if secs == 0 {
                    return Err(ConfigError::invalid(&name, value, "must be positive"));
                }
                config.tiles.timeout_secs = secs;
            }
            ConfigKey::TilesMaxAttempts => {
                let attempts: u32 = value
                    .parse()
                    .map_err(|_| ConfigError::invalid(&name, value, "not a number"))?;
                if attempts == 0 {
                    return Err(ConfigError::invalid(&name, value, "must be at least 1"));
                }
                config.tiles.max_attempts = attempts;
            }
            ConfigKey::TilesOsmUrl => config.tiles.osm_url = parse_template(&name, value)?,
            ConfigKey::TilesClimacellUrl => {
                config.tiles.climacell_url = parse_template(&name, value)?
            }
            ConfigKey::TilesOpenweathermapUrl => {
                config.tiles.openweathermap_url = parse_template(&name, value)?
            }
            ConfigKey::TilesSatelliteUrl => {
                config.tiles.satellite_url = parse_template(&name, value)?
            }
            ConfigKey::DataZipCsv => config.data.zip_csv = PathBuf::from(value),
            ConfigKey::LoggingLevel => {
                let level = value.to_ascii_lowercase();
                if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
                    return Err(ConfigError::invalid(
                        &name,
                        value,
                        "expected trace, debug, info, warn or error",
                    ));
                }
                config.logging.level = level;
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = key_value().map(PathBuf::from);
            }
        }
        Ok(())
    }
}

fn parse_template(name: &str, value: &str) -> Result<UrlTemplate, ConfigError> {
    UrlTemplate::parse(value).map_err(|e| ConfigError::invalid(name, value, e.to_string()))
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_names() {
        assert_eq!("tiles.zoom".parse::<ConfigKey>().unwrap(), ConfigKey::TilesZoom);
        assert_eq!(
            "Keys.OpenCage".parse::<ConfigKey>().unwrap(),
            ConfigKey::KeysOpencage
        );
        assert!(matches!(
            "tiles.colour".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_every_key_round_trips_through_name() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();
        ConfigKey::TilesZoom.set(&mut config, "9").unwrap();
        ConfigKey::TilesOpacity.set(&mut config, "0.7").unwrap();
        ConfigKey::KeysClimacell.set(&mut config, "abc").unwrap();
        ConfigKey::ServerImageCapacity.set(&mut config, "16").unwrap();

        assert_eq!(ConfigKey::TilesZoom.get(&config), "9");
        assert_eq!(config.server.image_capacity, 16);
        assert_eq!(ConfigKey::TilesOpacity.get(&config), "0.7");
        assert_eq!(config.keys.climacell.as_deref(), Some("abc"));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::TilesZoom.set(&mut config, "20").is_err());
        assert!(ConfigKey::TilesZoom.set(&mut config, "seven").is_err());
        assert!(ConfigKey::TilesOpacity.set(&mut config, "1.5").is_err());
        assert!(ConfigKey::TilesTimeout.set(&mut config, "0").is_err());
        assert!(ConfigKey::TilesMaxAttempts.set(&mut config, "0").is_err());
        assert!(ConfigKey::ServerImageCapacity.set(&mut config, "0").is_err());
        assert!(ConfigKey::ServerBind.set(&mut config, "localhost").is_err());
        assert!(ConfigKey::ServerPublicUrl.set(&mut config, "ftp://x/").is_err());
        assert!(ConfigKey::TilesOsmUrl.set(&mut config, "https://t/{z}/{x}.png").is_err());
        assert!(ConfigKey::LoggingLevel.set(&mut config, "loud").is_err());
        assert_eq!(config.tiles.zoom, 7);
    }

    #[test]
    fn test_empty_key_clears() {
        let mut config = ConfigFile::default();
        ConfigKey::KeysWunderground.set(&mut config, "abc").unwrap();
        ConfigKey::KeysWunderground.set(&mut config, "  ").unwrap();
        assert_eq!(config.keys.wunderground, None);
    }

    #[test]
    fn test_secret_keys() {
        assert!(ConfigKey::KeysOpenweathermap.is_secret());
        assert!(!ConfigKey::TilesZoom.is_secret());
    }
}
