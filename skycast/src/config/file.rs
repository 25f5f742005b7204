//! The INI configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;

use crate::compose::Opacity;
use crate::provider::{
    UrlTemplate, DEFAULT_CLIMACELL_URL, DEFAULT_OPENWEATHERMAP_URL, DEFAULT_OSM_URL,
    DEFAULT_SATELLITE_URL,
};

use super::credentials::Credentials;
use super::error::ConfigError;
use super::keys::ConfigKey;
use super::config_file_path;

/// Default listen address for the HTTP endpoint.
pub const DEFAULT_BIND: &str = "0.0.0.0:8111";

/// Default base URL used in replies that link to generated images.
pub const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:8111/";

/// Default zoom for weather overlays.
pub const DEFAULT_ZOOM: u8 = 7;

/// Default number of generated images kept for serving.
pub const DEFAULT_IMAGE_CAPACITY: usize = 256;

/// Default ZIP code table.
pub const DEFAULT_ZIP_CSV: &str = "zip-data.csv";

/// `[server]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind: String,
    pub public_url: String,
    /// Generated images kept before the oldest is dropped.
    pub image_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            image_capacity: DEFAULT_IMAGE_CAPACITY,
        }
    }
}

/// `[tiles]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSettings {
    pub zoom: u8,
    pub opacity: Opacity,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub osm_url: UrlTemplate,
    pub climacell_url: UrlTemplate,
    pub openweathermap_url: UrlTemplate,
    pub satellite_url: UrlTemplate,
}

impl TileSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TileSettings {
    fn default() -> Self {
        let template = UrlTemplate::from_default;
        Self {
            zoom: DEFAULT_ZOOM,
            opacity: Opacity::OPAQUE,
            timeout_secs: crate::provider::DEFAULT_TIMEOUT_SECS,
            max_attempts: 1,
            osm_url: template(DEFAULT_OSM_URL),
            climacell_url: template(DEFAULT_CLIMACELL_URL),
            openweathermap_url: template(DEFAULT_OPENWEATHERMAP_URL),
            satellite_url: template(DEFAULT_SATELLITE_URL),
        }
    }
}

/// `[data]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub zip_csv: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            zip_csv: PathBuf::from(DEFAULT_ZIP_CSV),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    /// Directory for a daily rolling log file; stderr only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// Contents of `~/.skycast/config.ini`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub keys: Credentials,
    pub tiles: TileSettings,
    pub data: DataSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Loads the file at the default path, or defaults if it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads and validates the file at `path`. Keys absent from the file keep
    /// their defaults; unknown keys are ignored.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(e) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;
        Self::from_ini(&ini)
    }

    /// Builds a config from parsed INI data.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Serialises every non-empty setting.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini
    }

    /// Writes the file to the default path, creating its directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.server.bind, "0.0.0.0:8111");
        assert_eq!(config.server.image_capacity, DEFAULT_IMAGE_CAPACITY);
        assert_eq!(config.tiles.zoom, 7);
        assert_eq!(config.tiles.opacity, Opacity::OPAQUE);
        assert_eq!(config.tiles.timeout(), Duration::from_secs(10));
        assert_eq!(config.tiles.max_attempts, 1);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.keys, Credentials::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[tiles]\nzoom = 9\nopacity = 0.7\n\n[keys]\nclimacell = abc").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.tiles.zoom, 9);
        assert_eq!(config.tiles.opacity.value(), 0.7);
        assert_eq!(config.keys.climacell.as_deref(), Some("abc"));
        assert_eq!(config.server.bind, DEFAULT_BIND);
    }

    #[test]
    fn test_invalid_value_names_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[tiles]\nzoom = 42\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("tiles.zoom"), "{}", err);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let result = ConfigFile::load_from(&dir.path().join("nope.ini"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.tiles.zoom = 5;
        config.server.image_capacity = 32;
        config.keys.openweathermap = Some("owm".into());
        config.logging.directory = Some(dir.path().join("logs"));
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unset_keys_not_written() {
        let ini = ConfigFile::default().to_ini();
        assert!(ini.get_from(Some("keys"), "climacell").is_none());
        assert_eq!(ini.get_from(Some("tiles"), "zoom"), Some("7"));
    }
}
