//! API credentials for upstream services.

use std::fmt;

/// Environment variable holding the ClimaCell key.
pub const ENV_CLIMACELL_KEY: &str = "WEATHER_KEY";
/// Environment variable holding the OpenCage key.
pub const ENV_OPENCAGE_KEY: &str = "GEOCODING_KEY";
/// Environment variable holding the OpenWeatherMap key.
pub const ENV_OPENWEATHERMAP_KEY: &str = "OWM_API_KEY";
/// Environment variable holding the Weather Underground key.
pub const ENV_WUNDERGROUND_KEY: &str = "WUNDERGROUND_API_KEY";

/// API keys, each optional. Features whose key is missing are disabled.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub climacell: Option<String>,
    pub opencage: Option<String>,
    pub openweathermap: Option<String>,
    pub wunderground: Option<String>,
}

impl Credentials {
    /// Overlays keys found through `lookup` (normally the process
    /// environment) on top of the current values. Empty values are ignored.
    pub fn overlay_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let pairs: [(&mut Option<String>, &str); 4] = [
            (&mut self.climacell, ENV_CLIMACELL_KEY),
            (&mut self.opencage, ENV_OPENCAGE_KEY),
            (&mut self.openweathermap, ENV_OPENWEATHERMAP_KEY),
            (&mut self.wunderground, ENV_WUNDERGROUND_KEY),
        ];
        for (slot, var) in pairs {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value.trim().to_string());
            }
        }
    }
}

// Keys never appear in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(key: &Option<String>) -> &'static str {
            if key.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("Credentials")
            .field("climacell", &mask(&self.climacell))
            .field("opencage", &mask(&self.opencage))
            .field("openweathermap", &mask(&self.openweathermap))
            .field("wunderground", &mask(&self.wunderground))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_overlay_env_replaces_set_values() {
        let env: HashMap<&str, &str> = [("WEATHER_KEY", " cc "), ("OWM_API_KEY", "")]
            .into_iter()
            .collect();
        let mut credentials = Credentials {
            openweathermap: Some("from-file".into()),
            ..Default::default()
        };

        credentials.overlay_env(|var| env.get(var).map(|v| v.to_string()));

        assert_eq!(credentials.climacell.as_deref(), Some("cc"));
        assert_eq!(credentials.openweathermap.as_deref(), Some("from-file"));
        assert_eq!(credentials.opencage, None);
    }

    #[test]
    fn test_debug_masks_keys() {
        let credentials = Credentials {
            climacell: Some("secret".into()),
            ..Default::default()
        };
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<set>"));
    }
}
