use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

use crate::location::LookupOptions;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub location: LocationConfig,
    pub map: MapConfig,
    pub ui: UiConfig,
    pub data: DataConfig,
}

/// How the user's position gets determined.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    /// IP geolocation.
    Auto,
    /// Use manual_lat/manual_lon as a fixed position.
    Manual,
    /// No position lookups at all.
    Off,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LocationConfig {
    pub mode: LocationMode,
    pub manual_lat: f64, // Latitude used when mode = "manual"
    pub manual_lon: f64, // Longitude used when mode = "manual"
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    pub max_cached_age_ms: u64,
}

impl LocationConfig {
    pub fn lookup_options(&self) -> LookupOptions {
        LookupOptions {
            high_accuracy: self.high_accuracy,
            timeout_ms: self.timeout_ms,
            max_cached_age_ms: self.max_cached_age_ms,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MapConfig {
    pub center_lat: f64, // Map center before a position fix arrives
    pub center_lon: f64,
    pub default_zoom: u32,
    pub focus_zoom: u32, // Zoom once the user has been located
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UiConfig {
    pub list_limit: usize, // Machines shown in the nearest list
    pub default_view: String, // "Dashboard" or "Map"
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DataConfig {
    pub machines_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            location: LocationConfig {
                mode: LocationMode::Auto,
                manual_lat: 37.7749,
                manual_lon: -122.4194,
                high_accuracy: true,
                timeout_ms: 15_000,
                max_cached_age_ms: 300_000,
            },
            map: MapConfig {
                // Geographic center of the contiguous US.
                center_lat: 39.8283,
                center_lon: -98.5795,
                default_zoom: 2,
                focus_zoom: 8,
            },
            ui: UiConfig {
                list_limit: 12,
                default_view: "Dashboard".to_string(),
            },
            data: DataConfig {
                machines_path: "data/machines.json".to_string(),
            },
        }
    }
}

impl Config {
    /// Loads config.toml from the root directory.
    /// If it doesn't exist, creates a default one.
    pub fn load() -> Self {
        let config_path = "config.toml";

        if let Ok(content) = fs::read_to_string(config_path) {
            match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => warn!("Failed to parse config.toml: {}. Using defaults.", e),
            }
        }

        let default_config = Config::default();

        // Save default config to disk for the user to edit later
        let toml_string = toml::to_string_pretty(&default_config).unwrap();
        if fs::write(config_path, toml_string).is_err() {
            warn!("Could not write default config.toml to disk.");
        }

        info!("Loaded default configuration.");
        default_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let config = Config::default();
        assert_eq!(config.location.mode, LocationMode::Auto);
        assert!(config.location.high_accuracy);
        assert_eq!(config.location.timeout_ms, 15_000);
        assert_eq!(config.location.max_cached_age_ms, 300_000);
        assert_eq!(config.ui.list_limit, 12);
        assert_eq!(config.data.machines_path, "data/machines.json");
    }

    #[test]
    fn lookup_options_mirror_the_location_section() {
        let mut config = Config::default();
        config.location.high_accuracy = false;
        config.location.timeout_ms = 2_000;

        let options = config.location.lookup_options();
        assert!(!options.high_accuracy);
        assert_eq!(options.timeout_ms, 2_000);
        assert_eq!(options.max_cached_age_ms, 300_000);
    }

    #[test]
    fn config_survives_a_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).expect("serializable");
        let parsed: Config = toml::from_str(&text).expect("parseable");
        assert_eq!(parsed.location.mode, config.location.mode);
        assert_eq!(parsed.map.default_zoom, config.map.default_zoom);
        assert_eq!(parsed.ui.default_view, config.ui.default_view);
    }

    #[test]
    fn off_mode_parses_from_toml() {
        let text = r#"
            [location]
            mode = "off"
            manual_lat = 30.0
            manual_lon = -97.0
            high_accuracy = true
            timeout_ms = 15000
            max_cached_age_ms = 300000

            [map]
            center_lat = 39.8283
            center_lon = -98.5795
            default_zoom = 2
            focus_zoom = 8

            [ui]
            list_limit = 12
            default_view = "Dashboard"

            [data]
            machines_path = "data/machines.json"
        "#;
        let parsed: Config = toml::from_str(text).expect("parseable");
        assert_eq!(parsed.location.mode, LocationMode::Off);
    }
}
