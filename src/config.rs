use crate::trip_data::LatLng;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeolocationOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u32,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayerOptions {
    pub url_template: String,
    pub max_zoom: u8,
    pub attribution: String,
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_owned(),
            max_zoom: 19,
            attribution: "&copy; OpenStreetMap".to_owned(),
        }
    }
}

/// Runtime settings. Every field is optional in the JSON file and falls back
/// to the values the trip was designed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub kml_path: PathBuf,
    pub initial_center: LatLng,
    pub initial_zoom: u8,
    pub fit_padding: [u32; 2],
    pub focus_zoom: u8,
    pub locate_zoom: u8,
    pub maps_search_url: String,
    pub tile_layer: TileLayerOptions,
    pub geolocation: GeolocationOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kml_path: PathBuf::from("assets/dolomitas.kml"),
            initial_center: LatLng {
                latitude: 46.56,
                longitude: 11.95,
            },
            initial_zoom: 9,
            fit_padding: [30, 30],
            focus_zoom: 14,
            locate_zoom: 13,
            maps_search_url: "https://www.google.com/maps/search/?api=1&query=".to_owned(),
            tile_layer: TileLayerOptions::default(),
            geolocation: GeolocationOptions::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| anyhow!("failed to open config {}: {e}", path.display()))?;
        let config: Config = serde_json::from_reader(BufReader::new(file))?;
        if config.initial_zoom > config.tile_layer.max_zoom {
            bail!(
                "initial_zoom {} exceeds the tile layer max zoom {}",
                config.initial_zoom,
                config.tile_layer.max_zoom
            );
        }
        Ok(config)
    }

    pub fn maps_link(&self, position: &LatLng) -> String {
        format!(
            "{}{},{}",
            self.maps_search_url, position.latitude, position.longitude
        )
    }
}
