#![allow(dead_code)]

use dolomitas_map_core::config::Config;
use dolomitas_map_core::kml_ingest;
use dolomitas_map_core::renderer::draw::DrawInstruction;
use dolomitas_map_core::renderer::{MapRenderer, Update};
use dolomitas_map_core::trip_data::TripData;

pub fn data_path(name: &str) -> String {
    format!("./tests/data/{name}")
}

pub fn load_trip(name: &str) -> TripData {
    let (trip, _warnings) = kml_ingest::load_kml(data_path(name)).unwrap();
    trip
}

pub fn renderer_for(name: &str) -> MapRenderer {
    MapRenderer::new(load_trip(name), Config::default())
}

pub fn visible_names(map_renderer: &MapRenderer) -> Vec<String> {
    map_renderer
        .visible_waypoints()
        .into_iter()
        .map(|(_, w)| w.name.clone())
        .collect()
}

pub fn marker_names(update: &Update) -> Vec<String> {
    update
        .draw
        .iter()
        .filter_map(|d| match d {
            DrawInstruction::Marker { popup, .. } => Some(popup.title.clone()),
            _ => None,
        })
        .collect()
}

pub fn polyline_count(update: &Update) -> usize {
    update
        .draw
        .iter()
        .filter(|d| matches!(d, DrawInstruction::Polyline { .. }))
        .count()
}

pub fn has_fit_bounds(update: &Update) -> bool {
    update
        .draw
        .iter()
        .any(|d| matches!(d, DrawInstruction::FitBounds { .. }))
}
