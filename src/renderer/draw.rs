use crate::config::TileLayerOptions;
use crate::palette::PinIcon;
use crate::text::escape_html;
use crate::trip_data::{BoundingBox, LatLng, WaypointId};
use serde::Serialize;

pub const ROUTE_WEIGHT: u32 = 3;
pub const ROUTE_OPACITY: f64 = 0.9;
pub const MAPS_LINK_LABEL: &str = "🧭 Abrir en Google Maps";
pub const LOCATION_POPUP: &str = "Estás aquí";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: u32,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepLink {
    pub url: String,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub title: String,
    pub description_html: String,
    pub link: DeepLink,
}

impl Popup {
    /// Title is plain text and gets escaped; the description is HTML taken
    /// as-is from the trusted trip document.
    pub fn to_html(&self) -> String {
        format!(
            "<b>{}</b><br>{}<br><br><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
            escape_html(&self.title),
            self.description_html,
            escape_html(&self.link.url),
            self.link.label
        )
    }
}

/// Neutral map widget command. Adapters replay these in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawInstruction {
    TileLayer(TileLayerOptions),
    ClearLayers,
    Polyline {
        day: u32,
        points: Vec<LatLng>,
        style: LineStyle,
    },
    Marker {
        id: WaypointId,
        position: LatLng,
        icon: PinIcon,
        popup: Popup,
        popup_html: String,
    },
    FitBounds {
        bounds: BoundingBox,
        padding: [u32; 2],
    },
    SetView {
        center: LatLng,
        zoom: u8,
    },
    OpenPopup {
        id: WaypointId,
    },
    LocationMarker {
        position: LatLng,
        popup_text: &'static str,
        open_popup: bool,
    },
}
