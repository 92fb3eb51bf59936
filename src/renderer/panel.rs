use super::draw::DeepLink;
use crate::trip_data::{LatLng, WaypointId};
use crate::view_state::Intent;
use serde::Serialize;

pub const ALL_DAYS_LABEL: &str = "Todos";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    /// `warnings` lists the records dropped while reading the trip, one per line.
    Ready {
        waypoints: usize,
        routes: usize,
        warnings: Option<String>,
    },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayChip {
    pub label: String,
    pub color: Option<&'static str>,
    pub active: bool,
    pub intent: Intent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub day: u32,
    pub label: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListEntry {
    pub id: WaypointId,
    pub name: String,
    pub position: LatLng,
    pub coordinates: String,
    pub center: Intent,
    pub link: DeepLink,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListGroup {
    pub day: u32,
    pub label: String,
    pub color: &'static str,
    pub entries: Vec<ListEntry>,
}

/// Content for the chips, legend and sidebar list containers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub status: LoadStatus,
    pub search_text: String,
    pub sidebar_visible: bool,
    pub chips: Vec<DayChip>,
    pub legend: Vec<LegendEntry>,
    pub list: Vec<ListGroup>,
}

impl Panel {
    pub fn active_chip(&self) -> Option<&DayChip> {
        self.chips.iter().find(|chip| chip.active)
    }

    pub fn entry_names(&self) -> Vec<&str> {
        self.list
            .iter()
            .flat_map(|group| group.entries.iter().map(|e| e.name.as_str()))
            .collect()
    }
}
