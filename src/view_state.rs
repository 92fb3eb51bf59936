use crate::text;
use crate::trip_data::{LatLng, Route, Waypoint, WaypointId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayFilter {
    #[default]
    All,
    Day(u32),
}

/// Everything the user can do to the map, plus the answers coming back from
/// the geolocation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Intent {
    SelectDay(DayFilter),
    SetQuery(String),
    ClearQuery,
    Reset,
    ToggleList,
    FocusWaypoint(WaypointId),
    Locate,
    LocationFound(LatLng),
    LocationFailed(String),
    LocationUnavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Filter state changed (or was re-applied); the full view must be redrawn.
    Rerender { changed: bool },
    Focus(WaypointId),
    RequestLocation,
    ShowLocation(LatLng),
    Notify(String),
    SidebarVisible(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub day: DayFilter,
    /// Normalized form of `query_text`, used for matching.
    pub query: String,
    pub query_text: String,
    pub sidebar_visible: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            day: DayFilter::All,
            query: String::new(),
            query_text: String::new(),
            sidebar_visible: true,
        }
    }
}

impl ViewState {
    pub fn reduce(&mut self, intent: Intent) -> Transition {
        // query_text feeds the panel, so a re-cased query is a change too
        let before = (self.day, self.query_text.clone());
        let rerender = |state: &ViewState| Transition::Rerender {
            changed: state.day != before.0 || state.query_text != before.1,
        };
        match intent {
            Intent::SelectDay(day) => {
                self.day = day;
                rerender(self)
            }
            Intent::SetQuery(query_text) => {
                self.query = text::normalize(&query_text);
                self.query_text = query_text;
                rerender(self)
            }
            Intent::ClearQuery => {
                self.clear_query();
                rerender(self)
            }
            Intent::Reset => {
                self.day = DayFilter::All;
                self.clear_query();
                rerender(self)
            }
            Intent::ToggleList => {
                self.sidebar_visible = !self.sidebar_visible;
                Transition::SidebarVisible(self.sidebar_visible)
            }
            Intent::FocusWaypoint(id) => Transition::Focus(id),
            Intent::Locate => Transition::RequestLocation,
            Intent::LocationFound(position) => Transition::ShowLocation(position),
            Intent::LocationFailed(message) => {
                Transition::Notify(format!("No se pudo obtener ubicación: {message}"))
            }
            Intent::LocationUnavailable => {
                Transition::Notify("Geolocalización no disponible".to_owned())
            }
        }
    }

    fn clear_query(&mut self) {
        self.query.clear();
        self.query_text.clear();
    }

    pub fn matches_day(&self, day: u32) -> bool {
        match self.day {
            DayFilter::All => true,
            DayFilter::Day(selected) => selected == day,
        }
    }

    pub fn matches_waypoint(&self, waypoint: &Waypoint) -> bool {
        self.matches_day(waypoint.day)
            && (self.query.is_empty() || waypoint.normalized_name.contains(&self.query))
    }

    // Routes carry no name, so the text query never hides them.
    pub fn matches_route(&self, route: &Route) -> bool {
        self.matches_day(route.day)
    }
}
