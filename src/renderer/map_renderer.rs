use super::draw::{
    DeepLink, DrawInstruction, LineStyle, Popup, LOCATION_POPUP, MAPS_LINK_LABEL, ROUTE_OPACITY,
    ROUTE_WEIGHT,
};
use super::panel::{
    DayChip, LegendEntry, ListEntry, ListGroup, LoadStatus, Panel, ALL_DAYS_LABEL,
};
use crate::config::{Config, GeolocationOptions};
use crate::kml_ingest;
use crate::palette::{color_for_day, day_label, PinIcon};
use crate::trip_data::{BoundingBox, Route, TripData, Waypoint, WaypointId};
use crate::view_state::{DayFilter, Intent, Transition, ViewState};
use itertools::Itertools;
use serde::Serialize;
use std::cmp::Ordering;

/// Side effects the adapter has to carry out besides drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    RequestLocation(GeolocationOptions),
    /// Non-blocking message, e.g. a toast.
    Notify { message: String },
    SetSidebarVisible { visible: bool },
}

/// Result of a render or of a dispatched intent. `panel` is only present when
/// the chips, legend or list need rebuilding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    pub version: String,
    pub draw: Vec<DrawInstruction>,
    pub panel: Option<Panel>,
    pub effects: Vec<Effect>,
}

pub struct MapRenderer {
    trip: TripData,
    state: ViewState,
    config: Config,
    load_error: Option<String>,
    load_warnings: Option<String>,
    version: u64,
}

impl MapRenderer {
    pub fn new(trip: TripData, config: Config) -> Self {
        Self {
            trip,
            state: ViewState::default(),
            config,
            load_error: None,
            load_warnings: None,
            version: 0,
        }
    }

    /// An empty, still usable map that reports `message` as its load status.
    pub fn failed(message: impl Into<String>, config: Config) -> Self {
        Self {
            load_error: Some(message.into()),
            ..Self::new(TripData::default(), config)
        }
    }

    /// Loads the trip document named in `config`. Never fails: read or parse
    /// errors end up in the panel status.
    pub fn load(config: Config) -> Self {
        match kml_ingest::load_kml(&config.kml_path) {
            Ok((trip, warnings)) => Self {
                load_warnings: warnings,
                ..Self::new(trip, config)
            },
            Err(e) => {
                error!(
                    "failed to load trip from {}: {e:?}",
                    config.kml_path.display()
                );
                Self::failed(format!("No se pudo cargar el itinerario: {e}"), config)
            }
        }
    }

    pub fn trip(&self) -> &TripData {
        &self.trip
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Matching waypoints, in ingestion order.
    pub fn visible_waypoints(&self) -> Vec<(WaypointId, &Waypoint)> {
        self.trip
            .waypoints()
            .iter()
            .enumerate()
            .filter(|(_, w)| self.state.matches_waypoint(w))
            .collect()
    }

    pub fn visible_routes(&self) -> Vec<&Route> {
        self.trip
            .routes()
            .iter()
            .filter(|r| self.state.matches_route(r))
            .collect()
    }

    pub fn visible_bounds(&self) -> Option<BoundingBox> {
        let route_boxes = self.visible_routes().into_iter().map(|r| r.bounding_box);
        let point_boxes = self
            .visible_waypoints()
            .into_iter()
            .map(|(_, w)| BoundingBox::from_point(&w.position));
        route_boxes.chain(point_boxes).reduce(|mut acc, bbox| {
            acc.union(&bbox);
            acc
        })
    }

    /// Map setup issued once, before the first render.
    pub fn initial_view(&self) -> Vec<DrawInstruction> {
        vec![
            DrawInstruction::TileLayer(self.config.tile_layer.clone()),
            DrawInstruction::SetView {
                center: self.config.initial_center,
                zoom: self.config.initial_zoom,
            },
        ]
    }

    pub fn render(&self) -> Update {
        Update {
            version: self.get_version_string(),
            draw: self.draw_instructions(),
            panel: Some(self.panel()),
            effects: Vec::new(),
        }
    }

    fn draw_instructions(&self) -> Vec<DrawInstruction> {
        let mut draw = vec![DrawInstruction::ClearLayers];
        draw.extend(
            self.visible_routes()
                .into_iter()
                .map(|route| DrawInstruction::Polyline {
                    day: route.day,
                    points: route.points.clone(),
                    style: LineStyle {
                        color: color_for_day(route.day),
                        weight: ROUTE_WEIGHT,
                        opacity: ROUTE_OPACITY,
                    },
                }),
        );
        draw.extend(self.visible_waypoints().into_iter().map(|(id, w)| {
            let popup = Popup {
                title: w.name.clone(),
                description_html: w.description.clone(),
                link: self.maps_link(w),
            };
            DrawInstruction::Marker {
                id,
                position: w.position,
                icon: PinIcon::for_day(w.day),
                popup_html: popup.to_html(),
                popup,
            }
        }));
        // nothing matched: keep whatever the user is looking at
        if let Some(bounds) = self.visible_bounds() {
            draw.push(DrawInstruction::FitBounds {
                bounds,
                padding: self.config.fit_padding,
            });
        }
        draw
    }

    fn maps_link(&self, waypoint: &Waypoint) -> DeepLink {
        DeepLink {
            url: self.config.maps_link(&waypoint.position),
            label: MAPS_LINK_LABEL,
        }
    }

    pub fn panel(&self) -> Panel {
        let status = match &self.load_error {
            Some(message) => LoadStatus::Failed {
                message: message.clone(),
            },
            None => LoadStatus::Ready {
                waypoints: self.trip.waypoints().len(),
                routes: self.trip.routes().len(),
                warnings: self.load_warnings.clone(),
            },
        };

        let mut chips = vec![DayChip {
            label: ALL_DAYS_LABEL.to_owned(),
            color: None,
            active: self.state.day == DayFilter::All,
            intent: Intent::SelectDay(DayFilter::All),
        }];
        chips.extend(self.trip.days().map(|day| DayChip {
            label: day_label(day),
            color: Some(color_for_day(day)),
            active: self.state.day == DayFilter::Day(day),
            intent: Intent::SelectDay(DayFilter::Day(day)),
        }));

        let legend = self
            .trip
            .days()
            .map(|day| LegendEntry {
                day,
                label: day_label(day),
                color: color_for_day(day),
            })
            .collect();

        Panel {
            status,
            search_text: self.state.query_text.clone(),
            sidebar_visible: self.state.sidebar_visible,
            chips,
            legend,
            list: self.list_groups(),
        }
    }

    fn list_groups(&self) -> Vec<ListGroup> {
        let mut visible = self.visible_waypoints();
        visible.sort_by(|(_, a), (_, b)| a.day.cmp(&b.day).then_with(|| collate(a, b)));
        let chunks = visible.into_iter().chunk_by(|(_, w)| w.day);
        let groups = chunks
            .into_iter()
            .map(|(day, group)| ListGroup {
                day,
                label: day_label(day),
                color: color_for_day(day),
                entries: group
                    .map(|(id, w)| ListEntry {
                        id,
                        name: w.name.clone(),
                        position: w.position,
                        coordinates: format!(
                            "{:.5}, {:.5}",
                            w.position.latitude, w.position.longitude
                        ),
                        center: Intent::FocusWaypoint(id),
                        link: self.maps_link(w),
                    })
                    .collect(),
            })
            .collect();
        groups
    }

    pub fn dispatch(&mut self, intent: Intent) -> Update {
        debug!("dispatching {intent:?}");
        match self.state.reduce(intent) {
            Transition::Rerender { changed } => {
                if changed {
                    self.bump_version();
                }
                self.render()
            }
            Transition::Focus(id) => self.focus(id),
            Transition::RequestLocation => {
                self.effects_only(vec![Effect::RequestLocation(
                    self.config.geolocation.clone(),
                )])
            }
            Transition::ShowLocation(position) => self.draw_only(vec![
                DrawInstruction::LocationMarker {
                    position,
                    popup_text: LOCATION_POPUP,
                    open_popup: true,
                },
                DrawInstruction::SetView {
                    center: position,
                    zoom: self.config.locate_zoom,
                },
            ]),
            Transition::Notify(message) => {
                info!("notifying user: {message}");
                self.effects_only(vec![Effect::Notify { message }])
            }
            Transition::SidebarVisible(visible) => {
                self.bump_version();
                self.effects_only(vec![Effect::SetSidebarVisible { visible }])
            }
        }
    }

    fn focus(&self, id: WaypointId) -> Update {
        match self
            .trip
            .waypoint(id)
            .filter(|w| self.state.matches_waypoint(w))
        {
            Some(w) => self.draw_only(vec![
                DrawInstruction::SetView {
                    center: w.position,
                    zoom: self.config.focus_zoom,
                },
                DrawInstruction::OpenPopup { id },
            ]),
            None => {
                warn!("ignoring focus on waypoint {id}: unknown or filtered out");
                self.draw_only(Vec::new())
            }
        }
    }

    fn draw_only(&self, draw: Vec<DrawInstruction>) -> Update {
        Update {
            version: self.get_version_string(),
            draw,
            panel: None,
            effects: Vec::new(),
        }
    }

    fn effects_only(&self, effects: Vec<Effect>) -> Update {
        Update {
            version: self.get_version_string(),
            draw: Vec::new(),
            panel: None,
            effects,
        }
    }

    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub fn get_current_version(&self) -> u64 {
        self.version
    }

    pub fn get_version_string(&self) -> String {
        format!("\"{:x}\"", self.version)
    }

    pub fn parse_version_string(version_str: &str) -> Option<u64> {
        let cleaned = version_str.trim_matches('"');
        u64::from_str_radix(cleaned, 16).ok()
    }

    /// Full render, unless the client already holds the current version.
    pub fn render_if_changed(&self, client_version: Option<&str>) -> Option<Update> {
        match client_version {
            Some(v_str) if Self::parse_version_string(v_str) == Some(self.version) => None,
            _ => Some(self.render()),
        }
    }
}

// Stand-in for locale collation: accent and case blind first, raw name breaks ties.
fn collate(a: &Waypoint, b: &Waypoint) -> Ordering {
    a.normalized_name
        .cmp(&b.normalized_name)
        .then_with(|| a.name.cmp(&b.name))
}
