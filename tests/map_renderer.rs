pub mod test_utils;

use dolomitas_map_core::config::Config;
use dolomitas_map_core::renderer::draw::DrawInstruction;
use dolomitas_map_core::renderer::panel::LoadStatus;
use dolomitas_map_core::renderer::{Effect, MapRenderer};
use dolomitas_map_core::trip_data::{LatLng, TripData};
use dolomitas_map_core::view_state::{DayFilter, Intent};
use std::path::PathBuf;

#[test]
fn full_view_returns_every_waypoint() {
    let map_renderer = test_utils::renderer_for("two_days.kml");
    let all: Vec<&str> = map_renderer
        .trip()
        .waypoints()
        .iter()
        .map(|w| w.name.as_str())
        .collect();
    assert_eq!(test_utils::visible_names(&map_renderer), all);
    assert_eq!(map_renderer.visible_routes().len(), 1);

    let update = map_renderer.render();
    assert_eq!(update.draw[0], DrawInstruction::ClearLayers);
    assert_eq!(test_utils::polyline_count(&update), 1);
    assert_eq!(
        test_utils::marker_names(&update),
        vec!["Rifugio A", "Rifugio B"]
    );
    assert!(test_utils::has_fit_bounds(&update));
}

#[test]
fn select_day_one() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");
    let update = map_renderer.dispatch(Intent::SelectDay(DayFilter::Day(1)));

    assert_eq!(test_utils::visible_names(&map_renderer), vec!["Rifugio A"]);
    assert_eq!(test_utils::polyline_count(&update), 1);
    assert_eq!(test_utils::marker_names(&update), vec!["Rifugio A"]);

    let panel = update.panel.unwrap();
    assert_eq!(panel.active_chip().unwrap().label, "Día 1");
    assert_eq!(panel.chips.iter().filter(|c| c.active).count(), 1);
    assert_eq!(panel.entry_names(), vec!["Rifugio A"]);
}

#[test]
fn routes_ignore_text_query() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");
    let update = map_renderer.dispatch(Intent::SetQuery("rifugio b".to_owned()));
    assert_eq!(test_utils::marker_names(&update), vec!["Rifugio B"]);
    // the day 1 route stays, only the day filter hides routes
    assert_eq!(test_utils::polyline_count(&update), 1);
}

#[test]
fn search_scenarios() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");

    map_renderer.dispatch(Intent::SetQuery("rifugio".to_owned()));
    assert_eq!(
        test_utils::visible_names(&map_renderer),
        vec!["Rifugio A", "Rifugio B"]
    );

    map_renderer.dispatch(Intent::SetQuery("RIFUGIO B".to_owned()));
    assert_eq!(test_utils::visible_names(&map_renderer), vec!["Rifugio B"]);

    map_renderer.dispatch(Intent::SelectDay(DayFilter::Day(1)));
    let update = map_renderer.dispatch(Intent::SetQuery("zzz".to_owned()));
    assert!(map_renderer.visible_waypoints().is_empty());
    assert!(map_renderer.visible_bounds().is_some()); // the day 1 route is still visible
    assert!(test_utils::has_fit_bounds(&update));
}

#[test]
fn no_match_leaves_view_unchanged() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");
    map_renderer.dispatch(Intent::SelectDay(DayFilter::Day(2)));
    let update = map_renderer.dispatch(Intent::SetQuery("zzz".to_owned()));

    assert!(map_renderer.visible_waypoints().is_empty());
    assert!(map_renderer.visible_routes().is_empty());
    assert_eq!(update.draw, vec![DrawInstruction::ClearLayers]);
    assert!(update.panel.unwrap().list.is_empty());
}

#[test]
fn render_is_idempotent() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");
    map_renderer.dispatch(Intent::SelectDay(DayFilter::Day(1)));
    let first = map_renderer.render();
    let second = map_renderer.render();
    assert_eq!(first, second);
    assert_eq!(test_utils::marker_names(&second), vec!["Rifugio A"]);

    // re-selecting the same day redraws the same thing and keeps the version
    let version = map_renderer.get_current_version();
    let third = map_renderer.dispatch(Intent::SelectDay(DayFilter::Day(1)));
    assert_eq!(third, first);
    assert_eq!(map_renderer.get_current_version(), version);
}

#[test]
fn reset_restores_full_view() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");
    map_renderer.dispatch(Intent::SelectDay(DayFilter::Day(2)));
    map_renderer.dispatch(Intent::SetQuery("b".to_owned()));
    let update = map_renderer.dispatch(Intent::Reset);

    let panel = update.panel.as_ref().unwrap();
    assert_eq!(panel.active_chip().unwrap().label, "Todos");
    assert_eq!(panel.search_text, "");
    assert_eq!(test_utils::marker_names(&update).len(), 2);
    assert_eq!(update, map_renderer.render());
}

#[test]
fn clear_query_keeps_day() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");
    map_renderer.dispatch(Intent::SelectDay(DayFilter::Day(1)));
    map_renderer.dispatch(Intent::SetQuery("zzz".to_owned()));
    map_renderer.dispatch(Intent::ClearQuery);
    assert_eq!(map_renderer.state().day, DayFilter::Day(1));
    assert_eq!(test_utils::visible_names(&map_renderer), vec!["Rifugio A"]);
}

#[test]
fn list_is_grouped_by_day_and_sorted_by_name() {
    let mut map_renderer = test_utils::renderer_for("nested_folders.kml");
    let panel = map_renderer.render().panel.unwrap();

    let days: Vec<u32> = panel.list.iter().map(|g| g.day).collect();
    assert_eq!(days, vec![0, 3, 4, 5]);
    assert_eq!(panel.list[0].label, "Día 0");
    assert_eq!(panel.list[2].entries[0].name, "Tre Cime di Lavaredo");
    assert_eq!(panel.list[2].entries[0].coordinates, "46.61870, 12.30470");
    assert_eq!(
        panel.list[2].entries[0].link.url,
        "https://www.google.com/maps/search/?api=1&query=46.6187,12.3047"
    );

    let chips: Vec<&str> = panel.chips.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(chips, vec!["Todos", "Día 0", "Día 3", "Día 4", "Día 5"]);
    assert_eq!(panel.legend.len(), 4);

    // sorting inside a group ignores case and accents
    let xml = r#"<kml><Folder><name>Día 1</name>
        <Placemark><name>zeta</name><Point><coordinates>11.9,46.5</coordinates></Point></Placemark>
        <Placemark><name>Éfeso</name><Point><coordinates>11.9,46.5</coordinates></Point></Placemark>
        <Placemark><name>alfa</name><Point><coordinates>11.9,46.5</coordinates></Point></Placemark>
        </Folder></kml>"#;
    let (trip, _) = dolomitas_map_core::kml_ingest::parse_kml(xml).unwrap();
    map_renderer = MapRenderer::new(trip, Config::default());
    let panel = map_renderer.render().panel.unwrap();
    assert_eq!(panel.entry_names(), vec!["alfa", "Éfeso", "zeta"]);
}

#[test]
fn markers_carry_day_color_and_popup() {
    let map_renderer = test_utils::renderer_for("two_days.kml");
    let update = map_renderer.render();
    let marker = update
        .draw
        .iter()
        .find_map(|d| match d {
            DrawInstruction::Marker {
                icon, popup_html, ..
            } => Some((icon, popup_html)),
            _ => None,
        })
        .unwrap();
    assert_eq!(marker.0.color, "#ff4d4f");
    assert!(marker
        .1
        .contains("<b>Rifugio A</b><br><i>Refugio con vistas</i>"));
    assert!(marker
        .1
        .contains("https://www.google.com/maps/search/?api=1&amp;query=46.5,11.9"));

    let route_color = update.draw.iter().find_map(|d| match d {
        DrawInstruction::Polyline { style, .. } => Some(style.color),
        _ => None,
    });
    assert_eq!(route_color, Some("#ff4d4f"));
}

#[test]
fn entity_names_are_searchable_and_escaped_once() {
    let mut map_renderer = test_utils::renderer_for("entities.kml");
    let update = map_renderer.dispatch(Intent::SetQuery("A & B".to_owned()));
    assert_eq!(test_utils::marker_names(&update), vec!["A & B\u{a0}C"]);

    let popup_html = update
        .draw
        .iter()
        .find_map(|d| match d {
            DrawInstruction::Marker { popup_html, .. } => Some(popup_html.clone()),
            _ => None,
        })
        .unwrap();
    assert!(popup_html.contains("<b>A &amp; B\u{a0}C</b>"));
    assert!(!popup_html.contains("&amp;amp;"));
}

#[test]
fn focus_waypoint() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");
    let update = map_renderer.dispatch(Intent::FocusWaypoint(1));
    assert_eq!(
        update.draw,
        vec![
            DrawInstruction::SetView {
                center: LatLng::new(46.6, 12.0).unwrap(),
                zoom: 14,
            },
            DrawInstruction::OpenPopup { id: 1 },
        ]
    );
    assert!(update.panel.is_none());

    // hidden or unknown waypoints cannot be focused
    map_renderer.dispatch(Intent::SelectDay(DayFilter::Day(1)));
    assert!(map_renderer.dispatch(Intent::FocusWaypoint(1)).draw.is_empty());
    assert!(map_renderer.dispatch(Intent::FocusWaypoint(42)).draw.is_empty());
}

#[test]
fn geolocation_round_trip() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");
    map_renderer.dispatch(Intent::SelectDay(DayFilter::Day(2)));
    let version = map_renderer.get_current_version();

    let update = map_renderer.dispatch(Intent::Locate);
    match &update.effects[..] {
        [Effect::RequestLocation(options)] => {
            assert!(options.enable_high_accuracy);
            assert_eq!(options.timeout_ms, 8000);
        }
        other => panic!("unexpected effects: {other:?}"),
    }

    let here = LatLng::new(46.55, 11.95).unwrap();
    let update = map_renderer.dispatch(Intent::LocationFound(here));
    assert_eq!(
        update.draw[1],
        DrawInstruction::SetView {
            center: here,
            zoom: 13,
        }
    );
    assert!(matches!(
        update.draw[0],
        DrawInstruction::LocationMarker {
            open_popup: true,
            ..
        }
    ));

    let update = map_renderer.dispatch(Intent::LocationFailed("User denied".to_owned()));
    assert_eq!(
        update.effects,
        vec![Effect::Notify {
            message: "No se pudo obtener ubicación: User denied".to_owned(),
        }]
    );

    // none of this touches the filter
    assert_eq!(map_renderer.state().day, DayFilter::Day(2));
    assert_eq!(map_renderer.get_current_version(), version);
}

#[test]
fn toggle_list() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");
    let update = map_renderer.dispatch(Intent::ToggleList);
    assert_eq!(
        update.effects,
        vec![Effect::SetSidebarVisible { visible: false }]
    );
    assert!(!map_renderer.render().panel.unwrap().sidebar_visible);
}

#[test]
fn version_tracks_state_changes() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");
    let version = map_renderer.get_version_string();
    assert!(map_renderer.render_if_changed(Some(&version)).is_none());
    assert!(map_renderer.render_if_changed(None).is_some());

    map_renderer.dispatch(Intent::SetQuery("rifugio".to_owned()));
    assert_ne!(map_renderer.get_version_string(), version);
    let update = map_renderer.render_if_changed(Some(&version)).unwrap();
    assert_eq!(update.version, map_renderer.get_version_string());
    assert_eq!(
        MapRenderer::parse_version_string(&update.version),
        Some(map_renderer.get_current_version())
    );
}

#[test]
fn recased_query_is_served_to_pollers() {
    let mut map_renderer = test_utils::renderer_for("two_days.kml");
    map_renderer.dispatch(Intent::SetQuery("Rifugio".to_owned()));
    let cached = map_renderer.get_version_string();

    map_renderer.dispatch(Intent::SetQuery("rifugio".to_owned()));
    assert_ne!(map_renderer.get_version_string(), cached);
    let update = map_renderer.render_if_changed(Some(&cached)).unwrap();
    assert_eq!(update.panel.unwrap().search_text, "rifugio");
}

#[test]
fn load_failure_is_visible_but_map_is_usable() {
    let config = Config {
        kml_path: PathBuf::from("./tests/data/does_not_exist.kml"),
        ..Config::default()
    };
    let mut map_renderer = MapRenderer::load(config);
    assert!(map_renderer.load_error().is_some());

    let update = map_renderer.dispatch(Intent::SetQuery("rifugio".to_owned()));
    assert_eq!(update.draw, vec![DrawInstruction::ClearLayers]);
    let panel = update.panel.unwrap();
    assert!(matches!(panel.status, LoadStatus::Failed { .. }));
    assert_eq!(panel.chips.len(), 1);
}

#[test]
fn dropped_records_show_in_load_status() {
    let map_renderer = MapRenderer::load(Config {
        kml_path: PathBuf::from(test_utils::data_path("malformed_coordinates.kml")),
        ..Config::default()
    });
    assert!(map_renderer.load_error().is_none());
    match map_renderer.render().panel.unwrap().status {
        LoadStatus::Ready {
            waypoints,
            routes,
            warnings: Some(warnings),
        } => {
            assert_eq!((waypoints, routes), (2, 0));
            assert_eq!(warnings.lines().count(), 3);
            assert!(warnings.contains("Broken line"));
        }
        other => panic!("unexpected status: {other:?}"),
    }
}

#[test]
fn load_bundled_trip() {
    let map_renderer = MapRenderer::load(Config {
        kml_path: PathBuf::from("./assets/dolomitas.kml"),
        ..Config::default()
    });
    assert!(map_renderer.load_error().is_none());
    assert_eq!(
        map_renderer.render().panel.unwrap().status,
        LoadStatus::Ready {
            waypoints: 12,
            routes: 3,
            warnings: None,
        }
    );

    let initial = map_renderer.initial_view();
    assert!(matches!(initial[0], DrawInstruction::TileLayer(_)));
    assert_eq!(
        initial[1],
        DrawInstruction::SetView {
            center: LatLng::new(46.56, 11.95).unwrap(),
            zoom: 9,
        }
    );
}

#[test]
fn empty_trip_renders_nothing() {
    let map_renderer = MapRenderer::new(TripData::default(), Config::default());
    let update = map_renderer.render();
    assert_eq!(update.draw, vec![DrawInstruction::ClearLayers]);
    assert!(update.panel.unwrap().legend.is_empty());
}
