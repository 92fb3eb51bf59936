use dolomitas_map_core::kml_ingest;
use dolomitas_map_core::palette::{color_for_day, day_label};
use std::env;

pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_module_path(false)
        .init();

    let args: Vec<String> = env::args().collect();
    let kml_path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("assets/dolomitas.kml");

    let (trip, warnings) = kml_ingest::load_kml(kml_path)?;
    if let Some(warnings) = warnings {
        println!("warnings:\n{warnings}");
    }

    for day in trip.days() {
        let names: Vec<&str> = trip
            .waypoints()
            .iter()
            .filter(|w| w.day == day)
            .map(|w| w.name.as_str())
            .collect();
        let routes = trip.routes().iter().filter(|r| r.day == day).count();
        println!(
            "{} [{}]: {} stops, {} routes -> {}",
            day_label(day),
            color_for_day(day),
            names.len(),
            routes,
            names.join(", ")
        );
    }
    Ok(())
}
