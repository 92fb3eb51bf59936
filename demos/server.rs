use dolomitas_map_core::config::Config;
use dolomitas_map_core::logs;
use dolomitas_map_core::renderer::{MapRenderer, MapServer};
use simplelog::LevelFilter;
use std::env;
use std::sync::{Arc, Mutex};

pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // optional JSON config as first argument
    let config = match args.get(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    logs::init(".", LevelFilter::Info)?;

    let map_renderer = MapRenderer::load(config);
    if let Some(error) = map_renderer.load_error() {
        eprintln!("serving an empty map: {error}");
    }

    let server = MapServer::create_and_start("localhost", Some(8090), Arc::new(Mutex::new(map_renderer)))?;

    println!("================================================");
    println!("[Frame]:        {}/frame", server.get_http_url());
    println!("[Initial view]: {}/initial_view", server.get_http_url());
    println!("[Intents]:      POST {}/intent", server.get_http_url());
    println!("[Trip KML]:     {}/trip.kml", server.get_http_url());

    let _server = Arc::new(Mutex::new(server));

    ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C! Shutting down...");
        std::process::exit(0);
    })?;

    // Block the main thread to keep server running
    loop {
        std::thread::sleep(std::time::Duration::from_secs(1));
    }
}
