#![allow(clippy::new_without_default)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod kml_ingest;
pub mod logs;
pub mod palette;
pub mod renderer;
pub mod text;
pub mod trip_data;
pub mod view_state;
