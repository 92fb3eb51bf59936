pub mod draw;
pub mod ipc;
pub mod map_renderer;
pub use map_renderer::{Effect, MapRenderer, Update};

pub mod map_server;
pub use map_server::MapServer;

pub mod panel;
