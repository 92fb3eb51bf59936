use super::map_renderer::{MapRenderer, Update};
use crate::view_state::Intent;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FrameQuery {
    pub cached_version: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct FrameResponse {
    pub status: u16,
    pub update: Option<Update>,
}

// Unified request interface
#[derive(Deserialize, Serialize, Debug)]
#[serde(tag = "query", content = "payload")]
#[serde(rename_all = "snake_case")]
pub enum RequestPayload {
    Frame(FrameQuery),
    Intent(Intent),
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub request_id: String,
    #[serde(flatten)]
    pub payload: RequestPayload,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse<T> {
    pub request_id: String,
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

pub fn handle_frame_query(query: &FrameQuery, map_renderer: &MapRenderer) -> FrameResponse {
    match map_renderer.render_if_changed(query.cached_version.as_deref()) {
        None => FrameResponse {
            status: 304,
            update: None,
        },
        Some(update) => FrameResponse {
            status: 200,
            update: Some(update),
        },
    }
}

impl Request {
    pub fn parse(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Handle the request against a shared renderer. Intents are applied
    /// under the lock so they are serialized.
    pub fn handle(&self, map_renderer: &Arc<Mutex<MapRenderer>>) -> RequestResponse<serde_json::Value> {
        match map_renderer.lock() {
            Ok(mut map_renderer) => self.handle_map_renderer(&mut map_renderer),
            Err(_) => self.failure("map renderer lock poisoned".to_owned()),
        }
    }

    pub fn handle_map_renderer(
        &self,
        map_renderer: &mut MapRenderer,
    ) -> RequestResponse<serde_json::Value> {
        let data = match &self.payload {
            RequestPayload::Frame(query) => {
                serde_json::to_value(handle_frame_query(query, map_renderer))
            }
            RequestPayload::Intent(intent) => {
                serde_json::to_value(map_renderer.dispatch(intent.clone()))
            }
        };
        match data {
            Ok(value) => RequestResponse {
                request_id: self.request_id.clone(),
                success: true,
                data: Some(value),
                error: None,
            },
            Err(e) => self.failure(format!("Failed to serialize response: {e}")),
        }
    }

    fn failure(&self, error: String) -> RequestResponse<serde_json::Value> {
        RequestResponse {
            request_id: self.request_id.clone(),
            success: false,
            data: None,
            error: Some(error),
        }
    }
}
