use super::ipc::Request;
use super::map_renderer::MapRenderer;
use crate::view_state::Intent;
use actix_web::dev::{Service, ServerHandle};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use tokio::runtime::Runtime;
use uuid::Uuid;

pub struct AppState {
    map_renderer: Arc<Mutex<MapRenderer>>,
    kml_path: PathBuf,
}

impl AppState {
    pub fn new(map_renderer: Arc<Mutex<MapRenderer>>) -> web::Data<Self> {
        let kml_path = map_renderer
            .lock()
            .map(|r| r.config().kml_path.clone())
            .unwrap_or_default();
        web::Data::new(AppState {
            map_renderer,
            kml_path,
        })
    }
}

async fn serve_initial_view(data: web::Data<AppState>) -> HttpResponse {
    match data.map_renderer.lock() {
        Ok(map_renderer) => HttpResponse::Ok().json(map_renderer.initial_view()),
        Err(_) => HttpResponse::InternalServerError().finish(),
    }
}

async fn serve_frame(req: HttpRequest, data: web::Data<AppState>) -> HttpResponse {
    let client_version = req
        .headers()
        .get("If-None-Match")
        .and_then(|h| h.to_str().ok());
    let map_renderer = match data.map_renderer.lock() {
        Ok(map_renderer) => map_renderer,
        Err(_) => return HttpResponse::InternalServerError().finish(),
    };
    match map_renderer.render_if_changed(client_version) {
        None => HttpResponse::NotModified().finish(),
        Some(update) => HttpResponse::Ok()
            .insert_header(("ETag", update.version.clone()))
            .json(update),
    }
}

async fn post_intent(intent: web::Json<Intent>, data: web::Data<AppState>) -> HttpResponse {
    let mut map_renderer = match data.map_renderer.lock() {
        Ok(map_renderer) => map_renderer,
        Err(_) => return HttpResponse::InternalServerError().finish(),
    };
    let update = map_renderer.dispatch(intent.into_inner());
    HttpResponse::Ok()
        .insert_header(("ETag", update.version.clone()))
        .json(update)
}

async fn post_request(body: String, data: web::Data<AppState>) -> HttpResponse {
    match Request::parse(&body) {
        Ok(request) => HttpResponse::Ok().json(request.handle(&data.map_renderer)),
        Err(e) => {
            warn!("rejecting malformed request: {e}");
            HttpResponse::BadRequest().body(format!("invalid request: {e}"))
        }
    }
}

// The raw trip document, so the frontend can cache it for offline use.
async fn serve_kml(data: web::Data<AppState>) -> HttpResponse {
    match fs::read(&data.kml_path) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/vnd.google-earth.kml+xml")
            .body(bytes),
        Err(e) => {
            warn!("cannot serve {}: {e}", data.kml_path.display());
            HttpResponse::NotFound().finish()
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/initial_view", web::get().to(serve_initial_view))
        .route("/frame", web::get().to(serve_frame))
        .route("/intent", web::post().to(post_intent))
        .route("/request", web::post().to(post_request))
        .route("/trip.kml", web::get().to(serve_kml));
}

pub struct MapServer {
    host: String,
    port: u16,
    url_prefix: String,
    server_handle: Option<ServerHandle>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MapServer {
    /// Starts the server on its own thread and tokio runtime. `port: None`
    /// picks a free port.
    pub fn create_and_start(
        host: &str,
        port: Option<u16>,
        map_renderer: Arc<Mutex<MapRenderer>>,
    ) -> Result<Self> {
        let app_state = AppState::new(map_renderer);
        let url_prefix = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel::<Result<(u16, ServerHandle)>>();

        let bind_host = host.to_owned();
        let bind_port = port.unwrap_or(0);
        let scope_prefix = format!("/{url_prefix}");

        let handle = thread::spawn(move || {
            let runtime = match Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    let _ = tx.send(Err(anyhow!("failed to create tokio runtime: {e}")));
                    return;
                }
            };
            runtime.block_on(async move {
                info!("Setting up server routes...");
                let server = HttpServer::new(move || {
                    App::new()
                        .app_data(app_state.clone())
                        .wrap_fn(|req, srv| {
                            info!("Incoming request: {} {}", req.method(), req.uri());
                            srv.call(req)
                        })
                        .service(web::scope(&scope_prefix).configure(configure))
                })
                .workers(1)
                .bind((bind_host.as_str(), bind_port));

                let server = match server {
                    Ok(server) => server,
                    Err(e) => {
                        let _ = tx.send(Err(anyhow!(
                            "failed to bind {bind_host}:{bind_port}: {e}"
                        )));
                        return;
                    }
                };
                // port 0 means the OS picked one
                let actual_port = server
                    .addrs()
                    .first()
                    .map(|addr| addr.port())
                    .unwrap_or(bind_port);
                let server = server.run();
                let _ = tx.send(Ok((actual_port, server.handle())));

                info!("Server bound successfully to {bind_host}:{actual_port}");
                if let Err(e) = server.await {
                    error!("Server failed to run: {e}");
                }
            });
        });

        let (port, server_handle) = rx.recv()??;
        Ok(Self {
            host: host.to_owned(),
            port,
            url_prefix,
            server_handle: Some(server_handle),
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn get_http_url(&self) -> String {
        format!("http://{}:{}/{}", self.host, self.port, self.url_prefix)
    }

    pub fn stop(&mut self) {
        if let Some(server_handle) = self.server_handle.take() {
            // also runs from Drop, possibly inside an async context
            pollster::block_on(server_handle.stop(true));
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("map server thread panicked");
            }
        }
    }
}

impl Drop for MapServer {
    fn drop(&mut self) {
        self.stop();
    }
}
