use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;

use crate::{
    report,
    session::{ScanSession, DEFAULT_TIMEOUT_MS, TICK_DELAY},
    types::{ScanEvent, ScanMode, SessionStatus},
};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<ServerState>>, // single-writer discipline for the session
}

struct ServerState {
    session: ScanSession,
    cancel: Option<CancellationToken>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub state: SessionStatus,
    pub target: String,
    pub total: u64,
    pub scanned: u64,
    pub open: u64,
    pub closed: u64,
    pub percent: u8,
}

impl StatusResponse {
    fn from_session(session: &ScanSession) -> Self {
        Self {
            state: session.status(),
            target: session.target().to_string(),
            total: session.total_ports() as u64,
            scanned: session.total_scanned() as u64,
            open: session.open_count() as u64,
            closed: session.closed_count() as u64,
            percent: session.progress_percent(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub target: String,
    #[serde(default)]
    pub start_port: Option<u16>,
    #[serde(default)]
    pub end_port: Option<u16>,
    #[serde(default)]
    pub quick: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

pub async fn spawn_server(bind: &str) -> Result<()> {
    let state = AppState {
        inner: Arc::new(Mutex::new(ServerState {
            session: ScanSession::new(),
            cancel: None,
        })),
    };

    let api = Router::new()
        .route("/status", get(get_status))
        .route("/scan", post(post_scan))
        .route("/stop", post(post_stop))
        .route("/results", get(get_results))
        .route("/report", get(get_report))
        .with_state(state.clone());

    let static_svc = ServeDir::new("ui").append_index_html_on_directories(true);

    let app = Router::new().nest("/api", api).fallback_service(static_svc);

    println!("Serving UI on http://{}", bind);
    axum::serve(tokio::net::TcpListener::bind(bind).await?, app).await?;
    Ok(())
}

async fn get_status(State(app): State<AppState>) -> impl IntoResponse {
    let s = app.inner.lock().await;
    (StatusCode::OK, Json(StatusResponse::from_session(&s.session)))
}

async fn get_results(State(app): State<AppState>) -> impl IntoResponse {
    let s = app.inner.lock().await;
    if s.session.total_scanned() == 0 {
        return StatusCode::NO_CONTENT.into_response();
    }
    (StatusCode::OK, Json(s.session.report())).into_response()
}

async fn get_report(State(app): State<AppState>) -> impl IntoResponse {
    let s = app.inner.lock().await;
    report::render_report(&s.session.report())
}

async fn post_scan(State(app): State<AppState>, Json(req): Json<ScanRequest>) -> impl IntoResponse {
    let mode = if req.quick {
        ScanMode::Quick
    } else {
        ScanMode::Full {
            start_port: req.start_port.unwrap_or(1),
            end_port: req.end_port.unwrap_or(1000),
        }
    };
    let timeout_ms = req.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);

    let mut s = app.inner.lock().await;
    if let Err(e) = s.session.configure(&req.target, mode, timeout_ms) {
        return (StatusCode::BAD_REQUEST, format!("invalid scan request: {e}")).into_response();
    }
    if let Err(e) = s.session.start() {
        return (StatusCode::CONFLICT, format!("cannot start scan: {e}")).into_response();
    }

    // Cancel a superseded driver, then spawn a fresh one.
    if let Some(c) = s.cancel.take() {
        c.cancel();
    }
    let cancel = CancellationToken::new();
    s.cancel = Some(cancel.clone());
    let status = StatusResponse::from_session(&s.session);
    drop(s);

    let app2 = app.clone();
    tokio::spawn(async move {
        drive_scan(app2, cancel).await;
    });

    (StatusCode::ACCEPTED, Json(status)).into_response()
}

async fn post_stop(State(app): State<AppState>) -> impl IntoResponse {
    let mut s = app.inner.lock().await;
    s.session.stop();
    if let Some(c) = s.cancel.take() {
        c.cancel();
    }
    (StatusCode::OK, Json(StatusResponse::from_session(&s.session)))
}

/// Tick loop: one probe per tick, lock released between ticks so the API
/// handlers stay responsive (a handler waits at most one probe timeout).
async fn drive_scan(app: AppState, cancel: CancellationToken) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let mut s = app.inner.lock().await;
        if !s.session.is_running() {
            break;
        }
        s.session.advance().await;
        let events = s.session.drain_events();
        let target = s.session.target().to_string();
        let open = s.session.open_count();
        drop(s);

        if events.contains(&ScanEvent::Complete) {
            println!("scan of {} complete ({} open)", target, open);
            break;
        }
        tokio::time::sleep(TICK_DELAY).await;
    }
}
