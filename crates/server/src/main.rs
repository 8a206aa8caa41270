use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError},
};

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{Path, State, WebSocketUpgrade},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use control::Orchestrator;
use route_planner::BoundaryRouteBuilder;
use serde_json::Value;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{ControlEvent, DispatchReport, RobotTelemetry, SignalsTaken, StateSnapshot},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_seed, load_settings};

const MAX_COMMAND_BYTES: usize = 64 * 1024;

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();

    let mut orchestrator = Orchestrator::new(Arc::new(BoundaryRouteBuilder));
    if let Some(path) = &settings.seed_file {
        let seed = load_seed(path).map_err(|error| {
            error!(path = %path.display(), %error, "failed to load seed catalog");
            error
        })?;
        info!(maps = seed.maps.len(), tasks = seed.tasks.len(), "seed catalog loaded");
        seed.install(&mut orchestrator);
    }
    orchestrator.mark_ready();

    let state = AppState::new(orchestrator, settings.event_capacity);
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(%addr, "control server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/command", post(post_command))
        .route("/api/state", get(get_state))
        .route("/api/state/:view", get(get_state_view))
        .route("/api/robot", put(put_robot))
        .route("/api/signals/take", post(take_signals))
        .route("/ws", get(ws_handler))
        .layer(RequestBodyLimitLayer::new(MAX_COMMAND_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn bad_request(message: impl Into<String>) -> HttpError {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new(ErrorCode::MalformedRequest, message)),
    )
}

fn internal(message: impl Into<String>) -> HttpError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(ErrorCode::Internal, message)),
    )
}

async fn post_command(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<DispatchReport>, HttpError> {
    let envelope: Value = serde_json::from_slice(&body)
        .map_err(|e| bad_request(format!("command is not valid JSON: {e}")))?;
    if !envelope.is_object() {
        return Err(bad_request("command envelope must be a JSON object"));
    }

    // Route computation may run for a long time; keep it off the async workers.
    let worker = Arc::clone(&state);
    let (report, snapshot) = tokio::task::spawn_blocking(move || {
        let mut orchestrator = worker
            .orchestrator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let report = orchestrator.dispatch(&envelope);
        (report, orchestrator.snapshot())
    })
    .await
    .map_err(|e| {
        error!(error = %e, "command worker failed");
        let api_error = ApiError::new(ErrorCode::Internal, e.to_string());
        let _ = state.events.send(ControlEvent::Error(api_error.clone()));
        (StatusCode::INTERNAL_SERVER_ERROR, Json(api_error))
    })?;

    state.publish(snapshot);
    if !report.signals.is_empty() {
        let _ = state.events.send(ControlEvent::SignalsRaised {
            flags: report.signals.clone(),
        });
    }
    if !report.rejections.is_empty() {
        let _ = state.events.send(ControlEvent::CommandRejected {
            rejections: report.rejections.clone(),
        });
    }
    Ok(Json(report))
}

async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateSnapshot> {
    Json(state.current_snapshot())
}

async fn get_state_view(
    State(state): State<Arc<AppState>>,
    Path(view): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let payloads = state
        .current_snapshot()
        .to_json_payloads()
        .map_err(|e| internal(e.to_string()))?;
    let body = match view.as_str() {
        "robot" => payloads.robot,
        "maps" => payloads.maps,
        "tasks" => payloads.tasks,
        "mowparameters" => payloads.mow_parameters,
        _ => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ApiError::new(
                    ErrorCode::NotFound,
                    format!("unknown state view '{view}'"),
                )),
            ))
        }
    };
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

async fn put_robot(
    State(state): State<Arc<AppState>>,
    Json(telemetry): Json<RobotTelemetry>,
) -> StatusCode {
    state.robot.update(telemetry);
    let _ = state.events.send(ControlEvent::StateUpdated {
        snapshot: Box::new(state.current_snapshot()),
    });
    StatusCode::NO_CONTENT
}

async fn take_signals(State(state): State<Arc<AppState>>) -> Json<SignalsTaken> {
    let flags = state.signals.take_all();
    if !flags.is_empty() {
        info!(?flags, "command signals consumed");
    }
    Json(SignalsTaken { flags })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};
    use tokio::sync::broadcast::error::RecvError;

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        loop {
            let event = match events_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
