use super::*;
use axum::{body, body::Body, http::Request};
use shared::{
    domain::{MapEntry, Polygon, SignalFlag},
    error::RejectionKind,
    protocol::ApiState,
};
use tower::ServiceExt;

fn test_app() -> (Router, Arc<AppState>) {
    let mut orchestrator = Orchestrator::new(Arc::new(BoundaryRouteBuilder));
    orchestrator.save_map(MapEntry {
        name: "garden".into(),
        perimeter: Polygon::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
    });
    orchestrator.mark_ready();
    let state = Arc::new(AppState::new(orchestrator, 32));
    (build_router(Arc::clone(&state)), state)
}

fn command(envelope: Value) -> Request<Body> {
    Request::post("/api/command")
        .header("content-type", "application/json")
        .body(Body::from(envelope.to_string()))
        .expect("request")
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _state) = test_app();
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn map_load_returns_report_and_updates_state() {
    let (app, _state) = test_app();

    let response = app
        .clone()
        .oneshot(command(
            serde_json::json!({ "maps": { "command": "load", "value": "garden" } }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let report: DispatchReport = json_body(response).await;
    assert!(report.is_clean());
    assert_eq!(report.signals, vec![SignalFlag::MapChanged]);

    let request = Request::get("/api/state")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot: StateSnapshot = json_body(response).await;
    assert_eq!(snapshot.api, ApiState::Ready);
    assert_eq!(snapshot.maps.loaded.as_deref(), Some("garden"));
    assert!(!snapshot.calculating);
}

#[tokio::test]
async fn rejected_command_is_reported_with_ok_status() {
    let (app, _state) = test_app();
    let response = app
        .oneshot(command(
            serde_json::json!({ "robot": { "command": "fly", "value": "all" } }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let report: DispatchReport = json_body(response).await;
    assert_eq!(report.rejections.len(), 1);
    assert_eq!(report.rejections[0].kind, RejectionKind::InvalidCommand);
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let (app, _state) = test_app();

    let request = Request::post("/api/command")
        .body(Body::from("{ not json"))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(command(serde_json::json!(["maps"])))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ApiError = json_body(response).await;
    assert!(error.message.contains("JSON object"));
}

#[tokio::test]
async fn signals_are_consumed_once() {
    let (app, _state) = test_app();
    app.clone()
        .oneshot(command(
            serde_json::json!({ "robot": { "command": "dock", "value": "now" } }),
        ))
        .await
        .expect("response");

    let take = || {
        Request::post("/api/signals/take")
            .body(Body::empty())
            .expect("request")
    };
    let taken: SignalsTaken = json_body(app.clone().oneshot(take()).await.expect("response")).await;
    assert_eq!(taken.flags, vec![SignalFlag::Dock]);
    let taken: SignalsTaken = json_body(app.oneshot(take()).await.expect("response")).await;
    assert!(taken.flags.is_empty());
}

#[tokio::test]
async fn robot_telemetry_is_visible_in_state_views() {
    let (app, _state) = test_app();
    let request = Request::put("/api/robot")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "status": "mowing", "battery": 140.0 }).to_string(),
        ))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = Request::get("/api/state/robot")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let robot: Value = json_body(response).await;
    assert_eq!(robot["status"], "mowing");
    assert_eq!(robot["battery"], 100.0);
}

#[tokio::test]
async fn state_views_by_name() {
    let (app, _state) = test_app();
    let request = Request::get("/api/state/mowparameters")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let params: Value = json_body(response).await;
    assert_eq!(params["pattern"], "lines");
    assert_eq!(params["angle"], 90);

    let request = Request::get("/api/state/weather")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn state_read_reports_live_calculating_flag() {
    let (app, state) = test_app();
    let held = state.calculating.try_begin().expect("claim");

    let request = Request::get("/api/state")
        .body(Body::empty())
        .expect("request");
    let snapshot: StateSnapshot = json_body(app.oneshot(request).await.expect("response")).await;
    assert!(snapshot.calculating);
    drop(held);
}

#[tokio::test]
async fn command_broadcasts_state_and_signal_events() {
    let (app, state) = test_app();
    let mut events = state.events.subscribe();

    app.oneshot(command(
        serde_json::json!({ "maps": { "command": "load", "value": "garden" } }),
    ))
    .await
    .expect("response");

    match events.try_recv().expect("state event") {
        ControlEvent::StateUpdated { snapshot } => {
            assert_eq!(snapshot.maps.loaded.as_deref(), Some("garden"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    match events.try_recv().expect("signal event") {
        ControlEvent::SignalsRaised { flags } => assert_eq!(flags, vec![SignalFlag::MapChanged]),
        other => panic!("unexpected event {other:?}"),
    }
}
