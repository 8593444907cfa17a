//! End-to-end tests that run the HTTP router against a live controller task,
//! including a real WebSocket handshake over a bound listener.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_tungstenite::tungstenite;
use tower::ServiceExt;

use hostdeck_server::config::ServerConfig;
use hostdeck_server::connections::ConnectionRegistry;
use hostdeck_server::controller::{self, ControlEvent};
use hostdeck_server::protocol::{ClientEvent, ClosedReason, ServerFrame, SessionId};
use hostdeck_server::sampler::MetricSampler;
use hostdeck_server::{create_app, AppState};

struct TestApp {
    app: axum::Router,
    connections: Arc<ConnectionRegistry>,
    control_tx: UnboundedSender<ControlEvent>,
}

/// Builds the full stack: connection registry, sampler, controller task, router.
fn test_app(config: ServerConfig) -> TestApp {
    let connections = Arc::new(ConnectionRegistry::new(config.max_sessions));
    let sampler = Arc::new(MetricSampler::new(
        Arc::clone(&connections),
        config.disabled_modules.clone(),
    ));
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    controller::spawn(
        Arc::clone(&connections),
        Arc::clone(&sampler),
        control_tx.clone(),
        control_rx,
    );
    let state = AppState::new(config, Arc::clone(&connections), control_tx.clone(), sampler);
    TestApp {
        app: create_app(state),
        connections,
        control_tx,
    }
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, value)
}

/// Binds the app on an ephemeral port and returns its address.
async fn serve(app: axum::Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn next_json(socket: &mut WsStream) -> serde_json::Value {
    loop {
        match socket.next().await.expect("socket closed").unwrap() {
            tungstenite::Message::Text(text) => {
                return serde_json::from_str(text.as_str()).unwrap()
            }
            _ => continue,
        }
    }
}

#[tokio::test]
async fn sessions_listing_reflects_controller_state() {
    let t = test_app(ServerConfig::default());
    let session = SessionId::from("it-session");
    let (frame_tx, mut frames) = mpsc::unbounded_channel();
    t.connections.register(session.clone(), frame_tx).unwrap();
    t.control_tx
        .send(ControlEvent::Client {
            session,
            event: ClientEvent::Open,
        })
        .unwrap();

    // The control queue is FIFO, so the listing request below observes the open.
    let (status, listing) = get_json(t.app, "/api/sessions").await;
    assert_eq!(status, StatusCode::OK);
    let rows = listing.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["sessionId"], "it-session");
    assert_eq!(rows[0]["layoutSize"], "full");
    assert_eq!(rows[0]["mode"], "normal");
    assert_eq!(rows[0]["view"], "dashboard");
    assert_eq!(rows[0]["liveFeatures"].as_array().unwrap().len(), 0);

    // The open produced a greeting followed by the dashboard.
    assert!(matches!(frames.recv().await, Some(ServerFrame::Hello { .. })));
    assert!(matches!(
        frames.recv().await,
        Some(ServerFrame::Surface { .. })
    ));
}

#[tokio::test]
async fn overlay_sessions_appear_in_the_listing() {
    let t = test_app(ServerConfig::default());
    let session = SessionId::from("hands-free");
    let (frame_tx, mut frames) = mpsc::unbounded_channel();
    t.connections.register(session.clone(), frame_tx).unwrap();

    t.control_tx
        .send(ControlEvent::Client {
            session: session.clone(),
            event: ClientEvent::Open,
        })
        .unwrap();
    t.control_tx
        .send(ControlEvent::Client {
            session,
            event: ClientEvent::Hotkey {
                word: "overlay".into(),
            },
        })
        .unwrap();

    // Wait until the controller has switched the session over.
    loop {
        match frames.recv().await.expect("frame channel closed") {
            ServerFrame::SurfaceClosed {
                reason: ClosedReason::OverlayEnabled,
            } => break,
            _ => continue,
        }
    }

    let (status, listing) = get_json(t.app, "/api/sessions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing[0]["mode"], "overlay");
    assert_eq!(listing[0]["liveFeatures"][0], "overlay");
}

#[tokio::test]
async fn sessions_without_a_controller_reports_500() {
    let config = ServerConfig::default();
    let connections = Arc::new(ConnectionRegistry::new(config.max_sessions));
    let sampler = Arc::new(MetricSampler::new(Arc::clone(&connections), Vec::new()));
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    drop(control_rx);
    let app = create_app(AppState::new(config, connections, control_tx, sampler));

    let (status, body) = get_json(app, "/api/sessions").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Display controller unavailable");
}

#[tokio::test]
async fn disabled_modules_show_in_status_counts() {
    let config = ServerConfig {
        disabled_modules: vec!["overlay".to_string()],
        ..ServerConfig::default()
    };
    let t = test_app(config);

    let (status, body) = get_json(t.app, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    let total = body["modulesTotal"].as_u64().unwrap();
    assert_eq!(body["modulesEnabled"].as_u64().unwrap(), total - 1);
}

#[tokio::test]
async fn websocket_surface_end_to_end() {
    let t = test_app(ServerConfig::default());
    let addr = serve(t.app).await;

    let url = format!("ws://{addr}/api/surface?session=ws-e2e");
    let (mut socket, _response) = tokio_tungstenite::connect_async(&url).await.unwrap();

    socket
        .send(tungstenite::Message::Text(r#"{"type":"open"}"#.into()))
        .await
        .unwrap();

    let hello = next_json(&mut socket).await;
    assert_eq!(hello["type"], "hello");
    assert!(hello["lines"][0]
        .as_str()
        .unwrap()
        .contains("is watching this host"));

    let surface = next_json(&mut socket).await;
    assert_eq!(surface["type"], "surface");
    assert_eq!(surface["frame"]["title"], "Hostdeck Monitor");
    assert_eq!(surface["frame"]["capacity"], 54);

    // Close from the wire and observe the teardown frame.
    socket
        .send(tungstenite::Message::Text(
            r#"{"type":"click","slot":7,"item":"close_button"}"#.into(),
        ))
        .await
        .unwrap();
    let closed = next_json(&mut socket).await;
    assert_eq!(closed["type"], "surface_closed");
    assert_eq!(closed["reason"], "closed");
}

#[tokio::test]
async fn connection_limit_rejects_the_handshake() {
    let t = test_app(ServerConfig {
        max_sessions: 1,
        ..ServerConfig::default()
    });
    let (holder_tx, _holder_rx) = mpsc::unbounded_channel();
    t.connections
        .register(SessionId::from("holder"), holder_tx)
        .unwrap();
    let addr = serve(t.app).await;

    let url = format!("ws://{addr}/api/surface?session=rejected");
    let err = tokio_tungstenite::connect_async(&url).await.unwrap_err();
    match err {
        tungstenite::Error::Http(response) => {
            assert_eq!(response.status().as_u16(), 503);
        }
        other => panic!("expected an HTTP rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn websocket_reconnect_replaces_the_session() {
    let t = test_app(ServerConfig {
        max_sessions: 1,
        ..ServerConfig::default()
    });
    let addr = serve(t.app).await;
    let url = format!("ws://{addr}/api/surface?session=flappy");

    let (mut first, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    first
        .send(tungstenite::Message::Text(r#"{"type":"open"}"#.into()))
        .await
        .unwrap();
    let hello = next_json(&mut first).await;
    assert_eq!(hello["type"], "hello");

    // Same session id again: the limit of one must not block the reconnect.
    let (mut second, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    second
        .send(tungstenite::Message::Text(r#"{"type":"open"}"#.into()))
        .await
        .unwrap();

    // The session was already greeted, so the reopen goes straight to the surface.
    let surface = next_json(&mut second).await;
    assert_eq!(surface["type"], "surface");
    assert_eq!(surface["frame"]["title"], "Hostdeck Monitor");
}
