//! End-to-end presence protocol tests against a live server.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use presence_relay::api;
use presence_relay::app_state::AppState;
use presence_relay::domain::{EndpointId, Relay};
use presence_relay::persistence::MemoryStore;
use presence_relay::service::PresenceRegistry;
use presence_relay::ws::messages::WsFrame;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (SocketAddr, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let registry = PresenceRegistry::new(Arc::<MemoryStore>::clone(&store), Relay::new(256));
    let state = AppState {
        registry: Arc::new(registry),
        error_event_name: Arc::from("error-listenner"),
    };
    let app = api::build_app(state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, store)
}

async fn recv(ws: &mut Client) -> WsFrame {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(2), ws.next()).await;
        let Ok(Some(Ok(msg))) = next else {
            panic!("no frame received");
        };
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else {
            panic!("frame is not text");
        };
        let Ok(frame) = serde_json::from_str::<WsFrame>(text) else {
            panic!("frame is not a valid envelope: {text}");
        };
        return frame;
    }
}

async fn connect(addr: SocketAddr) -> (Client, EndpointId) {
    let Ok((mut ws, _)) = connect_async(format!("ws://{addr}/ws")).await else {
        panic!("ws connect failed");
    };
    let hello = recv(&mut ws).await;
    assert_eq!(hello.event, "connected");
    let Some(id) = hello.data.get("id").and_then(|v| v.as_str()) else {
        panic!("connected frame without id");
    };
    let id = EndpointId::from(id);
    (ws, id)
}

async fn emit(ws: &mut Client, event: &str, data: serde_json::Value) {
    let frame = serde_json::json!({ "event": event, "data": data });
    if ws.send(Message::text(frame.to_string())).await.is_err() {
        panic!("send failed");
    }
}

async fn wait_for_session(store: &MemoryStore, id: &EndpointId, present: bool) {
    for _ in 0..200 {
        if store.get(id).await.is_some() == present {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {id} presence never became {present}");
}

#[tokio::test]
async fn link_update_and_inspector_disconnect() {
    let (addr, store) = spawn_server().await;

    let (mut client, a) = connect(addr).await;
    emit(&mut client, "init", serde_json::json!({"client_type": "browser"})).await;
    wait_for_session(&store, &a, true).await;

    let (mut inspector, b) = connect(addr).await;
    emit(
        &mut inspector,
        "init",
        serde_json::json!({"client_type": "inspector", "client_id": a}),
    )
    .await;

    let opened = recv(&mut client).await;
    assert_eq!(opened.event, "opened");
    assert_eq!(opened.data, serde_json::json!({"ida_window_id": b}));

    emit(
        &mut client,
        "update_auth",
        serde_json::json!({"client_id": a, "user": {"name": "x"}}),
    )
    .await;
    let change = recv(&mut client).await;
    assert_eq!(change.event, "auth_change");
    assert_eq!(change.data, serde_json::json!({"name": "x"}));

    let Some(session) = store.get(&a).await else {
        panic!("session missing");
    };
    assert_eq!(session.data, Some(serde_json::json!({"name": "x"})));
    assert_eq!(session.linked_window_id(), Some(&b));

    let _ = inspector.close(None).await;
    wait_for_session(&store, &a, false).await;
}

#[tokio::test]
async fn owner_disconnect_removes_session() {
    let (addr, store) = spawn_server().await;

    let (mut client, a) = connect(addr).await;
    emit(&mut client, "init", serde_json::json!({"client_type": "ida-less"})).await;
    wait_for_session(&store, &a, true).await;

    drop(client);
    wait_for_session(&store, &a, false).await;
}

#[tokio::test]
async fn validation_errors_keep_connection_open() {
    let (addr, store) = spawn_server().await;
    let (mut client, a) = connect(addr).await;

    emit(&mut client, "init", serde_json::json!({})).await;
    let err = recv(&mut client).await;
    assert_eq!(err.event, "error-listenner");
    assert_eq!(err.data.get("type"), Some(&serde_json::json!("validation")));

    if client.send(Message::text("not json")).await.is_err() {
        panic!("send failed");
    }
    let err = recv(&mut client).await;
    assert_eq!(err.event, "error-listenner");
    assert_eq!(err.data.get("type"), Some(&serde_json::json!("validation")));

    emit(&mut client, "init", serde_json::json!({"client_type": "browser"})).await;
    wait_for_session(&store, &a, true).await;
}

#[tokio::test]
async fn inspector_for_unknown_session_gets_storage_error() {
    let (addr, store) = spawn_server().await;
    let (mut inspector, _b) = connect(addr).await;

    emit(
        &mut inspector,
        "init",
        serde_json::json!({"client_type": "ida", "client_id": "no-such-session"}),
    )
    .await;
    let err = recv(&mut inspector).await;
    assert_eq!(err.event, "error-listenner");
    assert_eq!(err.data.get("type"), Some(&serde_json::json!("db_connection")));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn auth_change_reaches_target_without_session() {
    let (addr, _store) = spawn_server().await;
    let (mut target, t) = connect(addr).await;
    let (mut sender, _s) = connect(addr).await;

    emit(
        &mut sender,
        "update_auth",
        serde_json::json!({"client_id": t, "user": {"token": "abc"}}),
    )
    .await;
    let change = recv(&mut target).await;
    assert_eq!(change.event, "auth_change");
    assert_eq!(change.data, serde_json::json!({"token": "abc"}));
}

#[tokio::test]
async fn health_and_session_listing() {
    let (addr, store) = spawn_server().await;
    let (mut client, a) = connect(addr).await;
    emit(&mut client, "init", serde_json::json!({"client_type": "browser"})).await;
    wait_for_session(&store, &a, true).await;

    let Ok(resp) = reqwest::get(format!("http://{addr}/health")).await else {
        panic!("health request failed");
    };
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let Ok(body) = resp.json::<serde_json::Value>().await else {
        panic!("health body is not json");
    };
    assert_eq!(body.get("status"), Some(&serde_json::json!("healthy")));

    let Ok(resp) = reqwest::get(format!("http://{addr}/api/v1/sessions")).await else {
        panic!("sessions request failed");
    };
    let Ok(body) = resp.json::<serde_json::Value>().await else {
        panic!("sessions body is not json");
    };
    assert_eq!(body.get("total"), Some(&serde_json::json!(1)));
    assert_eq!(body.get("linked"), Some(&serde_json::json!(0)));
}

#[tokio::test]
async fn null_user_is_relayed_as_logout() {
    let (addr, store) = spawn_server().await;
    let (mut client, a) = connect(addr).await;
    emit(&mut client, "init", serde_json::json!({"client_type": "browser"})).await;
    wait_for_session(&store, &a, true).await;

    emit(
        &mut client,
        "update_auth",
        serde_json::json!({"client_id": a, "user": null}),
    )
    .await;
    let change = recv(&mut client).await;
    assert_eq!(change.event, "auth_change");
    assert!(change.data.is_null());

    let Some(session) = store.get(&a).await else {
        panic!("session missing");
    };
    assert_eq!(session.data, Some(serde_json::Value::Null));
}
