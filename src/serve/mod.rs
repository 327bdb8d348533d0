// src/serve/mod.rs

//! Dev server: reverse proxy plus live-reload push channel.
//!
//! The server owns no content. It forwards every request to the
//! already-running site server configured in `[serve].upstream`, injects the
//! live-reload client into HTML responses, and pushes [`ReloadMessage`]s to
//! connected browsers over WebSocket.

pub mod inject;
pub mod proxy;

use anyhow::{Context, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::ServeSettings;
use crate::reload::{ReloadHub, ReloadMessage};

pub use inject::{inject_client_tag, CLIENT_SCRIPT_ROUTE, CLIENT_SCRIPT_TAG, WS_ROUTE};

/// Embedded browser client served at [`CLIENT_SCRIPT_ROUTE`].
const CLIENT_SCRIPT: &str = include_str!("../reload/client.js");

/// Shared state for all dev-server handlers.
#[derive(Debug, Clone)]
pub struct ServeState {
    pub hub: ReloadHub,
    pub client: reqwest::Client,
    pub upstream: String,
}

/// Bind the dev-server listener.
///
/// Split from [`run`] so the executor can report service readiness as soon
/// as the port is held, before the first request arrives.
pub async fn bind(settings: &ServeSettings) -> Result<TcpListener> {
    let addr = format!("127.0.0.1:{}", settings.port);
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding dev server to {addr}"))
}

/// Serve until the process shuts down.
pub async fn run(listener: TcpListener, settings: ServeSettings, hub: ReloadHub) -> Result<()> {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("building upstream HTTP client")?;

    let state = ServeState {
        hub,
        client,
        upstream: settings.upstream.clone(),
    };

    let app = Router::new()
        .route(WS_ROUTE, get(ws_handler))
        .route(CLIENT_SCRIPT_ROUTE, get(client_script))
        .fallback(proxy::forward)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!(
        addr = %listener.local_addr().context("reading listener address")?,
        upstream = %settings.upstream,
        "dev server listening"
    );

    axum::serve(listener, app)
        .await
        .context("dev server terminated")?;

    Ok(())
}

async fn client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        CLIENT_SCRIPT,
    )
}

async fn ws_handler(State(state): State<ServeState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forward hub messages to one connected client until either side closes.
async fn handle_socket(mut socket: WebSocket, state: ServeState) {
    let mut rx = state.hub.subscribe();
    debug!(clients = state.hub.client_count(), "live-reload client connected");

    let hello = ReloadMessage::connected().to_json();
    if socket.send(Message::Text(hello)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(msg) => {
                        if socket.send(Message::Text(msg.to_json())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "live-reload client lagged; skipping updates");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = socket.send(Message::Pong(data)).await;
                    }
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    debug!("live-reload client disconnected");
}
