// src/serve/proxy.rs

//! Reverse-proxy fallback handler.
//!
//! Every request that is not a stylesync route is forwarded verbatim to the
//! upstream site server. HTML responses get the live-reload client tag
//! injected; everything else streams through untouched. Upstream redirects
//! are passed back to the browser rather than followed.

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::serve::inject::inject_client_tag;
use crate::serve::ServeState;

/// Headers that describe the connection, not the payload; never forwarded in
/// either direction.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.contains(&name)
}

/// Axum fallback handler: forward to the upstream, 502 on failure.
pub async fn forward(State(state): State<ServeState>, req: Request) -> Response {
    let path = req.uri().path().to_string();

    match proxy_request(&state, req).await {
        Ok(response) => response,
        Err(err) => {
            warn!(
                path = %path,
                upstream = %state.upstream,
                error = %err,
                "upstream request failed"
            );
            (
                StatusCode::BAD_GATEWAY,
                format!("stylesync: upstream {} unavailable: {err:#}", state.upstream),
            )
                .into_response()
        }
    }
}

async fn proxy_request(state: &ServeState, req: Request) -> Result<Response> {
    let (parts, body) = req.into_parts();

    let path_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("http://{}{}", state.upstream, path_query);

    let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes())
        .context("converting request method")?;

    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .context("reading request body")?;

    let mut upstream_req = state.client.request(method, &url);
    for (name, value) in &parts.headers {
        let name = name.as_str();
        // Host is set from the upstream URL; identity encoding keeps the
        // HTML injectable without a decompression step.
        if is_hop_by_hop(name) || name == "host" || name == "accept-encoding" {
            continue;
        }
        upstream_req = upstream_req.header(name, value.as_bytes());
    }
    upstream_req = upstream_req.header("accept-encoding", "identity");

    if !body_bytes.is_empty() {
        upstream_req = upstream_req.body(body_bytes.to_vec());
    }

    let upstream_resp = upstream_req.send().await.context("forwarding request")?;

    let status = StatusCode::from_u16(upstream_resp.status().as_u16())
        .context("converting response status")?;

    let is_html = upstream_resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"));

    // Content-length is dropped because injection changes the body size;
    // axum fills in the correct value.
    let response_headers: Vec<(String, Vec<u8>)> = upstream_resp
        .headers()
        .iter()
        .filter(|(name, _)| {
            let name = name.as_str();
            !is_hop_by_hop(name) && name != "content-length"
        })
        .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
        .collect();

    let payload = upstream_resp
        .bytes()
        .await
        .context("reading upstream response body")?;

    let payload = if is_html {
        debug!(url = %url, "injecting live-reload client into HTML response");
        inject_client_tag(&payload)
    } else {
        payload.to_vec()
    };

    let mut response = Response::builder().status(status);
    for (name, value) in response_headers {
        response = response.header(name, value);
    }

    Ok(response
        .body(Body::from(payload))
        .context("assembling proxied response")?)
}
