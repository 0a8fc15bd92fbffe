//! Request dispatch.
//!
//! Resolves each inbound request against the routing table and hands it to
//! the forwarder. Unmatched requests fall through to the bootstrap route.

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, Request};
use axum::response::Response;
use std::net::SocketAddr;
use std::time::Instant;

use crate::http::forward::{forward, ClientInfo};
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Catch-all handler for the public listener.
pub async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let host = request_host(&request).to_string();
    let path = request.uri().path().to_string();

    let (route, matched) = state.table.resolve(&host, &path);

    tracing::debug!(
        request_id = %request_id(&request),
        method = %method,
        host = %host,
        path = %path,
        upstream = %route.target,
        matched,
        "Dispatching request"
    );

    let info = ClientInfo {
        addr: request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr),
        proto: state.forwarded_proto,
    };

    let response = forward(&state.client, &route.target, request, info).await;
    metrics::record_request(&method, response.status().as_u16(), matched, start);
    response
}

/// The host a request was addressed to: the `Host` header, then the URI
/// authority (HTTP/2), otherwise empty.
pub fn request_host<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
        .unwrap_or("")
}
