//! Request forwarding.
//!
//! # Responsibilities
//! - Point the request at the route's backend (scheme, authority, path)
//! - Add proxy headers (X-Forwarded-*); the client's Host is passed through
//! - Stream request and response bodies without buffering
//!
//! # Design Decisions
//! - Hop-by-hop headers are stripped in both directions
//! - Any upstream failure is a 502; routing state is never touched here
//! - Outbound requests are HTTP/1.1 regardless of the inbound version
//! - Backends may be plain HTTP or HTTPS (rustls, webpki roots)

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Request, StatusCode, Version};
use axum::response::{IntoResponse, Response};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use std::net::SocketAddr;

use crate::routing::ProxyTarget;

/// Client used for every backend request.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Build the shared backend client, able to reach `http` and `https` targets.
pub fn build_client() -> Result<HttpClient, rustls::Error> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Ok(Client::builder(TokioExecutor::new()).build(connector))
}

/// Where the inbound request came from.
#[derive(Debug, Clone, Copy)]
pub struct ClientInfo {
    pub addr: Option<SocketAddr>,
    /// `http` or `https`, as seen by the client.
    pub proto: &'static str,
}

/// Send `request` to `target` and return the backend's response.
pub async fn forward(
    client: &HttpClient,
    target: &ProxyTarget,
    request: Request<Body>,
    info: ClientInfo,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let original_host = parts
        .headers
        .get(header::HOST)
        .cloned()
        .or_else(|| {
            parts
                .uri
                .authority()
                .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
        });

    parts.uri = match target.rewrite_uri(&parts.uri) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(upstream = %target, error = %e, "Failed to build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
        }
    };
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    set_forwarded_headers(&mut parts.headers, original_host.clone(), &info);
    // HTTP/2 clients carry the host in the URI authority only.
    if let Some(host) = original_host {
        parts.headers.entry(header::HOST).or_insert(host);
    }

    match client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(upstream = %target, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

fn set_forwarded_headers(headers: &mut HeaderMap, original_host: Option<HeaderValue>, info: &ClientInfo) {
    if let Some(addr) = info.addr {
        let ip = addr.ip().to_string();
        let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(prior) if !prior.is_empty() => format!("{}, {}", prior, ip),
            _ => ip,
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    if let Some(host) = original_host {
        headers.insert(X_FORWARDED_HOST, host);
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static(info.proto));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-custom"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-custom", HeaderValue::from_static("1"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("x-keep", HeaderValue::from_static("yes"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers["x-keep"], "yes");
    }

    #[test]
    fn test_forwarded_headers_append() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("10.0.0.1"));

        let info = ClientInfo {
            addr: Some("192.168.1.7:5555".parse().unwrap()),
            proto: "https",
        };
        set_forwarded_headers(&mut headers, Some(HeaderValue::from_static("shop.test")), &info);

        assert_eq!(headers[X_FORWARDED_FOR], "10.0.0.1, 192.168.1.7");
        assert_eq!(headers[X_FORWARDED_HOST], "shop.test");
        assert_eq!(headers[X_FORWARDED_PROTO], "https");
    }

    #[test]
    fn test_forwarded_headers_without_peer() {
        let mut headers = HeaderMap::new();
        let info = ClientInfo { addr: None, proto: "http" };
        set_forwarded_headers(&mut headers, None, &info);

        assert!(headers.get(X_FORWARDED_FOR).is_none());
        assert!(headers.get(X_FORWARDED_HOST).is_none());
        assert_eq!(headers[X_FORWARDED_PROTO], "http");
    }
}
