//! Target resolution.
//!
//! A `ProxyTarget` is the proxy action for one route: the backend base URL,
//! parsed once when the route is installed and shared by every request the
//! route serves. Reconciliation always builds a fresh target, so replacing
//! an entry can never leave a request holding a stale backend.

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::Uri;
use std::str::FromStr;
use url::Url;

use crate::routing::error::TargetError;

/// A parsed, immutable backend base URL.
#[derive(Debug, Clone)]
pub struct ProxyTarget {
    url: Url,
    scheme: Scheme,
    authority: Authority,
    /// Base path without a trailing slash; empty when the target has no path.
    base_path: String,
    base_query: Option<String>,
}

impl ProxyTarget {
    /// Parse a forward target. Absolute `http` and `https` URLs with a host are accepted.
    pub fn parse(target: &str) -> Result<Self, TargetError> {
        let url = Url::parse(target).map_err(|e| TargetError::InvalidUrl {
            target: target.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => return Err(TargetError::UnsupportedScheme(other.to_string())),
        };

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h,
            _ => return Err(TargetError::MissingHost(target.to_string())),
        };

        let authority_str = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority_str).map_err(|e| TargetError::InvalidUrl {
            target: target.to_string(),
            reason: e.to_string(),
        })?;

        let base_path = url.path().trim_end_matches('/').to_string();
        let base_query = url.query().filter(|q| !q.is_empty()).map(str::to_string);

        Ok(Self {
            url,
            scheme,
            authority,
            base_path,
            base_query,
        })
    }

    /// The target as configured.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `host[:port]` of the backend, used for the outbound Host header.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Rewrite an inbound request URI so it points at this backend.
    ///
    /// The target's base path is joined with the request path using a single
    /// slash, and both query strings are kept.
    pub fn rewrite_uri(&self, original: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_path(&self.base_path, original.path());
        let query = match (self.base_query.as_deref(), original.query()) {
            (Some(base), Some(req)) if !req.is_empty() => Some(format!("{}&{}", base, req)),
            (Some(base), _) => Some(base.to_string()),
            (None, Some(req)) if !req.is_empty() => Some(req.to_string()),
            (None, _) => None,
        };

        let path_and_query = match query {
            Some(q) => format!("{}?{}", path, q),
            None => path,
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(PathAndQuery::from_str(&path_and_query)?)
            .build()
    }
}

impl std::fmt::Display for ProxyTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

fn join_path(base: &str, path: &str) -> String {
    if base.is_empty() {
        if path.is_empty() {
            return "/".to_string();
        }
        return path.to_string();
    }

    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
