//! Route and tenant metadata types.
//!
//! These mirror the control plane's wire format directly: a push is a JSON
//! array of tenants, each carrying its full list of routes.

use serde::{Deserialize, Deserializer, Serialize};

/// A single (domain pattern, path prefix) → backend binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Exact primary domain, or a regex matched against the Host header.
    /// Empty means the primary domain.
    #[serde(rename = "domain")]
    pub domain_pattern: String,

    /// First path segment served by this route (`/`, `/api`, ...).
    #[serde(rename = "route")]
    pub path_prefix: String,

    /// Base URL requests are forwarded to.
    #[serde(rename = "forward_host")]
    pub forward_target: String,
}

impl Route {
    pub fn new(
        domain_pattern: impl Into<String>,
        path_prefix: impl Into<String>,
        forward_target: impl Into<String>,
    ) -> Self {
        Self {
            domain_pattern: domain_pattern.into(),
            path_prefix: path_prefix.into(),
            forward_target: forward_target.into(),
        }
    }

    /// A prefix is usable only if it is non-empty and starts with `/`.
    pub fn has_valid_prefix(&self) -> bool {
        self.path_prefix.starts_with('/')
    }
}

/// Everything the control plane knows about one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMetadata {
    /// Unique tenant key.
    pub tenant_name: String,

    /// Full route set; later duplicates of a (domain, prefix) key shadow earlier ones.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub routes: Vec<Route>,
}

impl TenantMetadata {
    pub fn new(tenant_name: impl Into<String>, routes: Vec<Route>) -> Self {
        Self {
            tenant_name: tenant_name.into(),
            routes,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Route>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Route>>::deserialize(deserializer)?.unwrap_or_default())
}
