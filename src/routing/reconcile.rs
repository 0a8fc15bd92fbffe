//! Tenant reconciliation.
//!
//! Replaces one tenant's entire contribution to the table with a new push.
//! This is a full replace, not a diff: every route from the previous push is
//! removed, then every route of the new push is rebuilt from scratch. The
//! caller holds the table lock for the whole call, so lookups never observe
//! a tenant halfway through the swap.

use std::collections::HashSet;
use std::sync::Arc;

use crate::routing::domain::ResolvedRoute;
use crate::routing::error::TargetError;
use crate::routing::route::{Route, TenantMetadata};
use crate::routing::table::TableState;
use crate::routing::target::ProxyTarget;

/// Why a single route from a push was not installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The prefix is empty or does not start with `/`.
    InvalidPrefix,
    /// The route would replace the bootstrap route of the primary domain.
    BootstrapRoute,
    /// The forward target could not be parsed.
    InvalidTarget(TargetError),
}

impl SkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::InvalidPrefix => "invalid_prefix",
            SkipReason::BootstrapRoute => "bootstrap_route",
            SkipReason::InvalidTarget(e) => e.reason(),
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InvalidPrefix => write!(f, "path prefix must start with '/'"),
            SkipReason::BootstrapRoute => write!(f, "the primary domain's '/' route is reserved"),
            SkipReason::InvalidTarget(e) => write!(f, "{}", e),
        }
    }
}

/// A route left out of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRoute {
    pub route: Route,
    pub reason: SkipReason,
}

/// Outcome of one `apply` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub tenant: String,
    /// Entries deleted from the previous push.
    pub removed: usize,
    /// Entries installed from the new push (shadowed duplicates included).
    pub installed: usize,
    pub skipped: Vec<SkippedRoute>,
}

/// Apply `metadata` to `state`. Must be called with the table lock held.
pub(crate) fn apply(state: &mut TableState, metadata: TenantMetadata) -> ReconcileReport {
    let TenantMetadata {
        tenant_name,
        routes,
    } = metadata;

    let mut report = ReconcileReport {
        tenant: tenant_name.clone(),
        ..Default::default()
    };

    // Removing the record up front also covers a first push, where there is none.
    if let Some(previous) = state.tenants.remove(&tenant_name) {
        let mut seen = HashSet::new();
        for route in &previous.routes {
            let domain = state.domain_key(&route.domain_pattern).to_string();
            if !seen.insert((domain.clone(), route.path_prefix.clone())) {
                continue;
            }
            if state.remove_entry(&domain, &route.path_prefix) {
                report.removed += 1;
            }
        }
    }

    let mut materialized = Vec::with_capacity(routes.len());
    for route in routes {
        match build_entry(state, &route) {
            Ok(entry) => {
                tracing::debug!(
                    tenant = %tenant_name,
                    domain = %route.domain_pattern,
                    route = %route.path_prefix,
                    upstream = %route.forward_target,
                    "Installing route"
                );
                let domain = state.domain_key(&route.domain_pattern).to_string();
                state.table_mut_or_create(&domain).insert(entry);
                materialized.push(route);
                report.installed += 1;
            }
            Err(reason) => {
                tracing::warn!(
                    tenant = %tenant_name,
                    domain = %route.domain_pattern,
                    route = %route.path_prefix,
                    upstream = %route.forward_target,
                    reason = %reason,
                    "Skipping route"
                );
                report.skipped.push(SkippedRoute { route, reason });
            }
        }
    }

    state.tenants.insert(
        tenant_name.clone(),
        TenantMetadata::new(tenant_name, materialized),
    );

    report
}

fn build_entry(state: &TableState, route: &Route) -> Result<Arc<ResolvedRoute>, SkipReason> {
    if !route.has_valid_prefix() {
        return Err(SkipReason::InvalidPrefix);
    }

    if state.domain_key(&route.domain_pattern) == state.primary_domain && route.path_prefix == "/" {
        return Err(SkipReason::BootstrapRoute);
    }

    let target = ProxyTarget::parse(&route.forward_target).map_err(SkipReason::InvalidTarget)?;
    Ok(Arc::new(ResolvedRoute::new(route.clone(), target)))
}
