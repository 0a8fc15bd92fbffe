//! The live routing table.
//!
//! # Responsibilities
//! - Hold every domain table plus the last applied metadata per tenant
//! - Answer (host, path) lookups from the request path
//! - Apply tenant pushes from the control plane atomically
//! - Produce a consistent snapshot for introspection
//!
//! # Design Decisions
//! - One exclusive lock around all state: lookups, reconciliation and
//!   snapshots are serialized, and the lock is never held across I/O
//! - The bootstrap route lives in the primary table and is also kept
//!   outside the lock so the fallback path never contends
//! - Wildcard precedence is registration order: the earliest created table
//!   whose pattern matches the host wins
//! - Empty tables are pruned immediately; the primary table never is

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::observability::metrics;
use crate::routing::domain::{DomainRouteTable, ResolvedRoute};
use crate::routing::error::{RoutingError, RoutingResult};
use crate::routing::matcher::path_prefix;
use crate::routing::reconcile::{self, ReconcileReport};
use crate::routing::route::{Route, TenantMetadata};
use crate::routing::target::ProxyTarget;

/// Domain pattern → path prefix → route identity (the prefix itself).
pub type RoutingSnapshot = BTreeMap<String, BTreeMap<String, String>>;

/// State guarded by the table lock.
#[derive(Debug)]
pub(crate) struct TableState {
    pub(crate) primary_domain: String,
    pub(crate) domains: HashMap<String, DomainRouteTable>,
    /// Non-primary patterns, oldest first.
    pub(crate) order: Vec<String>,
    pub(crate) tenants: HashMap<String, TenantMetadata>,
}

impl TableState {
    /// Map a route's domain pattern to its table key; empty means primary.
    pub(crate) fn domain_key<'a>(&'a self, pattern: &'a str) -> &'a str {
        if pattern.is_empty() {
            &self.primary_domain
        } else {
            pattern
        }
    }

    pub(crate) fn table_mut_or_create(&mut self, pattern: &str) -> &mut DomainRouteTable {
        let order = &mut self.order;
        self.domains.entry(pattern.to_string()).or_insert_with(|| {
            order.push(pattern.to_string());
            DomainRouteTable::for_pattern(pattern)
        })
    }

    /// Delete one entry, pruning the table if it becomes empty.
    /// The bootstrap entry is never removed.
    pub(crate) fn remove_entry(&mut self, pattern: &str, prefix: &str) -> bool {
        let is_primary = pattern == self.primary_domain;
        if is_primary && prefix == "/" {
            return false;
        }

        let Some(table) = self.domains.get_mut(pattern) else {
            return false;
        };
        let removed = table.remove(prefix).is_some();

        if table.is_empty() && !is_primary {
            self.domains.remove(pattern);
            self.order.retain(|p| p != pattern);
        }
        removed
    }

    fn lookup(&self, domain: &str, prefix: &str) -> Option<Arc<ResolvedRoute>> {
        if domain == self.primary_domain {
            return self.domains.get(domain).and_then(|t| t.get(prefix));
        }

        self.order
            .iter()
            .filter_map(|pattern| self.domains.get(pattern))
            .find(|table| table.matcher().is_wildcard() && table.matcher().matches(domain))
            .and_then(|table| table.get(prefix))
    }
}

/// Routing table shared by the dispatch path and the control-plane client.
#[derive(Debug)]
pub struct RoutingTable {
    primary_domain: String,
    bootstrap: Arc<ResolvedRoute>,
    state: Mutex<TableState>,
}

impl RoutingTable {
    /// Build the table with its bootstrap route (`primary_domain` + `/` → `default_target`).
    ///
    /// Fails if the bootstrap route cannot be built; the gateway must not
    /// start without it.
    pub fn new(primary_domain: impl Into<String>, default_target: &str) -> RoutingResult<Self> {
        let primary_domain = primary_domain.into();
        if primary_domain.is_empty() {
            return Err(RoutingError::EmptyPrimaryDomain);
        }

        let target = ProxyTarget::parse(default_target)?;
        let bootstrap = Arc::new(ResolvedRoute::new(
            Route::new(primary_domain.clone(), "/", default_target),
            target,
        ));

        let mut primary = DomainRouteTable::primary(&primary_domain);
        primary.insert(bootstrap.clone());

        let mut domains = HashMap::new();
        domains.insert(primary_domain.clone(), primary);

        tracing::info!(
            primary_domain = %primary_domain,
            default_target = %default_target,
            "Routing table initialized"
        );

        Ok(Self {
            primary_domain: primary_domain.clone(),
            bootstrap,
            state: Mutex::new(TableState {
                primary_domain,
                domains,
                order: Vec::new(),
                tenants: HashMap::new(),
            }),
        })
    }

    pub fn primary_domain(&self) -> &str {
        &self.primary_domain
    }

    /// The permanent `/` route of the primary domain.
    pub fn bootstrap(&self) -> Arc<ResolvedRoute> {
        self.bootstrap.clone()
    }

    /// Find the route serving `path` on `domain`, without any fallback.
    pub fn lookup(&self, domain: &str, path: &str) -> Option<Arc<ResolvedRoute>> {
        let prefix = path_prefix(path);
        self.state.lock().lookup(domain, prefix)
    }

    /// Lookup with the global fallback applied. The flag is true when a
    /// configured route matched rather than the bootstrap route.
    pub fn resolve(&self, domain: &str, path: &str) -> (Arc<ResolvedRoute>, bool) {
        match self.lookup(domain, path) {
            Some(route) => (route, true),
            None => (self.bootstrap(), false),
        }
    }

    /// Replace a tenant's routes with `metadata`.
    pub fn apply(&self, metadata: TenantMetadata) -> ReconcileReport {
        let (report, domains, tenants) = {
            let mut state = self.state.lock();
            let report = reconcile::apply(&mut state, metadata);
            (report, state.domains.len(), state.tenants.len())
        };

        tracing::info!(
            tenant = %report.tenant,
            removed = report.removed,
            installed = report.installed,
            skipped = report.skipped.len(),
            "Tenant routes reconciled"
        );
        metrics::record_reconcile(&report, domains, tenants);

        report
    }

    /// Consistent view of every domain table and its prefixes.
    pub fn snapshot(&self) -> RoutingSnapshot {
        let state = self.state.lock();
        state
            .domains
            .values()
            .map(|table| {
                let routes = table
                    .prefixes()
                    .map(|p| (p.to_string(), p.to_string()))
                    .collect();
                (table.pattern().to_string(), routes)
            })
            .collect()
    }

    /// Names of all tenants that have pushed metadata, sorted.
    pub fn tenant_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().tenants.keys().cloned().collect();
        names.sort();
        names
    }

    /// Routes currently materialized for a tenant.
    pub fn tenant_routes(&self, tenant: &str) -> Option<Vec<Route>> {
        self.state
            .lock()
            .tenants
            .get(tenant)
            .map(|t| t.routes.clone())
    }

    /// Number of domain tables, the primary one included.
    pub fn domain_count(&self) -> usize {
        self.state.lock().domains.len()
    }
}
