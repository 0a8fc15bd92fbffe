//! Per-domain route tables.

use std::collections::HashMap;
use std::sync::Arc;

use crate::routing::matcher::DomainMatcher;
use crate::routing::route::Route;
use crate::routing::target::ProxyTarget;

/// A route together with the proxy action built for it.
#[derive(Debug)]
pub struct ResolvedRoute {
    pub route: Route,
    pub target: ProxyTarget,
}

impl ResolvedRoute {
    pub fn new(route: Route, target: ProxyTarget) -> Self {
        Self { route, target }
    }
}

/// All path-prefix entries registered under one domain pattern.
#[derive(Debug)]
pub struct DomainRouteTable {
    pattern: String,
    matcher: DomainMatcher,
    entries: HashMap<String, Arc<ResolvedRoute>>,
}

impl DomainRouteTable {
    /// Table for the primary domain, matched by exact equality.
    pub fn primary(domain: &str) -> Self {
        Self {
            pattern: domain.to_string(),
            matcher: DomainMatcher::Exact(domain.to_string()),
            entries: HashMap::new(),
        }
    }

    /// Table for a tenant pattern; the regex is compiled here, once.
    pub fn for_pattern(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            matcher: DomainMatcher::compile(pattern),
            entries: HashMap::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matcher(&self) -> &DomainMatcher {
        &self.matcher
    }

    pub fn get(&self, path_prefix: &str) -> Option<Arc<ResolvedRoute>> {
        self.entries.get(path_prefix).cloned()
    }

    /// Insert or overwrite the entry for the route's prefix.
    pub fn insert(&mut self, entry: Arc<ResolvedRoute>) {
        self.entries.insert(entry.route.path_prefix.clone(), entry);
    }

    pub fn remove(&mut self, path_prefix: &str) -> Option<Arc<ResolvedRoute>> {
        self.entries.remove(path_prefix)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
