//! Request matching primitives.
//!
//! # Responsibilities
//! - Derive the routing key (first path segment) from a request path
//! - Match the Host header against a domain pattern
//!
//! # Design Decisions
//! - The primary domain matches by exact string equality only
//! - Every other pattern is an unanchored regex, compiled once per table
//! - A pattern that fails to compile yields a matcher that never matches;
//!   the table stays in place but is unreachable by host lookup
//! - Path matching is a map lookup on the derived prefix, never a scan

use regex::Regex;

/// Extract the routing key from a request path.
///
/// The key is everything up to (not including) the first `/` after the
/// leading one: `/api/users` → `/api`, `/health` → `/health`, `/` → `/`.
pub fn path_prefix(path: &str) -> &str {
    if path.is_empty() {
        return "/";
    }

    // `/` is ASCII, so any byte offset found here is a char boundary.
    match path.bytes().skip(1).position(|b| b == b'/') {
        Some(idx) => &path[..idx + 1],
        None => path,
    }
}

/// How a domain table decides whether it serves a host.
#[derive(Debug, Clone)]
pub enum DomainMatcher {
    /// The primary domain: exact comparison, never considered during wildcard scans.
    Exact(String),
    /// A tenant-supplied pattern.
    Pattern(Regex),
    /// A tenant-supplied pattern that did not compile.
    Unreachable,
}

impl DomainMatcher {
    /// Build the matcher for a tenant pattern.
    pub fn compile(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) => DomainMatcher::Pattern(re),
            Err(e) => {
                tracing::warn!(
                    pattern = %pattern,
                    error = %e,
                    "Domain pattern does not compile, table will be unreachable by host lookup"
                );
                DomainMatcher::Unreachable
            }
        }
    }

    /// Whether this matcher takes part in wildcard host lookup.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, DomainMatcher::Pattern(_))
    }

    /// Returns true if `host` is served by this matcher.
    pub fn matches(&self, host: &str) -> bool {
        match self {
            DomainMatcher::Exact(domain) => domain == host,
            DomainMatcher::Pattern(re) => re.is_match(host),
            DomainMatcher::Unreachable => false,
        }
    }
}
