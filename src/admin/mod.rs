//! Introspection API.
//!
//! Served on its own listener so operator traffic never shares a host
//! namespace with tenant routes.
//!
//! # Endpoints
//! - `GET /routing`: domain pattern → path prefixes, one consistent snapshot
//! - `GET /status`: version, primary domain, table sizes, control-plane state

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::control_plane::ConnectionState;
use crate::routing::RoutingTable;
use self::auth::admin_auth_middleware;
use self::handlers::{get_routing, get_status};

/// State shared by the introspection handlers.
#[derive(Clone)]
pub struct AdminState {
    pub table: Arc<RoutingTable>,
    pub control_plane: Option<watch::Receiver<ConnectionState>>,
    pub api_key: Option<Arc<str>>,
}

impl AdminState {
    pub fn new(
        table: Arc<RoutingTable>,
        control_plane: Option<watch::Receiver<ConnectionState>>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            table,
            control_plane,
            api_key: api_key.filter(|k| !k.is_empty()).map(Arc::from),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/routing", get(get_routing))
        .route("/status", get(get_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}

/// Serve the introspection API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AdminState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
