//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the routing table with its bootstrap route
//! - Start background tasks (metrics, control-plane client, introspection)
//! - Bind the public listener and serve until shutdown
//! - Stop background tasks in order once serving ends
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The control-plane client starts before the listener; the gateway
//!   serves the bootstrap route until the first push arrives
//! - Shutdown waits a bounded time for background tasks to finish

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{self, AdminState};
use crate::config::GatewayConfig;
use crate::control_plane::ControlPlaneClient;
use crate::http::GatewayServer;
use crate::lifecycle::signals::shutdown_on_signal;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{RoutingError, RoutingTable};

const TASK_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Fatal errors raised before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot build routing table: {0}")]
    Routing(#[from] RoutingError),

    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("cannot configure backend TLS: {0}")]
    Tls(#[from] rustls::Error),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the gateway until a termination signal arrives.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));
    run_until(config, shutdown).await
}

/// Run the gateway until `shutdown` is triggered.
pub async fn run_until(config: GatewayConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let table = Arc::new(RoutingTable::new(
        config.routing.primary_domain.clone(),
        &config.routing.default_target,
    )?);
    let server = GatewayServer::new(&config, table.clone())?;

    if config.observability.metrics_enabled {
        metrics::init_metrics(parse_addr(&config.observability.metrics_address)?);
    }

    let mut control_plane_state = None;
    let mut control_plane_task = None;
    if config.control_plane.enabled {
        let client = ControlPlaneClient::new(config.control_plane.clone(), table.clone());
        control_plane_state = Some(client.state());
        control_plane_task = Some(client.spawn(shutdown.subscribe()));
    } else {
        tracing::warn!("Control plane disabled, serving the bootstrap route only");
    }

    let mut admin_task = None;
    if config.admin.enabled {
        let listener = bind(&config.admin.bind_address).await?;
        let state = AdminState::new(
            table.clone(),
            control_plane_state,
            config.admin.api_key.clone(),
        );
        admin_task = Some(tokio::spawn(admin::serve(listener, state, shutdown.wait())));
    }

    let served = match &config.listener.tls {
        Some(tls) => {
            let addr = parse_addr(&config.listener.bind_address)?;
            server.run_tls(addr, tls, shutdown.wait()).await
        }
        None => {
            let listener = bind(&config.listener.bind_address).await?;
            server.run(listener, shutdown.wait()).await
        }
    };

    // Serving can end with an error; everything else must stop either way.
    shutdown.trigger();

    if let Some(task) = control_plane_task {
        if tokio::time::timeout(TASK_JOIN_TIMEOUT, task).await.is_err() {
            tracing::warn!("Control-plane client did not stop in time");
        }
    }
    if let Some(task) = admin_task {
        match tokio::time::timeout(TASK_JOIN_TIMEOUT, task).await {
            Ok(Ok(Err(e))) => tracing::warn!(error = %e, "Admin listener failed"),
            Err(_) => tracing::warn!("Admin listener did not stop in time"),
            _ => {}
        }
    }

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn parse_addr(addr: &str) -> Result<SocketAddr, StartupError> {
    addr.parse()
        .map_err(|_| StartupError::InvalidAddress(addr.to_string()))
}

async fn bind(addr: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.to_string(),
            source,
        })
}
