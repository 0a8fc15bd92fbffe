//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all dispatch handler
//! - Wire up middleware (request ID, tracing, optional timeout)
//! - Serve plain HTTP or TLS until the shutdown future resolves

use axum::{routing::any, Router};
use axum_server::tls_rustls::RustlsConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, TlsConfig};
use crate::http::dispatch::dispatch_handler;
use crate::http::forward::{build_client, HttpClient};
use crate::http::request::GatewayRequestId;
use crate::routing::RoutingTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RoutingTable>,
    pub client: HttpClient,
    /// Value sent as `X-Forwarded-Proto`.
    pub forwarded_proto: &'static str,
}

/// Public listener of the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Fails only if the backend TLS client cannot be configured.
    pub fn new(config: &GatewayConfig, table: Arc<RoutingTable>) -> Result<Self, rustls::Error> {
        let state = AppState {
            table,
            client: build_client()?,
            forwarded_proto: if config.listener.tls.is_some() {
                "https"
            } else {
                "http"
            },
        };

        let router = Self::build_router(config.timeouts.request_secs, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(request_secs: Option<u64>, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state);

        if let Some(secs) = request_secs {
            router = router.layer(TimeoutLayer::new(Duration::from_secs(secs)));
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(GatewayRequestId))
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve plain HTTP on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Gateway listener stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` resolves.
    pub async fn run_tls<F>(
        self,
        addr: SocketAddr,
        tls: &TlsConfig,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;

        let handle = axum_server::Handle::new();
        let stopper = handle.clone();
        tokio::spawn(async move {
            shutdown.await;
            stopper.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        tracing::info!(address = %addr, "Gateway listening (TLS)");
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!("Gateway listener stopped");
        Ok(())
    }
}
