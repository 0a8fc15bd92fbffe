//! Control-plane client.
//!
//! # Responsibilities
//! - Hold a WebSocket connection to the control plane
//! - Decode pushed tenant batches and apply them to the routing table
//! - Reconnect forever on any transport failure
//!
//! # State Machine
//! ```text
//! Disconnected ──▶ Connecting ──(dial ok)──▶ Connected
//!      ▲               │                         │
//!      └──(dial fail, wait retry delay)          │
//!      └──────────(read error / close)───────────┘
//! ```
//!
//! # Design Decisions
//! - Messages are processed strictly in order on one task
//! - An undecodable frame is dropped; the connection stays open
//! - Shutdown is observed while dialing, waiting and reading; the open
//!   connection is closed before the task exits
//! - A connection shorter than the retry delay is followed by the same
//!   delay before redialing

use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::ControlPlaneConfig;
use crate::control_plane::codec::decode_batch;
use crate::observability::metrics;
use crate::resilience::backoff::reconnect_delay;
use crate::routing::RoutingTable;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close frames are sent with this bound so a dead peer cannot stall shutdown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Failed dial attempts between two warn-level log lines.
const WARN_EVERY: u64 = 60;

/// Connection state published to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Why a connection attempt or an open connection ended.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    #[error("dial timed out after {0:?}")]
    DialTimeout(Duration),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("connection closed by control plane")]
    Closed,
}

enum Exit {
    Shutdown,
    Disconnected(ControlPlaneError),
}

/// Drives the routing table from control-plane pushes.
pub struct ControlPlaneClient {
    config: ControlPlaneConfig,
    table: Arc<RoutingTable>,
    state_tx: watch::Sender<ConnectionState>,
}

impl ControlPlaneClient {
    pub fn new(config: ControlPlaneConfig, table: Arc<RoutingTable>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            table,
            state_tx,
        }
    }

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Run the client on its own task until `shutdown` fires.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Connect, read, reconnect; returns only on shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            endpoint = %self.config.redacted_endpoint(),
            "Control-plane client starting"
        );
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut connected_before = false;

        loop {
            let mut ws = tokio::select! {
                ws = self.connect() => ws,
                _ = shutdown.recv() => break,
            };

            self.set_state(ConnectionState::Connected);
            if connected_before {
                metrics::record_reconnect();
                tracing::info!("Reconnected to control plane");
            } else {
                tracing::info!("Connected to control plane");
            }
            connected_before = true;
            let connected_at = Instant::now();

            let exit = tokio::select! {
                err = self.read_until_disconnect(&mut ws) => Exit::Disconnected(err),
                _ = shutdown.recv() => Exit::Shutdown,
            };

            let _ = timeout(CLOSE_TIMEOUT, ws.close(None)).await;
            self.set_state(ConnectionState::Disconnected);

            match exit {
                Exit::Shutdown => break,
                Exit::Disconnected(e) => {
                    tracing::warn!(error = %e, "Control-plane connection lost, reconnecting");
                }
            }

            // A peer that accepts and drops at once must not drive a hot redial loop.
            if connected_at.elapsed() < retry_delay {
                tokio::select! {
                    _ = sleep(reconnect_delay(retry_delay)) => {}
                    _ = shutdown.recv() => break,
                }
            }
        }

        self.set_state(ConnectionState::Disconnected);
        tracing::info!("Control-plane client stopped");
    }

    /// Dial until a connection is established.
    async fn connect(&self) -> WsStream {
        let endpoint = self.config.endpoint();
        let dial_timeout = Duration::from_secs(self.config.dial_timeout_secs);
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            self.set_state(ConnectionState::Connecting);

            let result = match timeout(dial_timeout, connect_async(endpoint.as_str())).await {
                Ok(Ok((ws, _response))) => Ok(ws),
                Ok(Err(e)) => Err(ControlPlaneError::WebSocket(e)),
                Err(_) => Err(ControlPlaneError::DialTimeout(dial_timeout)),
            };

            match result {
                Ok(ws) => return ws,
                Err(e) if attempt == 1 || attempt % WARN_EVERY == 0 => {
                    tracing::warn!(
                        endpoint = %self.config.redacted_endpoint(),
                        attempt,
                        error = %e,
                        "Control-plane dial failed"
                    );
                }
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "Control-plane dial failed");
                }
            }

            self.set_state(ConnectionState::Disconnected);
            sleep(reconnect_delay(retry_delay)).await;
        }
    }

    /// Apply frames until the connection fails.
    async fn read_until_disconnect(&self, ws: &mut WsStream) -> ControlPlaneError {
        while let Some(message) = ws.next().await {
            match message {
                Ok(Message::Text(text)) => self.handle_frame(text.as_bytes()),
                Ok(Message::Binary(bytes)) => self.handle_frame(&bytes[..]),
                Ok(Message::Close(frame)) => {
                    if let Some(frame) = frame {
                        tracing::debug!(code = %frame.code, reason = %frame.reason.as_str(), "Close frame received");
                    }
                    return ControlPlaneError::Closed;
                }
                // Pings are answered by the transport.
                Ok(_) => {}
                Err(e) => return ControlPlaneError::WebSocket(e),
            }
        }
        ControlPlaneError::Closed
    }

    fn handle_frame(&self, frame: &[u8]) {
        let batch = match decode_batch(frame) {
            Ok(batch) => batch,
            Err(e) => {
                metrics::record_decode_failure();
                tracing::warn!(error = %e, bytes = frame.len(), "Dropping undecodable control-plane frame");
                return;
            }
        };

        for tenant in batch {
            tracing::info!(tenant = %tenant.tenant_name, routes = tenant.routes.len(), "Updating tenant");
            self.table.apply(tenant);
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "Control-plane state changed");
            metrics::record_control_plane_connected(state == ConnectionState::Connected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;

    fn unreachable_config() -> ControlPlaneConfig {
        ControlPlaneConfig {
            enabled: true,
            scheme: "ws".into(),
            // Port 1 is reserved and refuses connections on loopback.
            host: "127.0.0.1:1".into(),
            secret: "token".into(),
            dial_timeout_secs: 1,
            retry_delay_ms: 20,
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(
            serde_json::to_string(&ConnectionState::Connected).unwrap(),
            "\"connected\""
        );
    }

    #[tokio::test]
    async fn test_retries_until_shutdown() {
        let table = Arc::new(RoutingTable::new("example.com", "http://origin:80").unwrap());
        let client = ControlPlaneClient::new(unreachable_config(), table);
        let mut state = client.state();
        let shutdown = Shutdown::new();
        let handle = client.spawn(shutdown.subscribe());

        // The client keeps cycling between dialing and waiting without giving up.
        for _ in 0..4 {
            timeout(Duration::from_secs(5), state.changed())
                .await
                .expect("state should keep changing")
                .unwrap();
        }

        shutdown.trigger();
        timeout(Duration::from_secs(5), handle)
            .await
            .expect("client should stop on shutdown")
            .unwrap();
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_undecodable_frame_leaves_table_alone() {
        let table = Arc::new(RoutingTable::new("example.com", "http://origin:80").unwrap());
        let client = ControlPlaneClient::new(unreachable_config(), table.clone());

        client.handle_frame(b"not json");
        assert_eq!(table.domain_count(), 1);

        client.handle_frame(
            br#"[{"tenant_name": "t", "routes": [{"domain": "^a$", "route": "/", "forward_host": "http://a:1"}]}]"#,
        );
        assert!(table.lookup("a", "/").is_some());
    }
}
