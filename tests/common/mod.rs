//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use dynamic_gateway::config::GatewayConfig;
use dynamic_gateway::routing::RoutingTable;
use dynamic_gateway::GatewayServer;

/// Start a mock backend on an ephemeral port.
///
/// Every response is a JSON object describing what the backend received:
/// `name`, `path` (including query), and the `host`, `x-forwarded-*` and
/// `x-request-id` headers.
pub async fn start_echo_backend(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        let body = describe(name, &head).to_string();
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn dead_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn describe(name: &str, head: &str) -> serde_json::Value {
    let mut lines = head.split("\r\n");
    let path = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("")
        .to_string();

    let mut json = serde_json::json!({ "name": name, "path": path });
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_ascii_lowercase();
            if matches!(
                key.as_str(),
                "host" | "x-forwarded-for" | "x-forwarded-host" | "x-forwarded-proto" | "x-request-id"
            ) {
                json[key] = serde_json::Value::String(value.trim().to_string());
            }
        }
    }
    json
}

/// Routing table whose bootstrap route points at `default_backend`.
pub fn table(primary_domain: &str, default_backend: SocketAddr) -> Arc<RoutingTable> {
    Arc::new(RoutingTable::new(primary_domain, &format!("http://{}", default_backend)).unwrap())
}

/// Serve the gateway for `table` on an ephemeral port.
pub async fn start_gateway(table: Arc<RoutingTable>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(&GatewayConfig::default(), table).unwrap();
    tokio::spawn(server.run(listener, std::future::pending()));
    addr
}
