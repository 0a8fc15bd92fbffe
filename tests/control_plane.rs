//! Control-plane client against a scripted WebSocket server.

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

use dynamic_gateway::config::ControlPlaneConfig;
use dynamic_gateway::control_plane::{ConnectionState, ControlPlaneClient};
use dynamic_gateway::routing::{Route, RoutingTable, TenantMetadata};
use dynamic_gateway::Shutdown;

const SECRET: &str = "s3cret";

enum Step {
    Send(Message),
    /// Drop the current connection and wait for the next one.
    Drop,
}

struct ScriptedServer {
    addr: SocketAddr,
    steps: mpsc::UnboundedSender<Step>,
    /// Request paths of every accepted handshake.
    paths: Arc<Mutex<Vec<String>>>,
}

impl ScriptedServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (steps, mut rx) = mpsc::unbounded_channel();
        let paths = Arc::new(Mutex::new(Vec::new()));
        let seen = paths.clone();

        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let seen = seen.clone();
                let callback = move |req: &Request, res: Response| -> Result<Response, ErrorResponse> {
                    seen.lock().push(req.uri().path().to_string());
                    Ok(res)
                };
                let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(socket, callback).await else {
                    continue;
                };

                loop {
                    tokio::select! {
                        step = rx.recv() => match step {
                            Some(Step::Send(message)) => {
                                if ws.send(message).await.is_err() {
                                    break;
                                }
                            }
                            Some(Step::Drop) => break,
                            None => return,
                        },
                        incoming = ws.next() => {
                            if !matches!(incoming, Some(Ok(_))) {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self { addr, steps, paths }
    }

    fn send(&self, message: Message) {
        self.steps.send(Step::Send(message)).unwrap();
    }

    fn drop_connection(&self) {
        self.steps.send(Step::Drop).unwrap();
    }

    fn connections(&self) -> usize {
        self.paths.lock().len()
    }

    fn config(&self) -> ControlPlaneConfig {
        ControlPlaneConfig {
            enabled: true,
            scheme: "ws".into(),
            host: self.addr.to_string(),
            secret: SECRET.into(),
            dial_timeout_secs: 1,
            retry_delay_ms: 50,
        }
    }
}

async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {}", what);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn batch(json: serde_json::Value) -> Message {
    Message::text(json.to_string())
}

#[tokio::test]
async fn test_pushes_update_routing_table_across_reconnects() {
    let server = ScriptedServer::start().await;
    let table = Arc::new(RoutingTable::new("gw.test", "http://127.0.0.1:3000").unwrap());
    let shutdown = Shutdown::new();

    let client = ControlPlaneClient::new(server.config(), table.clone());
    let mut state = client.state();
    let task = client.spawn(shutdown.subscribe());

    wait_until("first connection", || server.connections() == 1).await;
    assert_eq!(server.paths.lock()[0], format!("/router/{}", SECRET));

    server.send(batch(serde_json::json!([{
        "tenant_name": "shop",
        "routes": [
            {"domain": r"shop\.test", "route": "/", "forward_host": "http://127.0.0.1:4000"},
            {"domain": r"shop\.test", "route": "/api", "forward_host": "http://127.0.0.1:4001"}
        ]
    }])));
    wait_until("shop routes", || table.lookup("shop.test", "/api/x").is_some()).await;

    // Garbage is dropped; the same connection keeps delivering.
    server.send(Message::binary(b"{not json".to_vec()));
    server.send(Message::binary(
        serde_json::json!([{"tenant_name": "blog", "routes": null}]).to_string().into_bytes(),
    ));
    wait_until("blog tenant", || table.tenant_names().contains(&"blog".to_string())).await;
    assert_eq!(server.connections(), 1);

    server.drop_connection();
    wait_until("reconnect", || server.connections() == 2).await;

    // A push replaces the tenant's previous routes.
    server.send(batch(serde_json::json!([{
        "tenant_name": "shop",
        "routes": [
            {"domain": r"shop\.test", "route": "/v2", "forward_host": "http://127.0.0.1:4002"}
        ]
    }])));
    wait_until("replacement", || table.lookup("shop.test", "/v2").is_some()).await;
    assert!(table.lookup("shop.test", "/api").is_none());
    assert!(table.lookup("shop.test", "/").is_none());
    assert_eq!(
        table.tenant_routes("shop").unwrap(),
        vec![Route::new(r"shop\.test", "/v2", "http://127.0.0.1:4002")]
    );

    state
        .wait_for(|s| *s == ConnectionState::Connected)
        .await
        .unwrap();

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("client did not stop")
        .unwrap();
    assert_eq!(*state.borrow(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_short_lived_connections_are_throttled() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            if let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = ws.close(None).await;
            }
        }
    });

    let table = Arc::new(RoutingTable::new("gw.test", "http://127.0.0.1:3000").unwrap());
    let config = ControlPlaneConfig {
        enabled: true,
        scheme: "ws".into(),
        host: addr.to_string(),
        secret: SECRET.into(),
        dial_timeout_secs: 1,
        retry_delay_ms: 200,
    };
    let shutdown = Shutdown::new();
    let task = ControlPlaneClient::new(config, table).spawn(shutdown.subscribe());

    tokio::time::sleep(Duration::from_millis(700)).await;
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("client did not stop")
        .unwrap();

    let connections = accepted.load(Ordering::SeqCst);
    assert!(connections >= 1, "client never connected");
    assert!(connections <= 5, "{} connections in 700ms", connections);
}

#[test]
fn test_concurrent_pushes_for_disjoint_tenants() {
    const WRITERS: usize = 4;
    const PUSHES: usize = 100;

    let table = RoutingTable::new("gw.test", "http://127.0.0.1:3000").unwrap();
    let pattern = |w: usize| format!(r"^tenant{}\.test$", w);

    std::thread::scope(|scope| {
        for w in 0..WRITERS {
            let table = &table;
            scope.spawn(move || {
                for i in 0..PUSHES {
                    let target = format!("http://127.0.0.1:{}", 4000 + i);
                    let routes = vec![
                        Route::new(pattern(w), "/a", target.clone()),
                        Route::new(pattern(w), "/b", target),
                    ];
                    table.apply(TenantMetadata::new(format!("t{}", w), routes));
                }
            });
        }

        for _ in 0..4 {
            let table = &table;
            scope.spawn(move || {
                for i in 0..500 {
                    let host = format!("tenant{}.test", i % WRITERS);
                    let (route, _) = table.resolve(&host, "/a");
                    assert!(route.route.path_prefix == "/a" || route.route.path_prefix == "/");

                    // Both prefixes of one push are installed together.
                    let snapshot = table.snapshot();
                    for w in 0..WRITERS {
                        if let Some(prefixes) = snapshot.get(&pattern(w)) {
                            assert_eq!(prefixes.len(), 2);
                        }
                    }
                }
            });
        }
    });

    assert_eq!(table.tenant_names().len(), WRITERS);
    assert_eq!(table.domain_count(), WRITERS + 1);
    for w in 0..WRITERS {
        let host = format!("tenant{}.test", w);
        let (route, matched) = table.resolve(&host, "/b/c");
        assert!(matched);
        assert_eq!(route.route.forward_target, format!("http://127.0.0.1:{}", 4000 + PUSHES - 1));
        assert_eq!(table.tenant_routes(&format!("t{}", w)).unwrap().len(), 2);
    }
}
