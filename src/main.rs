//! Dynamic gateway (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                    GATEWAY                    │
//!   Client Request       │  ┌─────────┐   ┌──────────┐   ┌───────────┐   │
//!   ─────────────────────┼─▶│  http   │──▶│ dispatch │──▶│  forward  │───┼──▶ Backend
//!                        │  │ server  │   └────┬─────┘   └───────────┘   │
//!                        │  └─────────┘        │ lookup                  │
//!                        │                ┌────▼─────┐                   │
//!                        │                │ routing  │◀── apply ──┐      │
//!                        │                │  table   │            │      │
//!                        │                └────┬─────┘   ┌────────┴───┐  │
//!                        │                     │snapshot │  control   │◀─┼── Control plane
//!                        │                ┌────▼─────┐   │   plane    │  │    (WebSocket)
//!                        │                │  admin   │   │  client    │  │
//!                        │                └──────────┘   └────────────┘  │
//!                        └───────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use dynamic_gateway::config::{self, GatewayConfig};
use dynamic_gateway::lifecycle;
use dynamic_gateway::observability::logging;

const DEV_BIND_ADDRESS: &str = "0.0.0.0:9900";

#[derive(Parser)]
#[command(name = "dynamic-gateway")]
#[command(about = "Multi-tenant HTTP gateway driven by a control plane", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Domain served by the bootstrap route
    #[arg(short = 'd', long)]
    primary_domain: Option<String>,

    /// Backend for unmatched requests
    #[arg(short = 't', long)]
    default_target: Option<String>,

    /// Public listener address
    #[arg(long)]
    bind: Option<String>,

    /// Plain HTTP on 0.0.0.0:9900, TLS settings ignored
    #[arg(long)]
    dev: bool,
}

impl Cli {
    fn apply(self, config: &mut GatewayConfig) {
        if let Some(domain) = self.primary_domain {
            config.routing.primary_domain = domain;
        }
        if let Some(target) = self.default_target {
            config.routing.default_target = target;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if self.dev {
            config.listener.bind_address = DEV_BIND_ADDRESS.to_string();
            config.listener.tls = None;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(mut config) => {
            cli.apply(&mut config);
            config::finalize(config)
        }
        Err(e) => Err(e),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dynamic-gateway: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);

    // Several rustls backends are linked in; pin one for every TLS user.
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        primary_domain = %config.routing.primary_domain,
        default_target = %config.routing.default_target,
        control_plane = %config.control_plane.redacted_endpoint(),
        "Configuration loaded"
    );

    match lifecycle::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway stopped with an error");
            ExitCode::FAILURE
        }
    }
}
