//! Hit counter service.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 HIT COUNTER                  │
//!   Client Request     │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!   ───────────────────┼─▶│  http  │──▶│ gateway/ │──▶│  counting  │  │
//!                      │  │ server │   │ envelope │   │   proxy    │  │
//!                      │  └────────┘   └──────────┘   └─────┬──────┘  │
//!                      │                       increment(path)│        │
//!                      │                 ┌───────────────────┤        │
//!                      │                 ▼                   ▼ invoke │
//!                      │          ┌────────────┐     ┌──────────────┐ │
//!                      │          │  counter   │     │  downstream  │─┼──▶ Handler
//!                      │          │   table    │     │    client    │ │
//!                      │          └─────┬──────┘     └──────────────┘ │
//!                      │                │ snapshots / reporting        │
//!                      │          ┌─────▼──────┐                       │
//!                      │          │ admin API  │                       │
//!                      │          └────────────┘                       │
//!                      └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use hit_counter::admin::setup_admin_router;
use hit_counter::config::load_config;
use hit_counter::lifecycle::{self, shutdown, signals};
use hit_counter::observability::{logging, metrics};
use hit_counter::{Services, Shutdown};

#[derive(Parser)]
#[command(name = "hit-counter")]
#[command(about = "Counting proxy that records per-path hits", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "HIT_COUNTER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_tracing(&config.observability);
    tracing::info!("hit-counter v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        downstream = %config.downstream.target,
        table = %config.store.table,
        policy = ?config.counting.policy,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = Services::build(&config)?;
    let shutdown = Shutdown::new();

    if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
        let admin_app = setup_admin_router(services.admin_state(&config));
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(admin_listener, admin_app)
                .with_graceful_shutdown(shutdown::wait(admin_shutdown))
                .await
            {
                tracing::error!(error = %e, "Admin server failed");
            }
        });
    }

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let result = lifecycle::serve(&config, &services, listener, &shutdown).await;

    // Releases the admin server when the public one stopped on its own.
    shutdown.trigger();

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
