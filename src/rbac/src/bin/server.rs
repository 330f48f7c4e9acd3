//! # RBAC HTTP Server
//!
//! Serves access checks and landing resolution for the dashboard.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `PORT` - HTTP server port (default: 8080)
//! - `METRICS_PORT` - Metrics server port (default: 9090)
//! - `POLICY_FILE` - TOML policy table (default: builtin table)
//! - `AUDIT_CAPACITY` - Audit entries kept in memory (default: 10000)
//! - `RUST_LOG` - Log level (default: info)

use anyhow::{Context, Result};
use axum::serve;
use dashguard_rbac::http::{create_metrics_router, create_router, AppState};
use dashguard_rbac::{EngineConfig, PolicyTable, RbacEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Server settings read from the environment
#[derive(Debug, Clone)]
struct ServerConfig {
    port: u16,
    metrics_port: u16,
    policy_file: Option<String>,
    audit_capacity: usize,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            port: env_or("PORT", 8080),
            metrics_port: env_or("METRICS_PORT", 9090),
            policy_file: std::env::var("POLICY_FILE").ok(),
            audit_capacity: env_or("AUDIT_CAPACITY", 10_000),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }

    info!("Starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dashguard RBAC Server v{}", dashguard_rbac::VERSION);

    let config = ServerConfig::from_env();
    info!("Configuration:");
    info!("  Port: {}", config.port);
    info!("  Metrics Port: {}", config.metrics_port);
    info!("  Policy File: {}", config.policy_file.as_deref().unwrap_or("<builtin>"));
    info!("  Audit Capacity: {}", config.audit_capacity);

    let table = match &config.policy_file {
        Some(path) => PolicyTable::load(path)
            .with_context(|| format!("failed to load policy table from {}", path))?,
        None => PolicyTable::builtin(),
    };

    let engine = RbacEngine::with_config(
        Arc::new(table),
        EngineConfig {
            audit_capacity: config.audit_capacity,
            ..Default::default()
        },
    );

    let state = AppState::new(Arc::new(engine));

    let app = create_router(state.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let metrics_app = create_metrics_router(state);
    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));

    info!("Starting HTTP server on {}", addr);
    info!("Starting metrics server on {}", metrics_addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP server on {}", addr))?;
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics server on {}", metrics_addr))?;

    let server = serve(listener, app.into_make_service()).with_graceful_shutdown(shutdown_signal());
    let metrics_server = serve(metrics_listener, metrics_app.into_make_service())
        .with_graceful_shutdown(shutdown_signal());

    tokio::try_join!(
        async {
            server.await.map_err(|e| {
                error!("HTTP server error: {}", e);
                e
            })
        },
        async {
            metrics_server.await.map_err(|e| {
                error!("Metrics server error: {}", e);
                e
            })
        }
    )?;

    info!("Servers shut down gracefully");
    Ok(())
}
