//! Portfolio Rebalancer account service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rebalancer_db::{DbManager, run_migrations};
use rebalancer_server::config::Args;
use rebalancer_server::{AppMailer, ServerState, router};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("rebalancer=info".parse().context("log filter")?)
                .add_directive("tower_http=info".parse().context("log filter")?),
        )
        .json()
        .init();

    let args = Args::parse();
    tracing::info!(port = args.port, "Starting Portfolio Rebalancer server...");

    let db = DbManager::connect(&args.db_config())
        .await
        .context("Failed to connect to SurrealDB")?;
    let applied = run_migrations(db.client())
        .await
        .context("Failed to apply schema migrations")?;
    tracing::info!(applied, "Schema up to date");

    let auth_config = args.auth_config();
    let mailer = AppMailer::from_settings(args.smtp_settings().as_ref(), &auth_config.mail_from)
        .context("Failed to configure mail transport")?;
    tracing::info!(transport = mailer.transport_name(), "Mail transport ready");

    let state = Arc::new(ServerState::new(
        db.client().clone(),
        args.password_pepper.clone(),
        mailer,
        auth_config,
        args.default_scheme.clone(),
        args.secure_cookie,
    ));

    if let Err(e) = state.auth.purge_expired_sessions().await {
        tracing::warn!(error = %e, "Could not purge expired sessions");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Portfolio Rebalancer server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
