//! Hotelhub Gateway - HTTP API Gateway
//!
//! This is the main entry point for the gateway service.
//!
//! # Dev Mode
//!
//! Build with `--features dev-mode` and set `DEV_MODE=true` to use a mock
//! verifier that doesn't require network access to the identity provider.
//! Use tokens in format: `test-token:<uid>:<role>`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "dev-mode")]
use hotelhub_auth::MockVerifier;
use hotelhub_auth::{AuthConfig, IdentityVerifier, JwksVerifier};
use hotelhub_gateway::rate_limit::spawn_purge_task;
use hotelhub_gateway::{create_router, GatewayConfig, GatewayState};
use hotelhub_routing::RouteTable;
use hotelhub_upstream::HttpForwarder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::from_filename(".env.gateway").ok();
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hotelhub=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Hotelhub Gateway");

    let config = GatewayConfig::from_env()?;
    tracing::info!(
        listen_addr = %config.listen_addr(),
        routes_file = ?config.routes_file,
        rate_limit_max = config.rate_limit_max_requests,
        rate_limit_window_minutes = config.rate_limit_window_minutes,
        "Gateway configuration loaded"
    );

    let routes = config.route_table()?;
    tracing::info!(
        services = routes.services().len(),
        routes = routes.route_count(),
        "Route table loaded"
    );

    if config.dev_mode {
        return serve_dev(config, routes).await;
    }

    let project_id = config.require_project_id()?.to_string();
    let mut auth_config = AuthConfig::for_project(project_id);
    if let Some(jwks_url) = &config.jwks_url {
        auth_config.jwks_url.clone_from(jwks_url);
    }
    tracing::info!(
        project_id = %auth_config.project_id,
        jwks_url = %auth_config.jwks_url,
        "Token verifier initialized"
    );

    serve(config, routes, Arc::new(JwksVerifier::new(auth_config))).await
}

#[cfg(feature = "dev-mode")]
async fn serve_dev(
    config: GatewayConfig,
    routes: RouteTable,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::warn!("DEV MODE ENABLED - using mock token verifier");
    tracing::warn!("Use tokens in format: test-token:<uid>:<role>");
    serve(config, routes, Arc::new(MockVerifier)).await
}

#[cfg(not(feature = "dev-mode"))]
async fn serve_dev(
    _config: GatewayConfig,
    _routes: RouteTable,
) -> Result<(), Box<dyn std::error::Error>> {
    Err("DEV_MODE requires a binary built with --features dev-mode".into())
}

async fn serve<V>(
    config: GatewayConfig,
    routes: RouteTable,
    verifier: Arc<V>,
) -> Result<(), Box<dyn std::error::Error>>
where
    V: IdentityVerifier + 'static,
{
    let listen_addr = config.listen_addr();
    let forwarder = Arc::new(HttpForwarder::new(config.upstream_timeout()));
    let state = GatewayState::new(routes, verifier, forwarder, config);

    spawn_purge_task(Arc::clone(&state.rate_limiter), Duration::from_secs(60));

    let app = create_router(state);

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("HTTP server closed");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Ctrl+C received: closing HTTP server"),
        () = terminate => tracing::info!("SIGTERM received: closing HTTP server"),
    }
}
