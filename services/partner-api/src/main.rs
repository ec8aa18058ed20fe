//! Partner API server binary

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use partner_api::config::Config;
use partner_api::state::{AppState, Orchestrator, Store};
use partner_api::{build_router, spawn_refresh_sweeper};
use partner_auth_core::FirebaseVerifier;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("partner_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Partner API");

    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        app_env = ?config.app_env,
        store = ?config.store_backend,
        bypass = config.auth.bypass.is_some(),
        "Configuration loaded"
    );

    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    let store = Store::connect(&config).await?;

    let verifier = FirebaseVerifier::new(config.auth.clone());
    let auth = Orchestrator::new(
        config.auth.clone(),
        Arc::new(verifier),
        Arc::new(store.user_repository()),
        Arc::new(store.refresh_token_repository()),
        tracing::info_span!("auth"),
    )?;

    let sweep_interval = config.refresh_sweep_interval;
    let http_port = config.http_port;
    let state = AppState::new(auth, store, config);

    let sweeper = spawn_refresh_sweeper(state.clone(), sweep_interval);
    let app = build_router(state, metrics_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    if let Err(e) = run_http_server(app, addr).await {
        tracing::error!(error = ?e, "HTTP server error");
    }

    sweeper.abort();
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!("auth_login_total", "Login attempts by outcome");
    metrics::describe_counter!("auth_refresh_total", "Refresh attempts by outcome");
    metrics::describe_counter!("auth_logout_total", "Logout attempts by outcome");

    Ok(handle)
}

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
            Ok(mut sig) => {
                sig.recv().await;
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
