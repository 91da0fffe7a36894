//! EduVerse - coaching-institute dashboard
//!
//! Shows backend health and institutions, creates institutions and seeds
//! demo data through the EduVerse backend API.

pub mod backend;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod io;
pub mod model;
pub mod state;

pub use config::{load_config, Config};
pub use error::{EduverseError, Result};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendApi, HttpBackend};
use crate::controller::DashboardController;
use crate::io::{HttpClient, ReqwestHttpClient};

/// Wire the reqwest transport, HTTP backend and shared state into a controller
pub fn build_controller(
    config: &Config,
    cancel: &CancellationToken,
) -> Result<Arc<DashboardController>> {
    let timeout = config
        .backend
        .request_timeout_seconds
        .map(Duration::from_secs);
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(timeout)?);
    let backend: Arc<dyn BackendApi> = Arc::new(HttpBackend::new(&config.backend, http));
    let state = state::new_state_handle();

    Ok(Arc::new(DashboardController::new(backend, state, cancel)))
}

/// Serve the dashboard on `listener` until `cancel` fires
pub async fn serve(
    listener: TcpListener,
    controller: Arc<DashboardController>,
    cancel: CancellationToken,
) -> Result<()> {
    let router = dashboard::build_router(Arc::clone(&controller));

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await
        .map_err(|e| EduverseError::Dashboard(format!("Dashboard server failed: {}", e)))?;

    controller.shutdown();
    tracing::debug!("Dashboard stopped");
    Ok(())
}

/// Run the dashboard service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();
    let controller = build_controller(&config, &cancel)?;

    if !config.dashboard.enabled {
        tracing::info!("Dashboard disabled; running startup fetches only");
        let report = controller.initialize().await;
        log_startup(&controller, &report).await;
        controller.shutdown();
        return Ok(());
    }

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    let startup = Arc::clone(&controller);
    tokio::spawn(async move {
        let report = startup.initialize().await;
        log_startup(&startup, &report).await;
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.dashboard.port));
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        EduverseError::Dashboard(format!(
            "Failed to bind dashboard to port {}: {}",
            config.dashboard.port, e
        ))
    })?;
    tracing::info!("Dashboard listening on http://{}", addr);

    serve(listener, controller, cancel).await?;
    tracing::info!("EduVerse dashboard stopped");
    Ok(())
}

async fn log_startup(controller: &DashboardController, report: &controller::StartupReport) {
    let state = controller.state().read().await;
    if let Some(health) = &state.health {
        tracing::info!(
            "Backend: {}, database: {}, {} collections",
            health.backend,
            health.database,
            health.collections.len()
        );
    }
    if report.institutions.is_ok() {
        tracing::info!("{} institutions loaded", state.institutions.len());
    }
}
