//! Callable HTTP server for ideaspot
//!
//! Exposes `expandIdea` to remote clients using the callable envelope
//! (`{"data": ...}` in, `{"result": ...}` or `{"error": ...}` out).

pub mod callable;
pub mod error;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Settings;
use crate::expansion::Expander;

pub use callable::{build_router, CallableState};
pub use error::{error_mapper, CallableError, CallableStatus};

/// Run the callable server until Ctrl-C or SIGTERM.
pub async fn serve(settings: &Settings, bind: Option<&str>) -> Result<()> {
    let expander = Arc::new(Expander::from_settings(settings)?);
    let state = CallableState::new(expander, &settings.server)?;
    let router = build_router(state);

    let bind = bind.unwrap_or(settings.server.bind.as_str());
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    info!(
        addr = %listener.local_addr()?,
        version = crate::VERSION,
        max_instances = settings.server.max_instances,
        require_auth = settings.server.require_auth,
        "Callable server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Callable server failed")?;

    info!("Callable server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
