use anyhow::Context;
use tracing::{info, warn};

use crate::app::app;
use crate::config::AppConfig;
use crate::middleware::AdminAccess;
use crate::state::AppState;

/// Build state from `config` and serve until Ctrl-C.
pub async fn serve(mut config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }

    info!("Starting Continuum Library in {:?} mode", config.environment);
    report_security_posture(&config);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::from_config(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Continuum Library listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Continuum Library stopped");
    Ok(())
}

fn report_security_posture(config: &AppConfig) {
    let security = &config.security;

    match AdminAccess::from_config(security) {
        AdminAccess::Secret(_) => info!("Admin endpoint protected by admin key"),
        AdminAccess::Open => warn!(
            "CONTINUUM_ADMIN_OPEN is set and no admin key is configured: anyone can mint tenant keys"
        ),
        AdminAccess::Disabled => info!("Admin endpoint disabled (no CONTINUUM_ADMIN_KEY configured)"),
    }

    if security.tenant_keys_file.is_none() {
        warn!("No CONTINUUM_TENANT_KEYS_FILE configured: issued tenant keys are lost on restart");
    }

    if security.global_api_key.is_none()
        && security.tenant_keys_json.is_none()
        && security.tenant_keys_file.is_none()
    {
        warn!("No API keys configured: the library API is open to every tenant");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
