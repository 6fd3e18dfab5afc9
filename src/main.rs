use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use club_mail_relay::api;
use club_mail_relay::config::{Config, LogFormat};
use club_mail_relay::mail::{Mailer, ProviderHealth, ProviderMonitor};
use club_mail_relay::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }

    tracing::info!("Starting mail relay...");
    tracing::info!(
        host = %config.server_host,
        port = %config.server_port,
        adapter = ?config.mail_adapter,
        from = %config.mail_from,
        "Configuration loaded"
    );

    // Create mailer and provider monitor
    let mailer = Mailer::from_config(&config)?;
    let provider_health = ProviderHealth::new();
    let state = AppState::new(config.clone(), mailer.clone(), provider_health.clone());

    let mut monitor =
        ProviderMonitor::new(mailer, provider_health, config.health_check.clone());
    if let Some(recipient) = config.self_test_recipient.clone() {
        monitor = monitor.with_self_test(recipient, Arc::clone(&state.renderer));
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let monitor_handle = tokio::spawn(monitor.run(shutdown_rx));

    // Build router
    let app = api::create_app(state);

    // Start server
    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Email endpoint: POST http://{}/api/send-email", addr);
    tracing::info!("Health check: GET http://{}/api/health", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(());
    if let Err(e) = monitor_handle.await {
        tracing::warn!(error = %e, "SMTP monitor task ended abnormally");
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Cannot listen for Ctrl+C");
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
                tracing::error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let source = tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };
    tracing::info!(signal = source, "Shutting down");
}
