use tokio::net::TcpListener;

use comicgrep::config::Config;
use comicgrep::startup::{build_app, init_logging, resolve_config_path};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env
    let _ = dotenvy::dotenv();

    // Load config first (needed for logging setup)
    let config_path = resolve_config_path();
    let config = Config::load(config_path.as_deref())?;

    init_logging(&config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let (app, shutdown_tx) = build_app(config).await?;

    tracing::info!(addr = %addr, "listening");
    let listener = TcpListener::bind(&addr).await?;

    let shutdown_signal = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();
        tokio::select! {
            _ = ctrl_c => tracing::info!("received SIGINT"),
            _ = terminate => tracing::info!("received SIGTERM"),
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    tracing::info!("server stopped, shutting down background tasks");
    let _ = shutdown_tx.send(true);
    tracing::info!("comicgrep shutdown complete");

    Ok(())
}
