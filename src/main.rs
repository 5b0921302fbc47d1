use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};

use invtrack_service::{build_router, config::Config, db::PgInventoryStore, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,invtrack_service=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!(
        store = ?config.store,
        region = %config.region,
        static_dir = %config.static_dir.display(),
        "InvTrackPro inventory service starting"
    );

    // One connection per request, no pool; check reachability once so a bad
    // endpoint shows up in the startup log rather than on the first request.
    let store = PgInventoryStore::new(&config.store);
    match store.acquire().await {
        Ok(conn) => {
            conn.release().await;
            info!("Inventory store reachable.");
        }
        Err(e) => warn!(error = %e, "Inventory store not reachable at startup; continuing"),
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        store: Arc::new(store),
        config: Arc::new(config),
    };

    let app = build_router(state);

    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
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
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("ctrl_c signal received"),
        _ = terminate => info!("terminate signal received"),
    }
}
