use std::sync::Arc;

use learnbible_backend::config::Config;
use learnbible_backend::logging::{init_tracing, LogSettings};
use learnbible_backend::seed::seed_from_path;
use learnbible_backend::state::AppState;
use learnbible_backend::store::SqliteStore;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&LogSettings::from_env(&config.log_level));

    let store = match SqliteStore::connect(&config.database_url).await {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!(error = %err, url = %config.database_url, "failed to open database");
            std::process::exit(1);
        }
    };
    if let Err(err) = store.migrate().await {
        tracing::error!(error = %err, "failed to prepare schema");
        std::process::exit(1);
    }

    if let Some(path) = &config.seed_path {
        match seed_from_path(store.as_ref(), path).await {
            Ok(_) => tracing::info!(path = %path.display(), "seed applied"),
            Err(err) => {
                tracing::error!(error = %err, path = %path.display(), "seed rejected");
                std::process::exit(1);
            }
        }
    }

    let addr = config.bind_addr();
    let app = learnbible_backend::create_app(AppState::with_store(store, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");
    tracing::info!(%addr, "learnbible backend listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
