use std::sync::Arc;

use clap::Parser;
use todo_core::storage::open_storage;
use todo_core::store::TaskStore;
use todo_server::args::ServerArgs;
use todo_server::server::{serve, shutdown_signal};

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();

    let (config, config_warning) = match args.resolve_config() {
        Ok(resolved) => resolved,
        Err(err) => {
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level("info")));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Some(err) = config_warning {
        tracing::warn!(error = %err, "ignoring config file, using defaults");
    }

    let storage = match open_storage(config.storage(), config.store_path.as_deref()) {
        Ok(storage) => storage,
        Err(err) => {
            tracing::error!(error = %err, "failed to open storage");
            std::process::exit(1);
        }
    };
    let store = Arc::new(TaskStore::new(storage));

    if config.seed_demo() {
        match store.seed_demo() {
            Ok(0) => tracing::debug!("store not empty, skipping demo todos"),
            Ok(count) => tracing::info!(count, "seeded demo todos"),
            Err(err) => tracing::warn!(error = %err, "failed to seed demo todos"),
        }
    }

    let listener = match tokio::net::TcpListener::bind(config.bind_addr()).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(addr = %config.bind_addr(), error = %err, "failed to bind");
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(addr) => tracing::info!(%addr, storage = %store.describe(), "todo server listening"),
        Err(err) => tracing::warn!(error = %err, "bound address unavailable"),
    }

    if let Err(err) = serve(listener, store, shutdown_signal()).await {
        tracing::error!(error = %err, "todo server failed");
        std::process::exit(1);
    }
}
