//! Thin reference binary: wires [`Coordinator`] to axum. Illustrative,
//! not a production gateway — auth, transport framing, and persistence
//! backend selection all live in this file so the core crate stays free
//! of them.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use xchange_core::auth::AuthConfig;
use xchange_core::config::Config;
use xchange_core::coordinator::Coordinator;
use xchange_core::persistence::{FileWriter, PersistenceSink, StdoutWriter};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = Config::from_env();
    let auth = AuthConfig::from_env();

    let persistence = match &config.persistence_path {
        Some(path) => match FileWriter::create(path) {
            Ok(writer) => PersistenceSink::spawn(writer),
            Err(e) => {
                log::error!("failed to open persistence file {path}: {e}, falling back to stdout");
                PersistenceSink::spawn(StdoutWriter)
            }
        },
        None => PersistenceSink::spawn(StdoutWriter),
    };

    let coordinator = Arc::new(Coordinator::with_config(persistence, &config));
    for (symbol, instrument) in &config.symbols {
        coordinator.register_symbol(symbol.clone(), *instrument);
    }

    let app = xchange_core::api::create_router(coordinator, auth);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("bind");
    log::info!("listening on http://{}", config.bind_addr);

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutdown signal received, draining in-flight requests");
            shutdown_signal.cancel();
        })
        .await
        .expect("serve");
}
