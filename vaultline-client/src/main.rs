//! Vaultline dashboard daemon entry point.
//!
//! Runs the synchronization engine headless: the host application reads
//! dashboard state through the library; this binary exists to exercise the
//! loop end to end and to log vault-lock requests for the re-auth flow.

use chrono::Utc;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vaultline_client::api_client::{ConsentApi, RestClient};
use vaultline_client::config::ClientConfig;
use vaultline_client::engine::SyncEngine;
use vaultline_client::error::ClientError;
use vaultline_client::notifications::Notifier;
use vaultline_client::realtime::{spawn_stream_manager, StreamClient};
use vaultline_client::session;
use vaultline_client::signals::{Signal, SignalBus};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::load()?;
    let persisted = session::load(&config.session_path)?;
    let session_info = session::derive_session(persisted.as_ref(), Utc::now());
    let user_id = persisted
        .as_ref()
        .and_then(|p| p.user_id)
        .ok_or_else(|| ClientError::MissingUser(config.session_path.display().to_string()))?;

    let api: Arc<dyn ConsentApi> = Arc::new(RestClient::new(&config)?);
    let notifier = Arc::new(Notifier::new(64));
    let signals = SignalBus::new(32);
    let engine = SyncEngine::new(&config, api, session_info, user_id, notifier, signals.clone());

    let stream = StreamClient::new(&config)?;
    spawn_stream_manager(stream, engine.events_sender());

    let mut lock_rx = signals.subscribe();
    tokio::spawn(async move {
        while let Ok(signal) = lock_rx.recv().await {
            if let Signal::VaultLockRequested { reason } = signal {
                tracing::warn!(%reason, "vault lock requested; re-authentication required");
            }
        }
    });

    engine.start().await;

    tokio::select! {
        _ = engine.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}
