//! Watcher module: the long-running poll loop
//!
//! This module wires the crawler, the link store and the notifiers together
//! from a resolved [`Config`] and runs them until the process is asked to stop.

mod poll;

pub use poll::{CycleError, CycleReport, Watcher};

use crate::config::Config;
use crate::crawler::crawler_from_config;
use crate::notify::build_notifiers;
use crate::storage::open_store;
use crate::NeagentError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Builds a watcher from the resolved configuration
pub fn watcher_from_config(config: &Config) -> Result<Watcher, NeagentError> {
    let crawler = crawler_from_config(config)?;
    let store = Arc::new(open_store(&config.storage));
    let notifiers = build_notifiers(&config.notify, config.watch.unattended)?;

    tracing::info!("Link store: {}", store.path().display());

    Ok(Watcher::new(
        config.watch.link.clone(),
        Duration::from_secs(config.watch.timeout),
        crawler,
        store,
        notifiers,
    )
    .with_notify_empty(config.notify.notify_empty))
}

/// Runs the watcher described by `config` until the process receives a stop
/// signal (Ctrl-C, or SIGTERM on unix)
///
/// # Returns
///
/// * `Ok(())` - Stopped on request
/// * `Err(NeagentError)` - Startup failed (client, selectors, or the store schema)
///
/// # Example
///
/// ```no_run
/// use neagent_watch::config::load_config;
/// use neagent_watch::run_forever;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("neagent.toml"))?;
/// run_forever(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_forever(config: Config) -> Result<(), NeagentError> {
    let watcher = watcher_from_config(&config)?;
    let shutdown = CancellationToken::new();

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("Stop signal received");
        signal_token.cancel();
    });

    watcher.run(shutdown).await?;
    Ok(())
}

/// Resolves when the operator asks the process to stop
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
