//! Signal handling and the save-before-shutdown sequence.
//!
//! A single [`CancellationToken`] links the signal task to the serve loop: the
//! task waits for SIGINT/SIGTERM, flushes the dictionary to disk, then cancels
//! the token, which starts the listener's bounded drain.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::dictionary::Dictionary;

/// Resolve once the process receives Ctrl+C or SIGTERM.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        }
    }
}

/// Write the dictionary to `path`, logging instead of failing.
pub async fn persist(dictionary: Arc<Dictionary>, path: PathBuf) {
    let target = path.clone();
    match tokio::task::spawn_blocking(move || dictionary.save_to_file(&target)).await {
        Ok(Ok(count)) => info!(count, path = %path.display(), "dictionary saved"),
        Ok(Err(e)) => error!("Failed to save dictionary: {}", e),
        Err(e) => error!("Dictionary save task failed: {}", e),
    }
}

/// Wait for `trigger`, save the dictionary, then cancel `shutdown`.
///
/// If `shutdown` is cancelled by someone else first, nothing is saved.
pub async fn save_then_cancel<F>(
    trigger: F,
    dictionary: Arc<Dictionary>,
    path: PathBuf,
    shutdown: CancellationToken,
) where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = trigger => {}
        _ = shutdown.cancelled() => return,
    }

    info!("Stopping server...");
    persist(dictionary, path).await;
    shutdown.cancel();
}
