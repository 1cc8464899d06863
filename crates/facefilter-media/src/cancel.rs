//! Cooperative cancellation.
//!
//! One controller owns the flag; any number of tokens observe it. The flag
//! only ever goes from `false` to `true`, and nothing is interrupted when it
//! flips: the loop checks it between frames and the supervisor reacts by
//! terminating its child.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Read side of the cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation has been requested. Never resolves if the
    /// controller is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Write side of the cancellation flag plus the OS signal listener.
#[derive(Debug, Clone)]
pub struct CancellationController {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancellationController {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Request cancellation. Returns `true` only for the call that flipped
    /// the flag; later calls are no-ops.
    pub fn cancel(&self) -> bool {
        self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Listen for SIGINT/SIGTERM once and cancel on the first one.
    ///
    /// The handlers stay installed after the first signal, so repeated
    /// signals are absorbed instead of killing the process mid-teardown.
    pub fn spawn_signal_listener(&self) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            match wait_for_signal().await {
                Ok(name) => {
                    info!(signal = name, "Received signal, shutting down...");
                    controller.cancel();
                }
                Err(e) => warn!("Failed to listen for shutdown signals: {}", e),
            }
        })
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = interrupt.recv() => Ok("SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
