// Shutdown Token (SIGINT/SIGTERM → fixture loop)

use std::time::Duration;
use tokio::sync::watch;

/// Shutdown signal for graceful termination
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for shutdown signal
    pub async fn wait(&mut self) {
        while !self.is_shutdown() {
            if self.rx.changed().await.is_err() {
                // Sender gone: nobody can request shutdown anymore
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleep for `period` unless shutdown arrives first
    ///
    /// Returns true if shutdown was requested.
    pub async fn sleep_or_shutdown(&mut self, period: Duration) -> bool {
        tokio::select! {
            _ = self.wait() => true,
            _ = tokio::time::sleep(period) => self.is_shutdown(),
        }
    }
}

/// Shutdown sender
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal shutdown to all holders of a token
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
