//! Graceful-stop signal passed from `main` to the HTTP server

use tokio::sync::watch;

/// Held by the server; resolves once a stop has been requested
#[derive(Clone)]
pub struct ShutdownToken(watch::Receiver<bool>);

/// Held by `main`; flips the token when Ctrl+C arrives
pub struct ShutdownSender(watch::Sender<bool>);

impl ShutdownSender {
    pub fn shutdown(&self) {
        // No receivers left means the server is already gone
        let _ = self.0.send(true);
    }
}

impl ShutdownToken {
    /// Resolve when stop is requested or the sender is dropped
    pub async fn wait(mut self) {
        let _ = self.0.wait_for(|stopped| *stopped).await;
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender(tx), ShutdownToken(rx))
}
