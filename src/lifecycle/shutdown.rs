//! Shutdown coordination for the gateway.

use tokio::sync::broadcast;

/// Hand-off point between the signal source and the serve loop.
///
/// The gateway runs exactly one long-lived task, so construction yields
/// the server's receiver directly alongside the trigger handle.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create the coordinator together with the server's receiver.
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (tx, rx) = broadcast::channel(1);
        (Self { tx }, rx)
    }

    /// Signal the server to stop accepting connections and drain.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Trigger on Ctrl+C. Consumes the handle; call after giving the
    /// receiver to the server.
    pub fn trigger_on_ctrl_c(self) {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl+C received, shutting down");
                self.trigger();
            }
        });
    }
}
