//! Broadcast-once shutdown signal.
//!
//! Built on a `watch` channel holding a flag, so receivers subscribing after shutdown was
//! issued still observe it and any number of workers can wait on it concurrently.

use std::sync::Arc;

use tokio::sync::watch;

use crate::bail;
use crate::error::{ErrorKind, PulseResult};

/// Sending side of the shutdown signal, owned by the pipeline driver.
#[derive(Debug, Clone)]
pub struct ShutdownTx(Arc<watch::Sender<bool>>);

impl ShutdownTx {
    /// Issues shutdown to every current and future subscriber.
    ///
    /// Shutdown can be issued exactly once, a second call fails with
    /// [`ErrorKind::InvalidState`] and has no effect.
    pub fn shutdown(&self) -> PulseResult<()> {
        let mut already_issued = false;
        self.0.send_modify(|issued| {
            already_issued = *issued;
            *issued = true;
        });

        if already_issued {
            bail!(ErrorKind::InvalidState, "Shutdown was already issued");
        }

        Ok(())
    }

    /// Returns whether shutdown has been issued.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Creates a new receiver of the signal.
    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx(self.0.subscribe())
    }
}

/// Receiving side of the shutdown signal, one per worker.
#[derive(Debug, Clone)]
pub struct ShutdownRx(watch::Receiver<bool>);

impl ShutdownRx {
    /// Returns whether shutdown has been issued.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown is issued, immediately if it already was.
    ///
    /// A dropped [`ShutdownTx`] counts as shutdown since nobody is left to issue it.
    pub async fn wait_for_shutdown(&mut self) {
        let _ = self.0.wait_for(|issued| *issued).await;
    }
}

/// Creates the shutdown channel.
///
/// Receivers are obtained with [`ShutdownTx::subscribe`], the initial receiver is returned for
/// convenience.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTx(Arc::new(tx)), ShutdownRx(rx))
}
