//! Shutdown of a client runtime.

use std::sync::atomic::Ordering;

use crate::lifecycle::ClientRuntime;

impl ClientRuntime {
    /// Release every Target. Later calls are no-ops.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(clients = self.registry().len(), "Shutting down client runtime");
        self.factory.shutdown();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for ClientRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
