//! Ctrl+C handling
//!
//! The first SIGINT cancels the call context of the running command, which
//! stops the batch in flight and reports its partial result. A second SIGINT
//! exits immediately.

use futures::stream::StreamExt;
use imcache_core::CallContext;
use signal_hook::consts::SIGINT;
use signal_hook_tokio::Signals;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tracing::debug;

/// Exit status used when the user aborts with a second Ctrl+C
const ABORT_EXIT_CODE: i32 = 130;

/// Signal handler cancelling a [`CallContext`] on Ctrl+C
pub struct SignalHandler {
    /// Flag to track if signal handling is active
    is_active: Arc<AtomicBool>,
    /// Handle to the signal handling task
    task_handle: Option<JoinHandle<()>>,
}

impl SignalHandler {
    /// Create a new signal handler
    pub fn new() -> Self {
        Self {
            is_active: Arc::new(AtomicBool::new(false)),
            task_handle: None,
        }
    }

    /// Start listening; SIGINT cancels `ctx`
    pub fn start(&mut self, ctx: CallContext) -> std::io::Result<()> {
        if self.is_active.load(Ordering::Relaxed) {
            return Ok(());
        }

        let mut signals = Signals::new([SIGINT])?;
        let is_active = Arc::clone(&self.is_active);
        is_active.store(true, Ordering::Relaxed);

        let handle = tokio::spawn(async move {
            while let Some(signal) = signals.next().await {
                if signal != SIGINT || !is_active.load(Ordering::Relaxed) {
                    continue;
                }
                if ctx.is_cancelled() {
                    eprintln!("\nAborted.");
                    std::process::exit(ABORT_EXIT_CODE);
                }
                debug!("SIGINT received, cancelling in-flight batch");
                eprintln!("\n🛑 Interrupting current batch... (Ctrl+C again to abort)");
                ctx.cancel();
            }
        });

        self.task_handle = Some(handle);
        Ok(())
    }

    /// Stop signal handling
    pub fn stop(&mut self) {
        self.is_active.store(false, Ordering::Relaxed);
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        self.stop();
    }
}
