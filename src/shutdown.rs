//! Cooperative cancellation for one invocation.
//!
//! The first interrupt cancels the handler's token; the second forces the
//! process down unless the terminate hook vetoes it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::console::Console;

/// Hook returning `false` to suppress the default action.
pub type InterruptHook = Arc<dyn Fn() -> bool + Send + Sync>;

/// What an interrupt resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Cancellation requested.
    Cancel,
    /// The cancel hook kept the token alive.
    CancelSuppressed,
    /// The process should exit now.
    Terminate,
    /// The terminate hook kept the process alive.
    TerminateVetoed,
}

/// Owns the cancellation token and interrupt counter for one run.
pub struct CancelCoordinator {
    token: CancellationToken,
    interrupts: AtomicUsize,
    on_cancel: Option<InterruptHook>,
    on_terminate: Option<InterruptHook>,
    console: Console,
}

impl CancelCoordinator {
    /// The token is a child of `external` when one is given.
    pub fn new(external: Option<&CancellationToken>, console: Console) -> Self {
        Self {
            token: external.map_or_else(CancellationToken::new, |t| t.child_token()),
            interrupts: AtomicUsize::new(0),
            on_cancel: None,
            on_terminate: None,
            console,
        }
    }

    pub fn with_hooks(mut self, on_cancel: Option<InterruptHook>, on_terminate: Option<InterruptHook>) -> Self {
        self.on_cancel = on_cancel;
        self.on_terminate = on_terminate;
        self
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn interrupt_count(&self) -> usize {
        self.interrupts.load(Ordering::SeqCst)
    }

    /// Record one interrupt and apply its effect on the token.
    pub fn handle_interrupt(&self) -> InterruptAction {
        let count = self.interrupts.fetch_add(1, Ordering::SeqCst) + 1;

        if count > 1 {
            if self.on_terminate.as_ref().is_some_and(|hook| !hook()) {
                tracing::info!(count, "termination vetoed by hook");
                return InterruptAction::TerminateVetoed;
            }
            self.console.error("Terminating...");
            tracing::info!(count, "terminating on repeated interrupt");
            return InterruptAction::Terminate;
        }

        if self.on_cancel.as_ref().is_some_and(|hook| !hook()) {
            tracing::info!("cancellation suppressed by hook");
            return InterruptAction::CancelSuppressed;
        }
        self.console.error("Canceling...");
        tracing::info!("cancellation requested");
        self.token.cancel();
        InterruptAction::Cancel
    }

    /// Subscribe to Ctrl+C for the lifetime of the returned task.
    ///
    /// Must be called from within a tokio runtime. Abort the handle once the
    /// handler finishes so the subscription does not outlive the invocation.
    /// Aborting stops the listener only: tokio keeps its SIGINT handler
    /// registered for the life of the process.
    pub fn listen(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("Ctrl+C listener unavailable: {}", e);
                    return;
                }
                if coordinator.handle_interrupt() == InterruptAction::Terminate {
                    std::process::exit(1);
                }
            }
        })
    }
}
