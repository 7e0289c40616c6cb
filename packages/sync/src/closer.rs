//! One-shot close with ordered hooks.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use concord_context::{CancellationToken, Context};

type Hook = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("already closed")]
pub struct AlreadyClosedError;

#[derive(Default)]
struct Hooks {
    queue: VecDeque<Hook>,
    // Set while `close` drains the queue.
    running: bool,
}

/// A flag that can be closed exactly once, running the registered hooks when it is.
///
/// Hooks run in registration order, after the closed state is observable through
/// [`Closer::is_closed`] and [`Closer::closed`]. Hooks run without any internal lock held,
/// so a hook may register further hooks on the closer that runs it.
#[derive(Default)]
pub struct Closer {
    token: CancellationToken,
    hooks: Mutex<Hooks>,
}

impl std::fmt::Debug for Closer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Closer")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Closer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking hook must not wedge later registrations, so poisoning is ignored.
    fn hooks(&self) -> MutexGuard<'_, Hooks> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Closes the closer and runs the registered hooks.
    ///
    /// # Errors
    ///
    /// * [`AlreadyClosedError`] if the closer was already closed
    pub fn close(&self) -> Result<(), AlreadyClosedError> {
        {
            let mut hooks = self.hooks();
            if self.token.is_cancelled() {
                return Err(AlreadyClosedError);
            }
            hooks.running = true;
            self.token.cancel();
        }

        self.drain();

        Ok(())
    }

    fn drain(&self) {
        // Clears `running` even if a hook panics, so later registrations run in-line.
        struct Stop<'a>(&'a Closer);

        impl Drop for Stop<'_> {
            fn drop(&mut self) {
                self.0.hooks().running = false;
            }
        }

        let _stop = Stop(self);
        while let Some(hook) = self.next_hook() {
            hook();
        }
    }

    fn next_hook(&self) -> Option<Hook> {
        self.hooks().queue.pop_front()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the closer is closed.
    pub async fn closed(&self) {
        self.token.cancelled().await;
    }

    /// A context that is cancelled when the closer is closed.
    #[must_use]
    pub fn ctx(&self) -> Context {
        Context::from_token(self.token.clone())
    }

    /// Registers `hook` to run on close. Returns `false`, dropping the hook, if the closer
    /// is already closed.
    pub fn on_close(&self, hook: impl FnOnce() + Send + 'static) -> bool {
        let mut hooks = self.hooks();
        if self.token.is_cancelled() {
            return false;
        }
        hooks.queue.push_back(Box::new(hook));
        true
    }

    /// Registers `hook` to run on close, or runs it right away if the closer is already
    /// closed. An immediate run happens after every hook registered earlier has run.
    ///
    /// While a close is still running hooks, `hook` is queued behind them and runs on the
    /// closing thread before [`Closer::close`] returns.
    pub fn on_close_always(&self, hook: impl FnOnce() + Send + 'static) {
        let mut hooks = self.hooks();
        if !self.token.is_cancelled() || hooks.running {
            hooks.queue.push_back(Box::new(hook));
            return;
        }
        drop(hooks);
        hook();
    }
}
