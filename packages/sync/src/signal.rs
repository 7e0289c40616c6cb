//! Reusable broadcast signal.
//!
//! The signal owns one rendezvous channel at a time. Waiters subscribe to the current
//! channel; a broadcast swaps in a fresh channel and drops the sender of the old one, which
//! wakes everybody subscribed to it. Tasks that subscribe after the swap wait on the new
//! channel and are unaffected by that broadcast.

use std::sync::Mutex;

use concord_context::Context;

#[derive(Debug)]
struct Emitter {
    tx: flume::Sender<()>,
    rx: flume::Receiver<()>,
}

impl Emitter {
    fn new() -> Self {
        let (tx, rx) = flume::bounded(0);
        Self { tx, rx }
    }
}

/// A wait handle obtained from [`Signal::listen`].
///
/// The handle is bound to the signal cycle it was obtained in: it resolves on the next
/// broadcast or targeted signal of that cycle, even if it is only awaited later.
#[derive(Debug)]
#[must_use = "a listener does nothing unless awaited"]
pub struct Listener {
    rx: Option<flume::Receiver<()>>,
}

impl Listener {
    /// A listener that resolves immediately.
    pub const fn ready() -> Self {
        Self { rx: None }
    }

    /// Resolves once the signal cycle this listener belongs to is notified.
    pub async fn notified(self) {
        if let Some(rx) = self.rx {
            // Either a targeted message or the disconnect caused by a broadcast.
            let _ = rx.recv_async().await;
        }
    }

    /// Waits for the notification or until `ctx` is done. Returns whether the listener was
    /// notified. A notification that is already available wins over a done context.
    pub async fn notified_with_cancellation(self, ctx: &Context) -> bool {
        tokio::select! {
            biased;
            () = self.notified() => true,
            () = ctx.done() => false,
        }
    }
}

/// A lightweight reusable signal that tasks can wait on.
///
/// Waiting tasks are woken by the next [`Signal::broadcast`] (all of them) or
/// [`Signal::signal`] (one of them). Tasks that start waiting after a broadcast are not
/// woken by it, so the same signal can notify repeatedly.
#[derive(Debug)]
pub struct Signal {
    emitter: Mutex<Emitter>,
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            emitter: Mutex::new(Emitter::new()),
        }
    }

    /// Wakes up all currently waiting tasks.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    pub fn broadcast(&self) {
        let old = std::mem::replace(&mut *self.emitter.lock().unwrap(), Emitter::new());
        drop(old);
    }

    /// Wakes up a single waiting task, if any is waiting. Otherwise the notification is
    /// dropped.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    pub fn signal(&self) {
        let _ = self.emitter.lock().unwrap().tx.try_send(());
    }

    /// Subscribes to the current signal cycle.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    pub fn listen(&self) -> Listener {
        Listener {
            rx: Some(self.emitter.lock().unwrap().rx.clone()),
        }
    }

    /// Waits until the task is woken up by the signal.
    pub async fn wait(&self) {
        self.listen().notified().await;
    }

    /// Waits until the task is woken up by the signal or `ctx` is done. Returns whether the
    /// task was woken up by the signal.
    pub async fn wait_with_cancellation(&self, ctx: &Context) -> bool {
        self.listen().notified_with_cancellation(ctx).await
    }
}
