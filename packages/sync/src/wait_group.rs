//! A counting barrier for groups of tasks.
//!
//! Waiting completes whenever the counter drops to zero, and can give up early through a
//! [`Context`].

use std::sync::Mutex;

use concord_context::Context;

use crate::{Listener, Signal};

/// A counting barrier that can be waited on with cancellation.
///
/// The group completes every time its counter drops to zero. It can be re-armed by adding
/// to the counter again, after which waiters block until the next transition to zero.
#[derive(Debug, Default)]
pub struct WaitGroup {
    counter: Mutex<usize>,
    completed: Signal,
}

impl WaitGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjusts the counter by `n`, completing the group when it reaches zero.
    ///
    /// # Panics
    ///
    /// * If the counter would become negative or overflow. The counter is left unchanged.
    /// * If the internal mutex is poisoned
    pub fn add(&self, n: isize) {
        let mut counter = self.counter.lock().unwrap();

        let Some(updated) = counter.checked_add_signed(n) else {
            drop(counter);
            assert!(n >= 0, "WaitGroup: negative counter");
            panic!("WaitGroup: counter overflow");
        };
        *counter = updated;

        if updated == 0 && n != 0 {
            self.completed.broadcast();
        }
    }

    /// Decrements the counter by one.
    ///
    /// # Panics
    ///
    /// * If the counter is already zero
    pub fn done(&self) {
        self.add(-1);
    }

    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    #[must_use]
    pub fn count(&self) -> usize {
        *self.counter.lock().unwrap()
    }

    /// Returns a handle that resolves once the counter reaches zero. The handle is already
    /// resolved if the counter is zero right now.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    pub fn listen(&self) -> Listener {
        let counter = self.counter.lock().unwrap();
        if *counter == 0 {
            Listener::ready()
        } else {
            // Subscribed under the counter lock so the next transition to zero is not missed.
            self.completed.listen()
        }
    }

    /// Waits until the counter is zero.
    pub async fn wait(&self) {
        self.listen().notified().await;
    }

    /// Waits until the counter is zero or `ctx` is done. Returns whether the group
    /// completed.
    pub async fn wait_with_cancellation(&self, ctx: &Context) -> bool {
        self.listen().notified_with_cancellation(ctx).await
    }
}
