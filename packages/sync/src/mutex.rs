//! A mutex that supports try-locking and cancellable locking.
//!
//! Ownership is modelled by a token in a single-slot queue: locking deposits the token,
//! unlocking takes it back out. The mutex protects no data of its own; pair it with the
//! state it guards, or use [`Mutex::acquire`] for a guard that unlocks on drop.

use concord_context::Context;

use crate::Signal;

#[derive(Debug)]
pub struct Mutex {
    tx: flume::Sender<()>,
    rx: flume::Receiver<()>,
    released: Signal,
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutex {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::bounded(1);
        Self {
            tx,
            rx,
            released: Signal::new(),
        }
    }

    /// Waits until the mutex is locked by the calling task.
    ///
    /// # Cancel safety
    ///
    /// This method is not cancel safe: dropping the future after the token was queued leaves
    /// the mutex locked. Use [`Mutex::try_lock_with_cancellation`] to give up waiting.
    pub async fn lock(&self) {
        // Both channel halves live as long as `self`, so sending cannot fail.
        let _ = self.tx.send_async(()).await;
    }

    /// Blocks the current thread until the mutex is locked.
    ///
    /// Only meant for short critical sections entered from synchronous code, where the
    /// holder never yields while holding the lock.
    pub fn lock_blocking(&self) {
        let _ = self.tx.send(());
    }

    /// Tries to lock the mutex without waiting. Returns whether the mutex was acquired.
    #[must_use]
    pub fn try_lock(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }

    /// Tries to lock the mutex until `ctx` is done. Passing `None` behaves like
    /// [`Mutex::try_lock`]. Returns whether the mutex was acquired.
    ///
    /// A context that is already done never acquires the mutex, even if it is free.
    pub async fn try_lock_with_cancellation(&self, ctx: Option<&Context>) -> bool {
        let Some(ctx) = ctx else {
            return self.try_lock();
        };

        loop {
            if ctx.is_done() {
                return false;
            }
            let released = self.released.listen();
            if self.try_lock() {
                return true;
            }
            if !released.notified_with_cancellation(ctx).await {
                return false;
            }
        }
    }

    /// Unlocks the mutex.
    ///
    /// # Panics
    ///
    /// * If the mutex is not locked
    pub fn unlock(&self) {
        assert!(self.rx.try_recv().is_ok(), "tried to unlock unlocked mutex");
        self.released.broadcast();
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Locks the mutex and returns a guard that unlocks it when dropped.
    pub async fn acquire(&self) -> MutexGuard<'_> {
        self.lock().await;
        MutexGuard { mutex: self }
    }

    /// Blocking variant of [`Mutex::acquire`]. See [`Mutex::lock_blocking`].
    pub fn acquire_blocking(&self) -> MutexGuard<'_> {
        self.lock_blocking();
        MutexGuard { mutex: self }
    }
}

/// Unlocks the [`Mutex`] it was acquired from when dropped, including during unwinding.
#[derive(Debug)]
#[must_use = "dropping the guard unlocks the mutex immediately"]
pub struct MutexGuard<'a> {
    mutex: &'a Mutex,
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}
