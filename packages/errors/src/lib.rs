//! Error gathering for groups of concurrent tasks.
//!
//! A [`Gatherer`] keeps every error its tasks return instead of stopping at the first one.
//! It signals the first failure right away, so callers can react without waiting for the
//! remaining tasks, and reports all errors at the end as an [`AccumulatedError`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::{
    error::Error,
    fmt,
    future::Future,
    sync::{Arc, Mutex},
};

use concord_context::Context;
use concord_sync::{Closer, WaitGroup};
use tokio::task::JoinHandle;

pub use concord_sync::SharedError;

/// A composite of one or more errors, in the order they were gathered.
#[derive(Debug, Clone)]
pub struct AccumulatedError {
    errors: Vec<SharedError>,
}

impl AccumulatedError {
    /// The contributing errors, in the order they were gathered.
    #[must_use]
    pub fn causes(&self) -> &[SharedError] {
        &self.errors
    }
}

impl fmt::Display for AccumulatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            1 => write!(f, "(1 error)")?,
            n => write!(f, "({n} errors)")?,
        }
        for (i, err) in self.errors.iter().enumerate() {
            write!(f, "\n{}): {err}", i + 1)?;
        }
        Ok(())
    }
}

impl Error for AccumulatedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.errors.first().map(|err| &**err as &(dyn Error + 'static))
    }
}

/// Splits `err` into the errors it was accumulated from. An error that is not an
/// [`AccumulatedError`] yields itself.
#[must_use]
pub fn causes(err: &SharedError) -> Vec<SharedError> {
    err.downcast_ref::<AccumulatedError>().map_or_else(
        || vec![err.clone()],
        |accumulated| accumulated.errors.clone(),
    )
}

#[derive(Default)]
struct Inner {
    errors: Mutex<Vec<SharedError>>,
    running: WaitGroup,
    failed: Closer,
}

/// Decrements the running count when the task ends, whether it returns, panics, or is
/// dropped.
struct Running(Arc<Inner>);

impl Drop for Running {
    fn drop(&mut self) {
        self.0.running.done();
    }
}

/// Runs tasks concurrently and collects their errors.
///
/// Cloning a `Gatherer` yields a handle to the same gatherer.
#[derive(Clone, Default)]
pub struct Gatherer {
    inner: Arc<Inner>,
}

impl fmt::Debug for Gatherer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gatherer")
            .field("running", &self.inner.running.count())
            .field("failed", &self.inner.failed.is_closed())
            .finish_non_exhaustive()
    }
}

impl Gatherer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gathers the error of `result`, if any.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    pub fn add<E>(&self, result: Result<(), E>)
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        if let Err(err) = result {
            self.add_shared(Arc::from(err.into()));
        }
    }

    /// Gathers `err` as is, so that [`causes`] returns this very error.
    ///
    /// The first gathered error marks the gatherer as failed and runs the
    /// [`Gatherer::on_fail`] hooks before returning.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    pub fn add_shared(&self, err: SharedError) {
        self.inner.errors.lock().unwrap().push(err);
        // Only the first close runs the hooks.
        let _ = self.inner.failed.close();
    }

    /// Runs `future` as a new task and gathers the error it returns.
    ///
    /// # Panics
    ///
    /// * If called outside of a tokio runtime
    pub fn go<F, E>(&self, future: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        self.inner.running.add(1);
        let running = Running(self.inner.clone());
        let gatherer = self.clone();

        tokio::spawn(async move {
            let result = future.await;
            gatherer.add(result);
            drop(running);
        })
    }

    /// Registers `hook` to run once the first error is gathered. If that already happened,
    /// `hook` runs right away.
    pub fn on_fail(&self, hook: impl FnOnce() + Send + 'static) {
        self.inner.failed.on_close_always(hook);
    }

    /// Resolves once the first error is gathered.
    pub async fn failed(&self) {
        self.inner.failed.closed().await;
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.inner.failed.is_closed()
    }

    /// The errors gathered so far.
    ///
    /// # Errors
    ///
    /// * All gathered errors, if there are any
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    pub fn err(&self) -> Result<(), AccumulatedError> {
        let errors = self.inner.errors.lock().unwrap();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AccumulatedError {
                errors: errors.clone(),
            })
        }
    }

    /// Waits until every task started with [`Gatherer::go`] has ended.
    ///
    /// # Errors
    ///
    /// * All gathered errors, if there are any
    pub async fn wait(&self) -> Result<(), AccumulatedError> {
        self.inner.running.wait().await;
        self.err()
    }

    /// Waits until every task has ended or the first error is gathered.
    pub async fn wait_done_or_failed(&self) {
        tokio::select! {
            () = self.inner.running.wait() => {}
            () = self.failed() => {}
        }
    }

    /// Like [`Gatherer::wait_done_or_failed`], but gives up once `ctx` is done. Returns
    /// whether the gatherer finished or failed before that.
    pub async fn wait_done_or_failed_with_cancellation(&self, ctx: &Context) -> bool {
        tokio::select! {
            biased;
            () = self.wait_done_or_failed() => true,
            () = ctx.done() => false,
        }
    }
}
