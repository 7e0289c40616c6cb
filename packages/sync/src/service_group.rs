//! Fail-fast supervision of a group of tasks.

use std::{
    error::Error,
    future::Future,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use concord_context::CancellationToken;
use tokio::task::JoinHandle;

pub type SharedError = Arc<dyn Error + Send + Sync>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Failed(SharedError),
    #[error("service task ended without returning")]
    Aborted,
}

pub type ServiceResult = Result<(), ServiceError>;

#[derive(Debug, Default)]
struct Inner {
    remaining: AtomicUsize,
    result: OnceLock<ServiceResult>,
    done: CancellationToken,
}

impl Inner {
    fn finish(&self, result: ServiceResult) {
        if self.result.set(result).is_ok() {
            self.done.cancel();
        }
    }
}

/// Settles the group for one task when dropped, so that a task which panics or is dropped
/// early still counts as finished.
struct Finisher {
    inner: Arc<Inner>,
    result: Option<ServiceResult>,
}

impl Drop for Finisher {
    fn drop(&mut self) {
        let result = self.result.take().unwrap_or(Err(ServiceError::Aborted));
        let remaining = self.inner.remaining.fetch_sub(1, Ordering::AcqRel) - 1;
        if result.is_ok() && remaining > 0 {
            return;
        }
        self.inner.finish(result);
    }
}

/// A collection of tasks that together make up one service.
///
/// The group is done as soon as one task fails or every task has succeeded, whichever
/// happens first. Completion is eager: once all tasks started so far have succeeded, the
/// group stays successful even if more tasks are started and fail afterwards.
///
/// A task that panics, or that is dropped before finishing, settles the group with
/// [`ServiceError::Aborted`].
#[derive(Debug, Clone, Default)]
pub struct ServiceGroup {
    inner: Arc<Inner>,
}

impl ServiceGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `future` as a new task of the group.
    ///
    /// A panic inside `future` surfaces through the returned handle as usual.
    ///
    /// # Panics
    ///
    /// * If called outside of a tokio runtime
    pub fn go<F, E>(&self, future: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        self.inner.remaining.fetch_add(1, Ordering::AcqRel);

        let mut finisher = Finisher {
            inner: self.inner.clone(),
            result: None,
        };
        tokio::spawn(async move {
            let result = future
                .await
                .map_err(|e| ServiceError::Failed(Arc::from(e.into())));
            finisher.result = Some(result);
        })
    }

    /// The terminal result of the group, or `None` while it is still running.
    #[must_use]
    pub fn err(&self) -> Option<ServiceResult> {
        self.inner.result.get().cloned()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.inner.done.is_cancelled()
    }

    /// Resolves once the group is done.
    pub async fn done(&self) {
        self.inner.done.cancelled().await;
    }

    /// Waits until the group is done and returns its terminal result.
    ///
    /// # Errors
    ///
    /// * The error of the first failing task
    pub async fn wait(&self) -> ServiceResult {
        self.done().await;
        // The result is stored before `done` is cancelled.
        self.err().unwrap_or(Ok(()))
    }
}
