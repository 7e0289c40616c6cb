//! Cancellation contexts.
//!
//! A [`Context`] is a [`CancellationToken`] paired with an optional deadline. It is the
//! cancellation handle accepted by every blocking operation in the concord packages: a
//! waiting call returns early once its context is done, either because it was cancelled
//! explicitly (or through a parent) or because its deadline passed.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use concord_context::{Context, ContextError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ctx = Context::background().with_timeout(Duration::from_millis(10));
//! ctx.done().await;
//!
//! assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
//! # }
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::time::Duration;

pub use tokio::time::Instant;
pub use tokio_util::sync::CancellationToken;

pub mod terminates;

pub use terminates::{terminates, terminates_ctx, terminates_quickly};

/// The reason a [`Context`] is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// A cancellation token with an optional deadline.
///
/// Cloning a `Context` yields a handle to the same context. Derived contexts
/// ([`Context::with_cancel`], [`Context::with_timeout`], [`Context::with_deadline`]) are done
/// whenever their parent is done, but cancelling a derived context leaves the parent
/// untouched.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// A fresh context without a deadline that is only done once [`Context::cancel`] is called.
    #[must_use]
    pub fn background() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Wraps an existing token. The context is done once the token is cancelled.
    #[must_use]
    pub const fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derives a context that can be cancelled independently of this one.
    #[must_use]
    pub fn with_cancel(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derives a context that is done at `deadline` at the latest.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: Some(self.deadline.map_or(deadline, |parent| parent.min(deadline))),
        }
    }

    /// Derives a context that is done after `timeout` at the latest.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns whether the context is done, without waiting.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Returns why the context is done, or `None` while it is still live.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            Some(ContextError::DeadlineExceeded)
        } else if self.token.is_cancelled() {
            Some(ContextError::Canceled)
        } else {
            None
        }
    }

    /// Resolves once the context is done.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

/// Returns whether `err`, or any error in its `source()` chain, is a [`ContextError`].
#[must_use]
pub fn is_context_error(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if err.is::<ContextError>() {
            return true;
        }
        current = err.source();
    }
    false
}
