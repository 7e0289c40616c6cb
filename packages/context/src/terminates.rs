//! Probes for whether a future finishes in time.
//!
//! The probed future is spawned as its own task, so a future that does not finish in time
//! keeps running after the probe has returned.

use std::{future::Future, time::Duration};

use crate::Context;

/// The timeout used by [`terminates_quickly`].
pub const QUICKLY: Duration = Duration::from_millis(20);

/// Returns whether `future` runs to completion before `ctx` is done.
///
/// A context that is already done yields `false` without spawning the future. A future
/// that unwinds counts as not terminating; the probe then waits for `ctx` before returning.
///
/// # Panics
///
/// * If called outside of a tokio runtime
pub async fn terminates_ctx<F>(ctx: &Context, future: F) -> bool
where
    F: Future<Output = ()> + Send + 'static,
{
    if ctx.is_done() {
        return false;
    }

    let mut handle = tokio::spawn(future);

    tokio::select! {
        result = &mut handle => {
            if result.is_ok() {
                true
            } else {
                ctx.done().await;
                false
            }
        }
        () = ctx.done() => false,
    }
}

/// Returns whether `future` runs to completion within `timeout`.
pub async fn terminates<F>(timeout: Duration, future: F) -> bool
where
    F: Future<Output = ()> + Send + 'static,
{
    terminates_ctx(&Context::background().with_timeout(timeout), future).await
}

/// Returns whether `future` runs to completion within [`QUICKLY`].
pub async fn terminates_quickly<F>(future: F) -> bool
where
    F: Future<Output = ()> + Send + 'static,
{
    terminates(QUICKLY, future).await
}
