//! Assertions on whether a future finishes in time.

use std::{future::Future, time::Duration};

use concord_context::{Context, terminates, terminates_ctx, terminates_quickly};

use crate::TestingT;

const SHOULD_TERMINATE: &str = "future should have terminated within timeout";
const SHOULD_NOT_TERMINATE: &str = "future should not have terminated within timeout";

/// Reports through `t` unless `future` finishes before `ctx` is done.
pub async fn assert_terminates_ctx<F>(ctx: &Context, t: &dyn TestingT, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if !terminates_ctx(ctx, future).await {
        t.error(SHOULD_TERMINATE);
    }
}

/// Reports through `t` if `future` finishes before `ctx` is done.
pub async fn assert_not_terminates_ctx<F>(ctx: &Context, t: &dyn TestingT, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if terminates_ctx(ctx, future).await {
        t.error(SHOULD_NOT_TERMINATE);
    }
}

pub async fn assert_terminates<F>(t: &dyn TestingT, timeout: Duration, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if !terminates(timeout, future).await {
        t.error(SHOULD_TERMINATE);
    }
}

pub async fn assert_not_terminates<F>(t: &dyn TestingT, timeout: Duration, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if terminates(timeout, future).await {
        t.error(SHOULD_NOT_TERMINATE);
    }
}

pub async fn assert_terminates_quickly<F>(t: &dyn TestingT, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if !terminates_quickly(future).await {
        t.error(SHOULD_TERMINATE);
    }
}

pub async fn assert_not_terminates_quickly<F>(t: &dyn TestingT, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if terminates_quickly(future).await {
        t.error(SHOULD_NOT_TERMINATE);
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::{Recorder, TestCase, assert_error};

    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn passing_assertions_report_nothing() {
        let t = TestCase::new("passing_assertions_report_nothing");
        assert_terminates(&*t, TIMEOUT, async {}).await;
        assert_not_terminates(&*t, TIMEOUT, tokio::time::sleep(2 * TIMEOUT)).await;
        assert_terminates_quickly(&*t, async {}).await;
        assert_not_terminates_quickly(&*t, tokio::time::sleep(TIMEOUT)).await;

        let ctx = Context::background().with_timeout(TIMEOUT);
        assert_terminates_ctx(&ctx, &*t, async {}).await;
        assert_not_terminates_ctx(&ctx, &*t, tokio::time::sleep(2 * TIMEOUT)).await;
        assert!(t.errors().is_empty());
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn failing_assertions_report_an_error() {
        let t = TestCase::new("failing_assertions_report_an_error");

        assert_error(&*t, |t| async move {
            assert_terminates(&*t, TIMEOUT, tokio::time::sleep(2 * TIMEOUT)).await;
        })
        .await;
        assert_error(&*t, |t| async move {
            assert_not_terminates(&*t, TIMEOUT, async {}).await;
        })
        .await;
        assert_error(&*t, |t| async move {
            assert_not_terminates_quickly(&*t, async {}).await;
        })
        .await;
        assert_error(&*t, |t| async move {
            let ctx = Context::background();
            ctx.cancel();
            assert_terminates_ctx(&ctx, &*t, async {}).await;
        })
        .await;
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn reports_the_expectation() {
        let recorder = Recorder::new("recorder");
        assert_terminates_quickly(&recorder, tokio::time::sleep(TIMEOUT)).await;
        assert_eq!(recorder.errors(), vec![SHOULD_TERMINATE.to_owned()]);
    }
}
