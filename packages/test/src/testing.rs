//! Testing objects that assertions report through.

use std::{
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::abort::{Abort, check_abort, force_unwind};

/// The reporting interface of a test.
pub trait TestingT: Send + Sync {
    fn name(&self) -> &str;

    /// Reports a failure and lets the test continue.
    fn error(&self, msg: &str);

    /// Marks the test as failed and stops the calling task.
    fn fail_now(&self) -> !;
}

/// A testing object that records what was reported to it.
///
/// [`TestingT::fail_now`] records the call and then terminates the calling task through
/// [`force_unwind`].
#[derive(Debug, Default)]
pub struct Recorder {
    name: String,
    errors: Mutex<Vec<String>>,
    failed_now: AtomicBool,
}

impl Recorder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.lock().unwrap().is_empty()
    }

    /// Whether [`TestingT::fail_now`] was called.
    #[must_use]
    pub fn failed_now(&self) -> bool {
        self.failed_now.load(Ordering::SeqCst)
    }

    /// Whether anything was reported.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.failed_now() || self.has_errors()
    }
}

impl TestingT for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn error(&self, msg: &str) {
        log::debug!("{}: recorded error: {msg}", self.name);
        self.errors.lock().unwrap().push(msg.to_owned());
    }

    fn fail_now(&self) -> ! {
        log::debug!("{}: recorded fail_now", self.name);
        self.failed_now.store(true, Ordering::SeqCst);
        force_unwind()
    }
}

/// A testing object that reports through the Rust test harness.
///
/// Errors are logged and collected. [`TestingT::fail_now`] panics with everything reported
/// so far. Dropping a `TestCase` that recorded a failure panics as well, unless the thread
/// is already panicking, so reported errors cannot go unnoticed.
#[derive(Debug)]
pub struct TestCase {
    name: String,
    errors: Mutex<Vec<String>>,
    failed: AtomicBool,
}

impl TestCase {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            errors: Mutex::new(vec![]),
            failed: AtomicBool::new(false),
        })
    }

    fn report(&self) -> String {
        let errors = self
            .errors
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut report = format!("test '{}' failed", self.name);
        for err in errors.iter() {
            report.push_str("\n    ");
            report.push_str(err);
        }
        report
    }

    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl TestingT for TestCase {
    fn name(&self) -> &str {
        &self.name
    }

    fn error(&self, msg: &str) {
        log::error!("{}: {msg}", self.name);
        self.failed.store(true, Ordering::SeqCst);
        self.errors.lock().unwrap().push(msg.to_owned());
    }

    fn fail_now(&self) -> ! {
        self.failed.store(true, Ordering::SeqCst);
        panic!("{}", self.report());
    }
}

impl Drop for TestCase {
    fn drop(&mut self) {
        if self.failed.load(Ordering::SeqCst) && !std::thread::panicking() {
            panic!("{}", self.report());
        }
    }
}

/// Runs the future produced by `f` against a fresh [`Recorder`] and reports through `t`
/// unless it called [`TestingT::fail_now`].
pub async fn assert_fatal<F, Fut>(t: &dyn TestingT, f: F)
where
    F: FnOnce(Arc<Recorder>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let recorder = Arc::new(Recorder::new(format!("{}/fatal", t.name())));
    let abort = check_abort({
        let recorder = recorder.clone();
        move || f(recorder)
    })
    .await;

    if recorder.failed_now() {
        return;
    }
    match abort {
        Some(Abort::Panic(panic)) => t.error(&format!("expected fail_now, got {panic}")),
        _ => t.error("expected fail_now to be called"),
    }
}

/// Runs the future produced by `f` against a fresh [`Recorder`] and reports through `t`
/// unless it reported an error.
pub async fn assert_error<F, Fut>(t: &dyn TestingT, f: F)
where
    F: FnOnce(Arc<Recorder>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let recorder = Arc::new(Recorder::new(format!("{}/error", t.name())));
    let abort = check_abort({
        let recorder = recorder.clone();
        move || f(recorder)
    })
    .await;

    if let Some(Abort::Panic(panic)) = abort {
        t.error(&format!("expected an error, got {panic}"));
    } else if !recorder.has_errors() {
        t.error("expected an error to be reported");
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::panic::check_panic;

    use super::*;

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn recorder_fail_now_unwinds_the_task() {
        let recorder = Arc::new(Recorder::new("recorder"));
        let r = recorder.clone();
        let abort = check_abort(move || async move {
            r.error("first");
            r.fail_now();
        })
        .await;

        assert!(matches!(abort, Some(Abort::ForcedUnwind(_))));
        assert!(recorder.failed_now());
        assert_eq!(recorder.errors(), vec!["first".to_owned()]);
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn assert_fatal_passes_when_fail_now_is_called() {
        let outer = Recorder::new("outer");
        assert_fatal(&outer, |t| async move { t.fail_now() }).await;
        assert!(!outer.failed());

        assert_fatal(&outer, |_| async {}).await;
        assert_eq!(outer.errors(), vec!["expected fail_now to be called".to_owned()]);
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn assert_error_passes_when_an_error_is_reported() {
        let outer = Recorder::new("outer");
        assert_error(&outer, |t| async move { t.error("reported") }).await;
        assert!(!outer.failed());

        assert_error(&outer, |_| async {}).await;
        assert_eq!(
            outer.errors(),
            vec!["expected an error to be reported".to_owned()]
        );
    }

    #[test_log::test]
    fn test_case_fail_now_panics_with_the_report() {
        let case = TestCase::new("case");
        case.error("went wrong");

        let (did_panic, value) = check_panic(|| case.fail_now());
        assert!(did_panic);
        let message = value.unwrap().downcast::<String>().unwrap();
        assert_eq!(*message, "test 'case' failed\n    went wrong");

        // Dropping the failed case panics too.
        let (did_panic, _) = check_panic(move || drop(case));
        assert!(did_panic);
    }

    #[test_log::test]
    fn clean_test_case_drops_quietly() {
        let case = TestCase::new("clean");
        assert_eq!(case.name(), "clean");
        drop(case);
    }
}
