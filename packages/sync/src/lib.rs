//! Composable synchronization primitives for tokio tasks.
//!
//! * [`Signal`]: a reusable broadcast wake-up
//! * [`Mutex`]: a lock with try-locking and cancellable locking
//! * [`WaitGroup`]: a counting barrier
//! * [`Closer`]: a one-shot close with ordered hooks
//! * [`ServiceGroup`]: a task group that finishes on the first failure
//!
//! Every blocking operation has a variant taking a [`concord_context::Context`] that returns
//! early once the context is done.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

pub mod closer;
pub mod mutex;
pub mod service_group;
pub mod signal;
pub mod wait_group;

pub use closer::{AlreadyClosedError, Closer};
pub use mutex::{Mutex, MutexGuard};
pub use service_group::{ServiceError, ServiceGroup, ServiceResult, SharedError};
pub use signal::{Listener, Signal};
pub use wait_group::WaitGroup;
