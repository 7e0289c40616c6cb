//! Deterministic seeds for tests.
//!
//! All seeds are derived from a process-wide root seed. The root seed is read from the
//! `CONCORD_TEST_SEED` environment variable if it is set, and drawn from OS entropy
//! otherwise. It is logged once, so a failing run can be replayed with the same seed.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::{
    hash::{DefaultHasher, Hash, Hasher},
    sync::LazyLock,
};

use rand::{RngCore, SeedableRng, rngs::SmallRng};

pub mod rng;

pub use rand;
pub use rng::SharedRng;

/// The environment variable that fixes the root seed.
pub const SEED_ENV: &str = "CONCORD_TEST_SEED";

/// The generator returned by [`prng`].
pub type Prng = SmallRng;

static ROOT_SEED: LazyLock<u64> = LazyLock::new(|| {
    let seed = parse_root_seed(std::env::var(SEED_ENV).ok().as_deref());
    if contains_fixed_seed() {
        log::info!("using fixed root seed {seed} from {SEED_ENV}");
    } else {
        log::info!("using random root seed {seed} (set {SEED_ENV}={seed} to reproduce)");
    }
    seed
});

fn parse_root_seed(value: Option<&str>) -> u64 {
    value.map_or_else(
        || SmallRng::from_os_rng().next_u64(),
        |value| {
            value.trim().parse::<u64>().unwrap_or_else(|e| {
                panic!("could not parse {SEED_ENV} = '{value}' as u64: {e}")
            })
        },
    )
}

/// Returns the root seed all other seeds are derived from.
///
/// # Panics
///
/// * If `CONCORD_TEST_SEED` is set but is not a `u64`
#[must_use]
pub fn root_seed() -> u64 {
    *ROOT_SEED
}

/// Returns whether the root seed was fixed through `CONCORD_TEST_SEED`.
#[must_use]
pub fn contains_fixed_seed() -> bool {
    std::env::var(SEED_ENV).is_ok()
}

/// Derives a seed from `name`, `args` and the root seed.
///
/// The same name and arguments yield the same seed for as long as the root seed stays the
/// same.
///
/// # Panics
///
/// * If `CONCORD_TEST_SEED` is set but is not a `u64`
#[must_use]
pub fn seed<A: Hash + ?Sized>(name: &str, args: &A) -> u64 {
    derive_seed(root_seed(), name, args)
}

fn derive_seed<A: Hash + ?Sized>(root: u64, name: &str, args: &A) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    args.hash(&mut hasher);
    root.hash(&mut hasher);
    hasher.finish()
}

/// Returns a generator seeded with [`seed`]`(name, &())`.
#[must_use]
pub fn prng(name: &str) -> Prng {
    prng_with(name, &())
}

/// Returns a generator seeded with [`seed`]`(name, args)`.
#[must_use]
pub fn prng_with<A: Hash + ?Sized>(name: &str, args: &A) -> Prng {
    let seed = seed(name, args);
    log::trace!("prng: name={name} seed={seed}");
    SmallRng::seed_from_u64(seed)
}
