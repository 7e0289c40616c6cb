//! A seeded generator that can be shared between tasks.

use std::sync::{Arc, Mutex};

use rand::{
    Rng as _, RngCore, SeedableRng,
    distr::uniform::{SampleRange, SampleUniform},
    rngs::SmallRng,
};

/// A cloneable handle to one seeded generator. All clones draw from the same sequence.
#[derive(Debug, Clone)]
pub struct SharedRng(Arc<Mutex<SmallRng>>);

impl SharedRng {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self(Arc::new(Mutex::new(SmallRng::seed_from_u64(seed))))
    }

    /// A generator seeded like [`crate::prng`]`(name)`.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::from_seed(crate::seed(name, &()))
    }

    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    #[must_use]
    pub fn next_u32(&self) -> u32 {
        self.0.lock().unwrap().next_u32()
    }

    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    #[must_use]
    pub fn next_u64(&self) -> u64 {
        self.0.lock().unwrap().next_u64()
    }

    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    /// * If `range` is empty
    pub fn random_range<T, R>(&self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.0.lock().unwrap().random_range(range)
    }
}

impl RngCore for SharedRng {
    fn next_u32(&mut self) -> u32 {
        Self::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        Self::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.lock().unwrap().fill_bytes(dest);
    }
}
