use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Injectable randomness. Every probabilistic decision in the crate draws from one of these.
pub trait RandomSource: Send {
    /// Uniform draw in [0, 1).
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `0..len`. An empty range yields 0.
    fn pick_index(&mut self, len: usize) -> usize {
        ((self.next_unit() * len as f64) as usize).min(len.saturating_sub(1))
    }
}

/// Probability gate: passes iff the draw lands below `probability`.
pub fn passes(source: &mut dyn RandomSource, probability: f64) -> bool {
    source.next_unit() < probability
}

pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng + Send> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

/// Always returns the same draw. `FixedGate::open()` passes every gate with p > 0,
/// `FixedGate::closed()` passes none.
#[derive(Debug, Clone, Copy)]
pub struct FixedGate(pub f64);

impl FixedGate {
    pub fn open() -> Self {
        Self(0.0)
    }

    pub fn closed() -> Self {
        Self(1.0)
    }
}

impl RandomSource for FixedGate {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

/// Replays a script of draws, then repeats the last one.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: VecDeque<f64>,
    last: f64,
}

impl ScriptedSource {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            last: 0.0,
        }
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        if let Some(next) = self.draws.pop_front() {
            self.last = next;
        }
        self.last
    }
}
