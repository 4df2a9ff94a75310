//! Sources of uniformly random bits.
//!
//! Two interchangeable strategies implement [`EntropySource`]:
//! - [`QuantumEntropy`]: a qubit is put into equal superposition with a
//!   Hadamard gate and measured in the Z basis, one shot per bit.
//! - [`PseudoRandomEntropy`]: bits drawn directly from a `rand` RNG.
//!
//! Sources are handed to the protocol by the caller, so tests can swap in a
//! deterministic stream.

use crate::errors::QkdError;
use crate::{Gate, Measurement, QuantumState, Sampler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A supplier of independent, uniformly distributed bits.
pub trait EntropySource {
    /// Draws a single bit.
    fn next_bit(&mut self) -> Result<bool, QkdError>;

    /// Draws `n` bits in one call. `n == 0` yields an empty vector.
    fn generate_bits(&mut self, n: usize) -> Result<Vec<bool>, QkdError> {
        (0..n).map(|_| self.next_bit()).collect()
    }
}

impl<E: EntropySource + ?Sized> EntropySource for Box<E> {
    fn next_bit(&mut self) -> Result<bool, QkdError> {
        (**self).next_bit()
    }

    fn generate_bits(&mut self, n: usize) -> Result<Vec<bool>, QkdError> {
        (**self).generate_bits(n)
    }
}

/// Bits from measuring |+> = H|0> in the computational basis.
#[derive(Debug, Clone)]
pub struct QuantumEntropy<R = StdRng> {
    superposition: QuantumState,
    measurement: Measurement,
    sampler: Sampler,
    rng: R,
}

impl QuantumEntropy<StdRng> {
    /// Measurement randomness seeded from the operating system.
    pub fn new() -> Result<Self, QkdError> {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Reproducible measurement outcomes.
    pub fn seeded(seed: u64) -> Result<Self, QkdError> {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> QuantumEntropy<R> {
    pub fn with_rng(rng: R) -> Result<Self, QkdError> {
        let mut superposition = QuantumState::new(1);
        superposition.apply(&Gate::h(), &[0])?;

        Ok(Self {
            superposition,
            measurement: Measurement::z_basis(),
            sampler: Sampler::new(),
            rng,
        })
    }
}

impl<R: Rng> EntropySource for QuantumEntropy<R> {
    fn next_bit(&mut self) -> Result<bool, QkdError> {
        let mut state = self.superposition.clone();
        let outcome = state.measure(&self.measurement, &[0], &mut self.rng)?;
        Ok(outcome.index == 1)
    }

    fn generate_bits(&mut self, n: usize) -> Result<Vec<bool>, QkdError> {
        trace!(bits = n, "sampling superposed qubits");
        let shots = self.sampler.shots(
            &self.superposition,
            &self.measurement,
            &[0],
            n,
            &mut self.rng,
        )?;
        Ok(shots.into_iter().map(|idx| idx == 1).collect())
    }
}

/// Bits drawn uniformly from a pseudo-random generator.
#[derive(Debug, Clone)]
pub struct PseudoRandomEntropy<R = StdRng> {
    rng: R,
}

impl PseudoRandomEntropy<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for PseudoRandomEntropy<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PseudoRandomEntropy<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> EntropySource for PseudoRandomEntropy<R> {
    fn next_bit(&mut self) -> Result<bool, QkdError> {
        Ok(self.rng.random_bool(0.5))
    }
}

/// Which entropy strategy a protocol run draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntropyMode {
    #[default]
    Quantum,
    PseudoRandom,
}

impl EntropyMode {
    /// Builds the source for this mode, reproducible when `seed` is given.
    pub fn build(self, seed: Option<u64>) -> Result<Box<dyn EntropySource + Send>, QkdError> {
        let source: Box<dyn EntropySource + Send> = match (self, seed) {
            (EntropyMode::Quantum, Some(seed)) => Box::new(QuantumEntropy::seeded(seed)?),
            (EntropyMode::Quantum, None) => Box::new(QuantumEntropy::new()?),
            (EntropyMode::PseudoRandom, Some(seed)) => Box::new(PseudoRandomEntropy::seeded(seed)),
            (EntropyMode::PseudoRandom, None) => Box::new(PseudoRandomEntropy::new()),
        };
        Ok(source)
    }
}
