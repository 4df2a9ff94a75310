use crate::{Measurement, QuantumState, errors::StateError};
use rand::Rng;

/// Repeated-shot measurement of a prepared quantum state.
///
/// Every shot measures a fresh copy of the same preparation, so the outcomes
/// are independent draws from the state's outcome distribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sampler;

impl Sampler {
    pub fn new() -> Self {
        Self
    }

    /// Measures `state` `num_shots` times and returns the outcome index of each
    /// shot, in order.
    ///
    /// # Arguments
    ///
    /// * `state` - The prepared state. It is not modified.
    /// * `measurement` - The measurement to apply on every shot.
    /// * `targets` - The indices of the qubits to measure.
    /// * `num_shots` - The number of shots.
    /// * `rng` - Source of the per-shot randomness.
    pub fn shots<R: Rng + ?Sized>(
        &self,
        state: &QuantumState,
        measurement: &Measurement,
        targets: &[usize],
        num_shots: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>, StateError> {
        if num_shots == 0 {
            return Ok(Vec::new());
        }

        // The distribution is the same for every shot, compute it once
        let (probs, _) = state.probabilities(measurement, targets)?;

        Ok((0..num_shots)
            .map(|_| QuantumState::pick_outcome(&probs, rng))
            .collect())
    }
}
