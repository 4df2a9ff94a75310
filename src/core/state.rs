use crate::core::Gate;
use crate::core::errors::{MeasurementError, StateError};
use crate::core::measurements::{Measurement, MeasurementResult};
use crate::core::utils::{dagger, find_duplicate, trace};
use ndarray::Array2;
use num_complex::Complex64;
use rand::Rng;

/// Density-matrix state of a small qubit register.
#[derive(Clone, Debug)]
pub struct QuantumState {
    pub density_matrix: Array2<Complex64>,
    pub num_qubits: usize,
}

impl QuantumState {
    /// Creates a new quantum state initialized to |0...0>.
    pub fn new(num_qubits: usize) -> Self {
        let dim = 1 << num_qubits;
        let mut density_matrix = Array2::<Complex64>::zeros((dim, dim));
        density_matrix[[0, 0]] = Complex64::new(1.0, 0.0);

        Self {
            density_matrix,
            num_qubits,
        }
    }

    /// Checks that the density matrix still has unit trace.
    pub fn is_valid(&self) -> Result<(), StateError> {
        let tr = trace(&self.density_matrix);
        if (tr - Complex64::new(1.0, 0.0)).norm() > 1e-12 {
            return Err(StateError::InvalidTrace(tr));
        }
        Ok(())
    }

    /// rho -> U rho U†, with `u` already expanded to the whole register.
    fn apply_operator(&mut self, u: &Array2<Complex64>) -> Result<(), StateError> {
        let (rows, cols) = u.dim();
        let dim = 1 << self.num_qubits;

        if rows != dim || cols != dim {
            return Err(StateError::DimensionMismatch {
                expected: dim,
                got_rows: rows,
                got_cols: cols,
            });
        }

        self.density_matrix = u.dot(&self.density_matrix).dot(&dagger(u));

        Ok(())
    }

    fn validate_qubit_index(&self, index: usize) -> Result<(), StateError> {
        if index >= self.num_qubits {
            return Err(StateError::IndexOutOfBounds {
                index,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    /// Applies `gate` to `target_qubits`.
    pub fn apply(&mut self, gate: &Gate, target_qubits: &[usize]) -> Result<(), StateError> {
        if gate.num_qubits != target_qubits.len() {
            return Err(StateError::DimensionMismatch {
                expected: gate.num_qubits,
                got_rows: target_qubits.len(),
                got_cols: 0,
            });
        }

        for &q in target_qubits {
            self.validate_qubit_index(q)?;
        }

        let full_gate = Gate::expand_gate(self.num_qubits, gate, target_qubits)?;

        self.apply_operator(&full_gate.matrix)
    }

    /// Outcome probabilities of `measurement` on `target_qubits`, paired with
    /// the operators expanded to the whole register.
    pub fn probabilities(
        &self,
        measurement: &Measurement,
        target_qubits: &[usize],
    ) -> Result<(Vec<f64>, Vec<Array2<Complex64>>), StateError> {
        for &q in target_qubits {
            self.validate_qubit_index(q)?;
        }

        if let Some(dup) = find_duplicate(target_qubits) {
            return Err(StateError::MeasurementError(
                MeasurementError::DuplicateQubit(dup),
            ));
        }

        let expanded_ops = measurement.get_expanded_operators(self.num_qubits, target_qubits)?;

        let mut probs: Vec<f64> = expanded_ops
            .iter()
            .map(|op| {
                let rho_k = op.dot(&self.density_matrix).dot(&dagger(op));
                trace(&rho_k).re.max(0.0)
            })
            .collect();

        // Renormalize against float drift
        let sum_probs: f64 = probs.iter().sum();
        for p in &mut probs {
            *p /= sum_probs;
        }

        Ok((probs, expanded_ops))
    }

    /// Picks an outcome index weighted by `probs`.
    pub(crate) fn pick_outcome<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> usize {
        let roll: f64 = rng.random();

        let mut cumulative = 0.0;
        for (i, &p) in probs.iter().enumerate() {
            cumulative += p;
            if roll < cumulative {
                return i;
            }
        }
        probs.len().saturating_sub(1)
    }

    /// Measures `target_qubits`, collapsing the state onto the observed outcome.
    pub fn measure<R: Rng + ?Sized>(
        &mut self,
        measurement: &Measurement,
        target_qubits: &[usize],
        rng: &mut R,
    ) -> Result<MeasurementResult, StateError> {
        let (probs, ops) = self.probabilities(measurement, target_qubits)?;

        let outcome_idx = Self::pick_outcome(&probs, rng);
        let p_selected = probs[outcome_idx];

        if p_selected <= 1e-12 {
            return Err(StateError::InvalidTrace(Complex64::new(0.0, 0.0)));
        }

        // rho' = (M_k rho M_k†) / p_k
        let m_k = &ops[outcome_idx];
        let numerator = m_k.dot(&self.density_matrix).dot(&dagger(m_k));
        self.density_matrix = numerator.mapv(|val| val / p_selected);

        Ok(MeasurementResult {
            index: outcome_idx,
            value: measurement.values[outcome_idx],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn fresh_state_measures_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut state = QuantumState::new(1);
            let res = state.measure(&Measurement::z_basis(), &[0], &mut rng).unwrap();
            assert_eq!(res.index, 0);
        }
    }

    #[test]
    fn hadamard_gives_even_probabilities() {
        let mut state = QuantumState::new(1);
        state.apply(&Gate::h(), &[0]).unwrap();
        let (probs, _) = state.probabilities(&Measurement::z_basis(), &[0]).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-9);
        assert!((probs[1] - 0.5).abs() < 1e-9);
        assert!(state.is_valid().is_ok());
    }

    #[test]
    fn measurement_collapses_state() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = QuantumState::new(1);
        state.apply(&Gate::h(), &[0]).unwrap();
        let first = state.measure(&Measurement::z_basis(), &[0], &mut rng).unwrap();
        for _ in 0..20 {
            let again = state.measure(&Measurement::z_basis(), &[0], &mut rng).unwrap();
            assert_eq!(again.index, first.index);
        }
    }

    #[test]
    fn x_on_second_qubit_of_register() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = QuantumState::new(2);
        state.apply(&Gate::x(), &[1]).unwrap();
        let q0 = state.measure(&Measurement::z_basis(), &[0], &mut rng).unwrap();
        let q1 = state.measure(&Measurement::z_basis(), &[1], &mut rng).unwrap();
        assert_eq!((q0.index, q1.index), (0, 1));
    }

    #[test]
    fn out_of_range_target_is_rejected() {
        let mut state = QuantumState::new(1);
        let res = state.apply(&Gate::x(), &[3]);
        assert!(matches!(
            res,
            Err(StateError::IndexOutOfBounds {
                index: 3,
                num_qubits: 1
            })
        ));
    }

    #[test]
    fn duplicate_measurement_target_is_rejected() {
        let state = QuantumState::new(2);
        let res = state.probabilities(&Measurement::z_basis(), &[0, 0]);
        assert!(matches!(
            res,
            Err(StateError::MeasurementError(MeasurementError::DuplicateQubit(0)))
        ));
    }
}
