use crate::core::errors::GateError;
use crate::core::utils;
use ndarray::{Array2, arr2};
use num_complex::Complex64;

/// Represents a quantum gate.
///
/// A gate is defined by its unitary matrix and the number of qubits it acts on.
#[derive(Clone, Debug)]
pub struct Gate {
    /// The unitary matrix of the gate.
    pub matrix: Array2<Complex64>,
    /// The number of qubits the gate acts on.
    pub num_qubits: usize,
}

impl Gate {
    /// Creates a new `Gate` from a unitary matrix.
    ///
    /// # Errors
    ///
    /// Returns a `GateError` if:
    /// - The matrix is not square.
    /// - The matrix dimensions are not a power of 2.
    /// - The matrix is not unitary.
    pub fn new(matrix: Array2<Complex64>) -> Result<Self, GateError> {
        let (rows, cols) = matrix.dim();

        if rows != cols {
            return Err(GateError::NotSquareMatrix);
        }

        if !rows.is_power_of_two() {
            return Err(GateError::InvalidDimensions);
        }

        if !Self::check_unitary(&matrix) {
            return Err(GateError::NonUnitary);
        }

        let num_qubits = rows.trailing_zeros() as usize;

        Ok(Self { matrix, num_qubits })
    }

    /// Checks if a given matrix is unitary
    fn check_unitary(matrix: &Array2<Complex64>) -> bool {
        let (rows, _) = matrix.dim();
        let eye = Array2::<Complex64>::eye(rows);

        let product = matrix.dot(&utils::dagger(matrix));

        product
            .iter()
            .zip(eye.iter())
            .all(|(a, b)| (*a - *b).norm() < 1e-6)
    }

    /// Expands a gate acting on `targets` to the whole register.
    pub fn expand_gate(
        num_total_qubits: usize,
        gate: &Gate,
        targets: &[usize],
    ) -> Result<Gate, GateError> {
        if let Some(dup) = utils::find_duplicate(targets) {
            return Err(GateError::DuplicateQubit(dup));
        }

        Ok(Gate {
            matrix: utils::expand_operator(num_total_qubits, &gate.matrix, targets),
            num_qubits: num_total_qubits,
        })
    }

    /// Builds a one-qubit gate from a matrix known to be unitary.
    fn single(matrix: [[Complex64; 2]; 2]) -> Gate {
        Gate {
            matrix: arr2(&matrix),
            num_qubits: 1,
        }
    }

    /// Pauli-X (bit flip). Encodes a classical `1`.
    pub fn x() -> Gate {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        Gate::single([[zero, one], [one, zero]])
    }

    /// Hadamard. Moves between the rectilinear and diagonal bases and puts
    /// |0> into an equal superposition.
    pub fn h() -> Gate {
        let f = Complex64::new(1.0 / 2.0_f64.sqrt(), 0.0);
        Gate::single([[f, f], [f, -f]])
    }
}
