//! Single-qubit channel for BB84.
//!
//! A prepared qubit is an immutable value holding the encoding basis and the
//! encoded bit. Measuring consumes it: in the encoding basis the bit comes back
//! unchanged, in the conjugate basis the outcome is a fresh uniform bit.

use crate::entropy::EntropySource;
use crate::errors::{QkdError, StateError};
use crate::{Gate, Measurement, QuantumState};
use serde::{Deserialize, Serialize};

/// BB84 encoding/measurement basis.
///
/// Serialized as its numeric tag: `0` rectilinear (Z), `1` diagonal (X).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Basis {
    /// {|0>, |1>}
    Rectilinear,
    /// {|+>, |->}
    Diagonal,
}

impl Basis {
    pub fn tag(self) -> u8 {
        match self {
            Basis::Rectilinear => 0,
            Basis::Diagonal => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, QkdError> {
        match tag {
            0 => Ok(Basis::Rectilinear),
            1 => Ok(Basis::Diagonal),
            other => Err(QkdError::InvalidBasis(other)),
        }
    }

    /// Maps an entropy bit onto a basis choice.
    pub fn from_bit(bit: bool) -> Self {
        if bit { Basis::Diagonal } else { Basis::Rectilinear }
    }

    /// Projective measurement for this basis on the state engine.
    pub fn measurement(self) -> Measurement {
        match self {
            Basis::Rectilinear => Measurement::z_basis(),
            Basis::Diagonal => Measurement::x_basis(),
        }
    }
}

impl From<Basis> for u8 {
    fn from(basis: Basis) -> u8 {
        basis.tag()
    }
}

impl TryFrom<u8> for Basis {
    type Error = QkdError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Basis::from_tag(tag)
    }
}

/// A qubit in flight between sender and receiver.
#[derive(Debug, PartialEq, Eq)]
pub struct QubitState {
    basis: Basis,
    bit: bool,
}

/// Encodes `bit` under `basis`.
pub fn prepare(bit: bool, basis: Basis) -> QubitState {
    QubitState { basis, bit }
}

impl QubitState {
    /// Measures the qubit in `basis`.
    ///
    /// A conjugate-basis measurement draws exactly one bit from `entropy`; a
    /// same-basis measurement draws nothing.
    pub fn measure<E: EntropySource + ?Sized>(
        self,
        basis: Basis,
        entropy: &mut E,
    ) -> Result<bool, QkdError> {
        if basis == self.basis {
            Ok(self.bit)
        } else {
            entropy.next_bit()
        }
    }

    /// The density-matrix state this qubit stands for: X when the bit is set,
    /// then H for the diagonal basis.
    pub fn to_quantum_state(&self) -> Result<QuantumState, StateError> {
        let mut state = QuantumState::new(1);
        if self.bit {
            state.apply(&Gate::x(), &[0])?;
        }
        if self.basis == Basis::Diagonal {
            state.apply(&Gate::h(), &[0])?;
        }
        Ok(state)
    }
}
