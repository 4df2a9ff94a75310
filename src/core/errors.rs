use num_complex::Complex64;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum GateError {
    #[error("Matrix is not Unitary (U†U != I)")]
    NonUnitary,

    #[error("Matrix must be square")]
    NotSquareMatrix,

    #[error("Invalid Dimensions")]
    InvalidDimensions,

    #[error("Duplicate qubit index found: {0}")]
    DuplicateQubit(usize),
}

#[derive(Error, Debug, Clone)]
pub enum MeasurementError {
    #[error("Number of operators ({ops}) does not match number of values ({vals})")]
    CountMismatch { ops: usize, vals: usize },

    #[error("Measurement operators do not sum to Identity (Completeness relation failed)")]
    NotComplete,

    #[error("Invalid operator dimensions")]
    InvalidDimensions,

    #[error("Duplicate qubit index found: {0}")]
    DuplicateQubit(usize),
}

#[derive(Error, Debug, Clone)]
pub enum StateError {
    #[error("Trace is not unity: {0}")]
    InvalidTrace(Complex64),

    #[error("Dimension mismatch")]
    DimensionMismatch {
        expected: usize,
        got_rows: usize,
        got_cols: usize,
    },

    #[error("Qubit index out of bounds")]
    IndexOutOfBounds { index: usize, num_qubits: usize },

    #[error("Measurement error: {0}")]
    MeasurementError(#[from] MeasurementError),

    #[error("Gate error: {0}")]
    GateError(#[from] GateError),
}

/// Failures of a BB84 protocol run.
#[derive(Error, Debug, Clone)]
pub enum QkdError {
    #[error("Key length must be greater than zero, got {0}")]
    InvalidKeyLength(usize),

    #[error("Unrecognized basis tag: {0}")]
    InvalidBasis(u8),

    #[error("Inconsistent session: {0}")]
    InconsistentSession(&'static str),

    #[error("Simulation error: {0}")]
    Simulation(#[from] StateError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Key must contain at least one bit")]
    EmptyKey,

    #[error("Key element {0:?} is not a bit")]
    InvalidBit(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] QkdError),
}
