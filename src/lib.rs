//! BB84 quantum key distribution simulator with a key-derived XOR cipher.
//!
//! [`protocols::bb84::run`] exchanges `key_length` simulated qubits and sifts
//! a shared key; [`cipher::encrypt`] and [`cipher::decrypt`] use that key.

pub mod cipher;
pub mod config;
mod core;
pub mod entropy;
pub mod protocols;
mod sampler;

pub use crate::cipher::{Plaintext, decrypt, encrypt};
pub use crate::config::QkdConfig;
pub use crate::core::{Gate, Measurement, MeasurementResult, QuantumState, errors, utils};
pub use crate::entropy::{EntropyMode, EntropySource, PseudoRandomEntropy, QuantumEntropy};
pub use crate::protocols::qkd::bb84::{Bb84, Session};
pub use crate::protocols::qkd::qubit::{Basis, QubitState, prepare};
pub use crate::sampler::Sampler;
