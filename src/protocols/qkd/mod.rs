//! Quantum Key Distribution (QKD).
//!
//! - **qubit**: preparation and measurement of single BB84 qubits.
//! - **bb84**: the Bennett–Brassard 1984 protocol, from raw bits to a sifted key.

pub mod bb84;
pub mod qubit;
