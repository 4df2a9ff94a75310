//! Quantum cryptography protocols.
//!
//! Currently hosts the BB84 key distribution protocol and its qubit channel.

pub mod qkd;
pub use qkd::bb84;
