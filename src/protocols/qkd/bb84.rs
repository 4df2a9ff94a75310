use crate::config::QkdConfig;
use crate::entropy::EntropySource;
use crate::errors::QkdError;
use crate::protocols::qkd::qubit::{Basis, QubitState, prepare};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Full trace of one BB84 run.
///
/// Only [`run`] and deserialization build one, and both guarantee that every
/// per-position sequence has `key_length` entries and that `shared_key` is the
/// sifted sender bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord")]
pub struct Session {
    key_length: usize,
    sender_bits: Vec<bool>,
    sender_bases: Vec<Basis>,
    receiver_bases: Vec<Basis>,
    receiver_results: Vec<bool>,
    shared_key: Vec<bool>,
}

/// Unchecked wire form of a [`Session`].
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionRecord {
    key_length: usize,
    sender_bits: Vec<bool>,
    sender_bases: Vec<Basis>,
    receiver_bases: Vec<Basis>,
    receiver_results: Vec<bool>,
    shared_key: Vec<bool>,
}

impl TryFrom<SessionRecord> for Session {
    type Error = QkdError;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        let n = record.key_length;
        if n == 0 {
            return Err(QkdError::InvalidKeyLength(n));
        }
        if record.sender_bits.len() != n
            || record.sender_bases.len() != n
            || record.receiver_bases.len() != n
            || record.receiver_results.len() != n
        {
            return Err(QkdError::InconsistentSession(
                "per-position sequences must have key_length entries",
            ));
        }
        let expected = sift(
            &record.sender_bits,
            &record.sender_bases,
            &record.receiver_bases,
        );
        if record.shared_key != expected {
            return Err(QkdError::InconsistentSession(
                "shared key is not the sifted sender bits",
            ));
        }

        Ok(Session {
            key_length: n,
            sender_bits: record.sender_bits,
            sender_bases: record.sender_bases,
            receiver_bases: record.receiver_bases,
            receiver_results: record.receiver_results,
            shared_key: record.shared_key,
        })
    }
}

impl Session {
    /// Number of raw positions exchanged.
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    pub fn sender_bits(&self) -> &[bool] {
        &self.sender_bits
    }

    pub fn sender_bases(&self) -> &[Basis] {
        &self.sender_bases
    }

    pub fn receiver_bases(&self) -> &[Basis] {
        &self.receiver_bases
    }

    /// What the receiver measured at every position.
    pub fn receiver_results(&self) -> &[bool] {
        &self.receiver_results
    }

    /// Sender bits at the positions where both bases agree, in index order.
    pub fn shared_key(&self) -> &[bool] {
        &self.shared_key
    }

    /// Ascending positions where sender and receiver chose the same basis.
    pub fn matching_indices(&self) -> Vec<usize> {
        matching_indices(&self.sender_bases, &self.receiver_bases)
    }

    /// Fraction of raw positions that survived sifting.
    pub fn sifted_ratio(&self) -> f64 {
        self.shared_key.len() as f64 / self.key_length as f64
    }

    pub fn matching_percentage(&self) -> f64 {
        self.sifted_ratio() * 100.0
    }

    /// The receiver's own measurements at the matching positions.
    ///
    /// Equal to `shared_key` on a noiseless channel.
    pub fn receiver_key(&self) -> Vec<bool> {
        self.receiver_results
            .iter()
            .zip(self.sender_bases.iter().zip(&self.receiver_bases))
            .filter(|(_, (sent, received))| sent == received)
            .map(|(&bit, _)| bit)
            .collect()
    }
}

fn matching_indices(sender_bases: &[Basis], receiver_bases: &[Basis]) -> Vec<usize> {
    sender_bases
        .iter()
        .zip(receiver_bases)
        .enumerate()
        .filter(|(_, (a, b))| a == b)
        .map(|(i, _)| i)
        .collect()
}

/// Keeps `sender_bits[i]` for every `i` where the bases agree.
pub fn sift(sender_bits: &[bool], sender_bases: &[Basis], receiver_bases: &[Basis]) -> Vec<bool> {
    sender_bits
        .iter()
        .zip(sender_bases)
        .zip(receiver_bases)
        .filter(|((_, sent), received)| sent == received)
        .map(|((&bit, _), _)| bit)
        .collect()
}

fn draw_bases<E: EntropySource + ?Sized>(
    entropy: &mut E,
    n: usize,
) -> Result<Vec<Basis>, QkdError> {
    Ok(entropy
        .generate_bits(n)?
        .into_iter()
        .map(Basis::from_bit)
        .collect())
}

/// Runs BB84 over `key_length` raw positions.
///
/// Entropy is consumed in a fixed order: sender bits, sender bases, receiver
/// bases, then one bit per mismatched-basis measurement in index order. A
/// scripted source therefore reproduces a run exactly.
///
/// # Errors
///
/// `InvalidKeyLength` when `key_length` is zero, before any entropy is drawn.
pub fn run<E: EntropySource + ?Sized>(
    key_length: usize,
    entropy: &mut E,
) -> Result<Session, QkdError> {
    if key_length == 0 {
        return Err(QkdError::InvalidKeyLength(key_length));
    }

    // Alice
    let sender_bits = entropy.generate_bits(key_length)?;
    let sender_bases = draw_bases(entropy, key_length)?;
    debug!(key_length, "sender material generated");

    let qubits: Vec<QubitState> = sender_bits
        .iter()
        .zip(&sender_bases)
        .map(|(&bit, &basis)| prepare(bit, basis))
        .collect();

    // Bob
    let receiver_bases = draw_bases(entropy, key_length)?;
    let receiver_results = qubits
        .into_iter()
        .zip(&receiver_bases)
        .map(|(qubit, &basis)| qubit.measure(basis, &mut *entropy))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(key_length, "receiver measurements complete");

    let shared_key = sift(&sender_bits, &sender_bases, &receiver_bases);
    info!(
        raw_length = key_length,
        sifted_length = shared_key.len(),
        "BB84 run complete"
    );

    Ok(Session {
        key_length,
        sender_bits,
        sender_bases,
        receiver_bases,
        receiver_results,
        shared_key,
    })
}

/// Runs BB84 with the entropy source and key length described by `config`.
pub fn run_with_config(config: &QkdConfig) -> Result<Session, QkdError> {
    config.validate()?;
    let mut entropy = config.entropy.build(config.seed)?;
    run(config.key_length, &mut entropy)
}

/// A BB84 endpoint that owns its entropy source across runs.
#[derive(Debug)]
pub struct Bb84<E> {
    entropy: E,
}

impl<E: EntropySource> Bb84<E> {
    pub fn new(entropy: E) -> Self {
        Self { entropy }
    }

    pub fn run(&mut self, key_length: usize) -> Result<Session, QkdError> {
        run(key_length, &mut self.entropy)
    }
}
