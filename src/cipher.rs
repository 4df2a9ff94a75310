//! XOR cipher keyed by a sifted QKD key.
//!
//! Messages are expanded to bits (8 bits per character, most significant bit
//! first), XORed against the key repeated to the message length, and the
//! inverse regroups recovered bits into 8-bit characters. Reusing the key
//! across the message makes this a demonstration cipher only.

use crate::errors::CipherError;
use serde::Serialize;
use tracing::warn;

/// Anything that can stand for one key bit: `bool`, the integers `0`/`1` or
/// the characters `'0'`/`'1'`.
pub trait BitLike {
    fn to_bit(&self) -> Result<bool, CipherError>;
}

impl BitLike for bool {
    fn to_bit(&self) -> Result<bool, CipherError> {
        Ok(*self)
    }
}

impl BitLike for char {
    fn to_bit(&self) -> Result<bool, CipherError> {
        match *self {
            '0' => Ok(false),
            '1' => Ok(true),
            other => Err(CipherError::InvalidBit(other.to_string())),
        }
    }
}

macro_rules! int_bit_like {
    ($($t:ty),*) => {
        $(impl BitLike for $t {
            fn to_bit(&self) -> Result<bool, CipherError> {
                match *self {
                    0 => Ok(false),
                    1 => Ok(true),
                    other => Err(CipherError::InvalidBit(other.to_string())),
                }
            }
        })*
    };
}

int_bit_like!(u8, u32, u64, i32, i64);

/// Plaintext handed to [`encrypt`].
///
/// Integer messages are limited to 64 bits. Wider values have to be sent as
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message<'a> {
    Text(&'a str),
    Integer(u64),
}

impl<'a> From<&'a str> for Message<'a> {
    fn from(text: &'a str) -> Self {
        Message::Text(text)
    }
}

impl<'a> From<&'a String> for Message<'a> {
    fn from(text: &'a String) -> Self {
        Message::Text(text)
    }
}

impl From<u64> for Message<'_> {
    fn from(value: u64) -> Self {
        Message::Integer(value)
    }
}

/// Result of [`decrypt`]: text when the bits regroup into characters,
/// otherwise the recovered bits themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Plaintext {
    Text(String),
    Bits(Vec<bool>),
}

impl Plaintext {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Plaintext::Text(text) => Some(text.as_str()),
            Plaintext::Bits(_) => None,
        }
    }
}

/// Pushes the low `width` bits of `value`, most significant first.
fn push_bits(out: &mut Vec<bool>, value: u64, width: u32) {
    out.extend((0..width).rev().map(|shift| (value >> shift) & 1 == 1));
}

/// Bit expansion of a message.
///
/// Each character contributes its code point, at least 8 bits wide. Code
/// points above 255 keep their full width and will not survive [`decrypt`].
/// Integers use their minimal binary form, `0` being a single zero bit.
pub fn message_bits(message: Message<'_>) -> Vec<bool> {
    let mut bits = Vec::new();
    match message {
        Message::Text(text) => {
            bits.reserve(text.len() * 8);
            for c in text.chars() {
                let code = u32::from(c);
                let width = (u32::BITS - code.leading_zeros()).max(8);
                push_bits(&mut bits, u64::from(code), width);
            }
        }
        Message::Integer(value) => {
            let width = (u64::BITS - value.leading_zeros()).max(1);
            push_bits(&mut bits, value, width);
        }
    }
    bits
}

fn key_bits<K: BitLike>(key: &[K]) -> Result<Vec<bool>, CipherError> {
    if key.is_empty() {
        return Err(CipherError::EmptyKey);
    }
    key.iter().map(BitLike::to_bit).collect()
}

/// XORs `bits` against `key` repeated end to end and cut to `bits.len()`.
fn xor_with_key(bits: &[bool], key: &[bool]) -> Vec<bool> {
    bits.iter()
        .zip(key.iter().cycle())
        .map(|(&bit, &k)| bit ^ k)
        .collect()
}

/// Encrypts `message` under `key`. The output has one bit per message bit.
///
/// # Errors
///
/// `EmptyKey` for a zero-length key, `InvalidBit` for a key element that is
/// not a bit.
pub fn encrypt<'a, K: BitLike>(
    message: impl Into<Message<'a>>,
    key: &[K],
) -> Result<Vec<bool>, CipherError> {
    let key = key_bits(key)?;
    Ok(xor_with_key(&message_bits(message.into()), &key))
}

/// Groups bits into bytes and reads each byte as a character. A trailing
/// partial byte is dropped.
pub fn bits_to_text(bits: &[bool]) -> Option<String> {
    bits.chunks_exact(8)
        .map(|byte| {
            let code = byte.iter().fold(0u32, |acc, &bit| (acc << 1) | u32::from(bit));
            char::from_u32(code)
        })
        .collect()
}

/// Reverses [`encrypt`].
///
/// Falls back to [`Plaintext::Bits`] when the recovered bits cannot be read
/// back as characters.
pub fn decrypt<K: BitLike>(bits: &[bool], key: &[K]) -> Result<Plaintext, CipherError> {
    let key = key_bits(key)?;
    let recovered = xor_with_key(bits, &key);

    match bits_to_text(&recovered) {
        Some(text) => Ok(Plaintext::Text(text)),
        None => {
            warn!(bits = recovered.len(), "could not rebuild text, returning raw bits");
            Ok(Plaintext::Bits(recovered))
        }
    }
}

/// Parses a string of `'0'`/`'1'` characters.
pub fn parse_bits(s: &str) -> Result<Vec<bool>, CipherError> {
    s.chars().map(|c| c.to_bit()).collect()
}

/// Renders bits as a string of `'0'`/`'1'` characters.
pub fn format_bits(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}
