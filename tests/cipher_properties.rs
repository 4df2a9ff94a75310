//! Property-based tests for the key-derived cipher.
//!
//! Messages are drawn from characters 0..=255 so every character fits the
//! 8-bit groups decryption reads back.

use bb84_cipher::cipher::{message_bits, parse_bits};
use bb84_cipher::errors::CipherError;
use bb84_cipher::{Plaintext, decrypt, encrypt};
use proptest::prelude::*;

fn latin1_text() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<u8>(), 0..200)
        .prop_map(|bytes| bytes.into_iter().map(char::from).collect())
}

fn key() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 1..80)
}

proptest! {
    /// Property: decrypt(encrypt(m, k), k) == m
    #[test]
    fn prop_text_round_trip(message in latin1_text(), key in key()) {
        let encrypted = encrypt(&message, &key).unwrap();
        let decrypted = decrypt(&encrypted, &key).unwrap();
        prop_assert_eq!(decrypted, Plaintext::Text(message));
    }

    /// Property: ciphertext has exactly one bit per message bit
    #[test]
    fn prop_length_preserved(message in latin1_text(), key in key()) {
        let encrypted = encrypt(&message, &key).unwrap();
        prop_assert_eq!(encrypted.len(), message.chars().count() * 8);
    }

    /// Property: XOR with the repeated key, position by position
    #[test]
    fn prop_matches_repeated_key_xor(message in latin1_text(), key in key()) {
        let plain = message_bits(message.as_str().into());
        let encrypted = encrypt(&message, &key).unwrap();
        for (i, (&c, &p)) in encrypted.iter().zip(&plain).enumerate() {
            prop_assert_eq!(c, p ^ key[i % key.len()]);
        }
    }

    /// Property: trailing bits that do not fill a byte are dropped
    #[test]
    fn prop_partial_byte_dropped(
        message in latin1_text(),
        extra in prop::collection::vec(any::<bool>(), 1..8),
        key in key(),
    ) {
        let mut encrypted = encrypt(&message, &key).unwrap();
        encrypted.extend(extra);
        let decrypted = decrypt(&encrypted, &key).unwrap();
        prop_assert_eq!(decrypted, Plaintext::Text(message));
    }

    /// Property: integers encrypt to their minimal binary width, deterministically
    #[test]
    fn prop_integer_width(value in any::<u64>(), key in key()) {
        let encrypted = encrypt(value, &key).unwrap();
        let width = (64 - value.leading_zeros()).max(1) as usize;
        prop_assert_eq!(encrypted.len(), width);

        let again = encrypt(value, &key).unwrap();
        prop_assert_eq!(encrypted, again);
    }

    /// Property: '0'/'1' keys behave like the bools they spell
    #[test]
    fn prop_string_keys_match_bool_keys(message in latin1_text(), key in key()) {
        let spelled: String = key.iter().map(|&b| if b { '1' } else { '0' }).collect();
        let chars: Vec<char> = spelled.chars().collect();
        prop_assert_eq!(
            encrypt(&message, &chars).unwrap(),
            encrypt(&message, &parse_bits(&spelled).unwrap()).unwrap()
        );
        prop_assert_eq!(
            encrypt(&message, &chars).unwrap(),
            encrypt(&message, &key).unwrap()
        );
    }
}

#[test]
fn empty_key_never_encrypts() {
    let key: Vec<bool> = Vec::new();
    assert_eq!(encrypt("payment", &key), Err(CipherError::EmptyKey));
    assert_eq!(encrypt(42u64, &key), Err(CipherError::EmptyKey));
}
