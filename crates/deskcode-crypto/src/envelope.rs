//! Symmetric envelope encryption.
//!
//! A single shared secret string is hashed with SHA-256 into a 256-bit
//! ChaCha20-Poly1305 key. Every [`seal`] draws a fresh random nonce and
//! prepends it to the authenticated ciphertext, so the output is
//! self-describing and [`open`] needs nothing but the secret.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Nonce size for ChaCha20-Poly1305.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Derive the 32-byte cipher key from the shared secret.
fn derive_key(secret: &str) -> Zeroizing<[u8; 32]> {
    let digest = Sha256::digest(secret.as_bytes());
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&digest);
    key
}

fn cipher_for(secret: &str) -> ChaCha20Poly1305 {
    let key = derive_key(secret);
    ChaCha20Poly1305::new(Key::from_slice(key.as_slice()))
}

/// Encrypt and authenticate `plaintext` under `secret`.
///
/// Output layout: `[12-byte nonce][ciphertext][16-byte tag]`. No associated
/// data is bound.
pub fn seal(plaintext: &[u8], secret: &str) -> Result<Vec<u8>, CryptoError> {
    let cipher = cipher_for(secret);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| CryptoError::RandomnessUnavailable(e.to_string()))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Reverse [`seal`].
///
/// Fails with `TruncatedInput` when `data` cannot even hold a nonce, and with
/// `AuthenticationFailed` for every other rejection (wrong secret, corrupted
/// or tampered bytes, missing tag).
pub fn open(data: &[u8], secret: &str) -> Result<Vec<u8>, CryptoError> {
    if data.len() < NONCE_SIZE {
        return Err(CryptoError::TruncatedInput {
            expected: NONCE_SIZE,
            actual: data.len(),
        });
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let cipher = cipher_for(secret);
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "shared-envelope-secret";

    #[test]
    fn seal_open_roundtrip() {
        let plaintext = br#"{"id_server":"s1","relay_server":"r1","key":"k1"}"#;
        let sealed = seal(plaintext, SECRET).unwrap();
        assert_eq!(open(&sealed, SECRET).unwrap(), plaintext);
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let sealed = seal(b"", SECRET).unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + TAG_SIZE);
        assert!(open(&sealed, SECRET).unwrap().is_empty());
    }

    #[test]
    fn output_is_nonce_prefixed() {
        let plaintext = b"payload";
        let sealed = seal(plaintext, SECRET).unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
    }

    #[test]
    fn wrong_secret_fails_authentication() {
        let sealed = seal(b"secret data", SECRET).unwrap();
        let result = open(&sealed, "another-secret");
        assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let mut sealed = seal(b"secret data", SECRET).unwrap();
        sealed[NONCE_SIZE] ^= 0xFF;
        assert!(matches!(
            open(&sealed, SECRET),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn tampered_nonce_fails_authentication() {
        let mut sealed = seal(b"secret data", SECRET).unwrap();
        sealed[0] ^= 0x01;
        assert!(matches!(
            open(&sealed, SECRET),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn nonce_only_input_fails_authentication() {
        // Long enough for a nonce but carries no tag.
        let result = open(&[0u8; NONCE_SIZE], SECRET);
        assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
    }

    #[test]
    fn short_input_is_truncated() {
        let result = open(&[1, 2, 3], SECRET);
        assert!(matches!(
            result,
            Err(CryptoError::TruncatedInput {
                expected: NONCE_SIZE,
                actual: 3
            })
        ));
    }

    #[test]
    fn nonces_never_repeat() {
        let mut nonces = std::collections::HashSet::new();
        for _ in 0..1000 {
            let sealed = seal(b"x", SECRET).unwrap();
            let nonce: [u8; NONCE_SIZE] = sealed[..NONCE_SIZE].try_into().unwrap();
            assert!(nonces.insert(nonce), "nonce collision detected");
        }
    }

    #[test]
    fn same_plaintext_seals_differently() {
        let a = seal(b"same", SECRET).unwrap();
        let b = seal(b"same", SECRET).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn key_derivation_is_deterministic() {
        assert_eq!(*derive_key("abc"), *derive_key("abc"));
        assert_ne!(*derive_key("abc"), *derive_key("abd"));
    }
}
