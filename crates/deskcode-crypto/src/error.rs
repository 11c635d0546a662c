//! Crypto error types.

/// Errors from cryptographic operations.
///
/// `AuthenticationFailed` deliberately carries no detail: a wrong key and a
/// tampered ciphertext are indistinguishable to the caller.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Input too short: expected at least {expected} bytes, got {actual}")]
    TruncatedInput { expected: usize, actual: usize },

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Randomness unavailable: {0}")]
    RandomnessUnavailable(String),
}
