//! Engine error types.

use deskcode_crypto::CryptoError;

use crate::storage::DatabaseError;

/// Failures surfaced by [`ConfigCodeEngine`](super::ConfigCodeEngine).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A code or profile does not exist, or a code is disabled.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config code has expired")]
    Expired,

    #[error("Config code usage limit exceeded")]
    UsageLimitExceeded,

    /// The linked profile is missing or disabled.
    #[error("Server profile is unavailable")]
    ProfileUnavailable,

    #[error("Server profile is still referenced by {0} config code(s)")]
    ProfileInUse(i64),

    #[error("Envelope authentication failed")]
    AuthenticationFailed,

    #[error("Envelope is truncated")]
    TruncatedInput,

    /// Every generation attempt collided with an existing code.
    #[error("Code generation gave up after {0} attempts")]
    GenerationExhausted(u32),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Structurally broken code text or payload.
    #[error("Invalid code")]
    InvalidCode,

    /// Encryption or randomness failure on our side.
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Store error: {0}")]
    Store(DatabaseError),
}

impl EngineError {
    /// Failures that must reach callers only as a generic "invalid code".
    pub const fn is_crypto_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed | Self::TruncatedInput | Self::InvalidCode
        )
    }
}

impl From<DatabaseError> for EngineError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(what) => Self::NotFound(what),
            other => Self::Store(other),
        }
    }
}

impl From<CryptoError> for EngineError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::TruncatedInput { .. } => Self::TruncatedInput,
            CryptoError::AuthenticationFailed => Self::AuthenticationFailed,
            CryptoError::InvalidEncoding(_) => Self::InvalidCode,
            CryptoError::EncryptionFailed(msg) | CryptoError::RandomnessUnavailable(msg) => {
                Self::Crypto(msg)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
