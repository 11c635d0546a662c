//! Config-code string generation.
//!
//! A code is `{TAG}-{YYYYMMDD}-{suffix}` where the suffix is
//! [`CODE_SUFFIX_BYTES`] bytes of OS randomness rendered as lowercase hex.
//! The full 128 bits are kept; nothing is truncated. The suffix is a lookup
//! key, not key material.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// Random bytes per code suffix.
pub const CODE_SUFFIX_BYTES: usize = 16;

/// Build a new code string for `tag` issued on `date_stamp` (`YYYYMMDD`).
pub fn generate_code(tag: &str, date_stamp: &str) -> Result<String, CryptoError> {
    let mut suffix = [0u8; CODE_SUFFIX_BYTES];
    OsRng
        .try_fill_bytes(&mut suffix)
        .map_err(|e| CryptoError::RandomnessUnavailable(e.to_string()))?;
    Ok(format!("{tag}-{date_stamp}-{}", hex::encode(suffix)))
}
