//! `DeskCode` crypto library
//!
//! Primitives behind config codes:
//!
//! - **Envelope**: SHA-256(secret) → 256-bit key, ChaCha20-Poly1305 AEAD,
//!   fresh random 12-byte nonce per call, output `nonce ‖ ciphertext ‖ tag`
//! - **Code strings**: `{TAG}-{YYYYMMDD}-{32 hex chars}` lookup keys carrying
//!   128 bits of OS randomness
//! - **Offline framing**: `{TAG}-{id}-{YYYYMMDD}-{base64url(envelope)}` for
//!   self-contained codes decrypted by holders of the shared secret

pub mod code;
pub mod envelope;
pub mod error;
pub mod offline;

pub use code::{CODE_SUFFIX_BYTES, generate_code};
pub use envelope::{NONCE_SIZE, TAG_SIZE, open, seal};
pub use error::CryptoError;
pub use offline::{OfflineCode, format_offline_code, parse_offline_code};
