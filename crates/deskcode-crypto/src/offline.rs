//! Text framing for self-contained (offline) config codes.
//!
//! Layout: `{TAG}-{profile_id}-{YYYYMMDD}-{base64url(envelope)}`. The
//! Base64URL alphabet contains `-`, so parsing splits on the first three
//! dashes only.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;

use crate::error::CryptoError;

/// Parsed pieces of an offline code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineCode {
    pub profile_id: i64,
    pub date_stamp: String,
    /// Sealed envelope bytes (`nonce ‖ ciphertext ‖ tag`).
    pub envelope: Vec<u8>,
}

/// Render an offline code.
pub fn format_offline_code(tag: &str, profile_id: i64, date_stamp: &str, envelope: &[u8]) -> String {
    format!("{tag}-{profile_id}-{date_stamp}-{}", URL_SAFE.encode(envelope))
}

/// Split and decode an offline code. Does not decrypt.
pub fn parse_offline_code(code: &str, tag: &str) -> Result<OfflineCode, CryptoError> {
    let rest = code
        .strip_prefix(tag)
        .and_then(|r| r.strip_prefix('-'))
        .ok_or_else(|| CryptoError::InvalidEncoding("unexpected code prefix".to_string()))?;

    let mut parts = rest.splitn(3, '-');
    let (Some(id), Some(date), Some(blob)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CryptoError::InvalidEncoding(
            "offline code has too few segments".to_string(),
        ));
    };

    let profile_id = id
        .parse::<i64>()
        .map_err(|_| CryptoError::InvalidEncoding("profile id is not numeric".to_string()))?;
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CryptoError::InvalidEncoding(
            "date stamp must be YYYYMMDD".to_string(),
        ));
    }
    let envelope = URL_SAFE
        .decode(blob)
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;

    Ok(OfflineCode {
        profile_id,
        date_stamp: date.to_string(),
        envelope,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::envelope::{open, seal};

    #[test]
    fn frame_and_parse() {
        let envelope = seal(b"{\"k\":1}", "s").unwrap();
        let code = format_offline_code("KUST", 7, "20261018", &envelope);
        assert!(code.starts_with("KUST-7-20261018-"));

        let parsed = parse_offline_code(&code, "KUST").unwrap();
        assert_eq!(parsed.profile_id, 7);
        assert_eq!(parsed.date_stamp, "20261018");
        assert_eq!(open(&parsed.envelope, "s").unwrap(), b"{\"k\":1}");
    }

    #[test]
    fn blob_containing_dashes_survives() {
        // 0xfb 0xff encodes to "-_8=" in the URL-safe alphabet.
        let code = format_offline_code("KUST", 1, "20261018", &[0xfb, 0xff]);
        assert!(code.ends_with("-_8="));
        let parsed = parse_offline_code(&code, "KUST").unwrap();
        assert_eq!(parsed.envelope, vec![0xfb, 0xff]);
    }

    #[test]
    fn wrong_tag_rejected() {
        let code = format_offline_code("KUST", 1, "20261018", b"abc");
        assert!(matches!(
            parse_offline_code(&code, "ACME"),
            Err(CryptoError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn missing_segments_rejected() {
        assert!(parse_offline_code("KUST-1-20261018", "KUST").is_err());
        assert!(parse_offline_code("KUST-x-20261018-YWJj", "KUST").is_err());
        assert!(parse_offline_code("KUST-1-2026-YWJj", "KUST").is_err());
        assert!(parse_offline_code("KUST-1-20261018-***", "KUST").is_err());
    }
}
