//! JWT token issuance and validation.

use deskcode_core::db::unix_timestamp;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

use super::claims::Claims;

/// Manages JWT token creation and validation.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    /// Create a new `JwtManager` with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue an access token for an admin, valid for `ttl_secs`.
    ///
    /// Returns the token and its expiry timestamp.
    pub fn issue_access_token(
        &self,
        admin_id: i64,
        username: &str,
        ttl_secs: i64,
    ) -> Result<(String, i64), jsonwebtoken::errors::Error> {
        let now = unix_timestamp();
        let exp = now + ttl_secs;

        let claims = Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: admin_id.to_string(),
            username: username.to_string(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok((token, exp))
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_jwt() -> JwtManager {
        JwtManager::new(b"test-secret-key-for-testing")
    }

    #[test]
    fn issue_and_validate_access_token() {
        let jwt = test_jwt();
        let (token, exp) = jwt.issue_access_token(7, "alice", 3600).unwrap();
        assert!(exp > unix_timestamp());

        let claims = jwt.validate(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "alice");

        let identity = claims.identity().unwrap();
        assert_eq!(identity.id, 7);
    }

    #[test]
    fn invalid_token_fails_validation() {
        let jwt = test_jwt();
        assert!(jwt.validate("not-a-valid-token").is_err());
    }

    #[test]
    fn wrong_secret_fails_validation() {
        let jwt1 = test_jwt();
        let jwt2 = JwtManager::new(b"different-secret");

        let (token, _) = jwt1.issue_access_token(1, "alice", 3600).unwrap();
        assert!(jwt2.validate(&token).is_err());
    }

    #[test]
    fn expired_token_fails_validation() {
        let jwt = test_jwt();
        // Beyond the default 60s leeway.
        let (token, _) = jwt.issue_access_token(1, "alice", -300).unwrap();
        assert!(jwt.validate(&token).is_err());
    }

    #[test]
    fn tokens_are_unique() {
        let jwt = test_jwt();
        let (a, _) = jwt.issue_access_token(1, "alice", 3600).unwrap();
        let (b, _) = jwt.issue_access_token(1, "alice", 3600).unwrap();
        assert_ne!(a, b);
    }
}
