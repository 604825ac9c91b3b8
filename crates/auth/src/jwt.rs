use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, Result};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (the user's UID, as a string)
    pub sub: String,
    /// User UID
    pub uid: u64,
    /// Username at the time of login
    pub username: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Token id, unique per issued token
    pub jti: String,
}

impl Claims {
    /// Create new claims for a user, valid for `expires_in_seconds` from now
    pub fn new(uid: u64, username: &str, expires_in_seconds: i64) -> Self {
        let now = Utc::now();
        let expiration = now + Duration::seconds(expires_in_seconds);

        Self {
            sub: uid.to_string(),
            uid,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Issues and verifies HS256-signed session tokens
///
/// The signing secret is loaded once at startup; the issuer holds no other
/// state.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in_seconds: i64,
}

impl TokenIssuer {
    /// Create an issuer
    ///
    /// # Arguments
    /// * `secret` - The secret key for signing tokens; must not be empty
    /// * `expires_in_seconds` - Token lifetime in seconds (e.g., 3600 for 1 hour)
    pub fn new(secret: &str, expires_in_seconds: i64) -> Result<Self> {
        if secret.is_empty() {
            return Err(AuthError::TokenGenerationError(
                "signing secret is empty".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in_seconds,
        })
    }

    pub fn expires_in_seconds(&self) -> i64 {
        self.expires_in_seconds
    }

    /// Sign a token carrying the user's UID and username
    pub fn issue(&self, uid: u64, username: &str) -> Result<String> {
        let claims = Claims::new(uid, username, self.expires_in_seconds);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Check a token's signature and expiry and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            },
        )?;

        let claims = token_data.claims;

        if claims.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation_and_validation() {
        let issuer = TokenIssuer::new("test_secret", 3600).unwrap();

        let token = issuer.issue(123_456_789, "alice").unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.uid, 123_456_789);
        assert_eq!(claims.sub, "123456789");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_invalid_secret() {
        let issuer = TokenIssuer::new("correct_secret", 3600).unwrap();
        let other = TokenIssuer::new("wrong_secret", 3600).unwrap();

        let token = issuer.issue(1, "alice").unwrap();
        let result = other.verify(&token);

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        // A token that expired one second before it was issued
        let issuer = TokenIssuer::new("test_secret", -1).unwrap();
        let token = issuer.issue(1, "alice").unwrap();

        std::thread::sleep(std::time::Duration::from_millis(100));

        assert!(matches!(issuer.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_garbage_and_tampered_tokens() {
        let issuer = TokenIssuer::new("test_secret", 3600).unwrap();
        assert!(matches!(issuer.verify("not.a.jwt"), Err(AuthError::InvalidToken)));
        assert!(matches!(issuer.verify(""), Err(AuthError::InvalidToken)));

        // Alice's header and claims under Mallory's signature
        let alice = issuer.issue(1, "alice").unwrap();
        let mallory = issuer.issue(2, "mallory").unwrap();
        let (alice_body, _) = alice.rsplit_once('.').unwrap();
        let (_, mallory_sig) = mallory.rsplit_once('.').unwrap();
        let forged = format!("{alice_body}.{mallory_sig}");
        assert!(matches!(issuer.verify(&forged), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_tokens_are_unique_per_issue() {
        let issuer = TokenIssuer::new("test_secret", 3600).unwrap();
        let first = issuer.issue(42, "alice").unwrap();
        let second = issuer.issue(42, "alice").unwrap();

        assert_ne!(first, second);
        assert_ne!(issuer.verify(&first).unwrap().jti, issuer.verify(&second).unwrap().jti);
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(matches!(
            TokenIssuer::new("", 3600),
            Err(AuthError::TokenGenerationError(_))
        ));
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(456, "bob", 3600);

        assert_eq!(claims.sub, "456");
        assert_eq!(claims.username, "bob");
        assert!(!claims.is_expired());
        assert!(claims.exp > claims.iat);
    }
}
