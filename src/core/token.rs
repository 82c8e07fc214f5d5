use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::TokenClaims;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("could not sign token: {0}")]
    Encoding(String),
}

/// Verified identity carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub user_id: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies HS256 bearer tokens with the process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue(
        &self,
        user_id: &str,
        role: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims {
            sub: user_id.to_string(),
            role: role.to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Issues the access/refresh pair handed out at login.
    pub fn issue_pair(&self, user_id: &str, role: &str) -> Result<AuthTokens, TokenError> {
        let now = Utc::now();
        let expiry = |ttl: Duration| {
            now.checked_add_signed(ttl)
                .ok_or_else(|| TokenError::Encoding(format!("expiry overflows: now + {ttl}")))
        };
        Ok(AuthTokens {
            access_token: self.issue(user_id, role, expiry(self.access_ttl)?)?,
            refresh_token: self.issue(user_id, role, expiry(self.refresh_ttl)?)?,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Subject, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Signature and structure are checked first; a token is only valid
    /// strictly before its `exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Subject, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                kind => {
                    debug!("Token rejected: {:?}", kind);
                    TokenError::InvalidSignature
                }
            })?
            .claims;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(Subject {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, Duration::minutes(30), Duration::days(30))
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("test_secret");
        let token = tokens
            .issue("u1", "user", Utc::now() + Duration::days(30))
            .unwrap();

        assert_eq!(token.split('.').count(), 3);
        let subject = tokens.verify(&token).unwrap();
        assert_eq!(subject.user_id, "u1");
        assert_eq!(subject.role, "user");
    }

    #[test]
    fn test_expired_token() {
        let tokens = service("test_secret");
        let token = tokens
            .issue("u1", "user", Utc::now() - Duration::seconds(10))
            .unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_expires_at_exp() {
        let tokens = service("test_secret");
        let expires_at = Utc::now() + Duration::minutes(5);
        let token = tokens.issue("u1", "admin", expires_at).unwrap();

        let before = expires_at - Duration::seconds(1);
        assert!(tokens.verify_at(&token, before).is_ok());
        assert_eq!(tokens.verify_at(&token, expires_at), Err(TokenError::Expired));
        assert_eq!(
            tokens.verify_at(&token, expires_at + Duration::hours(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_wrong_secret() {
        let token = service("secret1")
            .issue("u1", "user", Utc::now() + Duration::hours(1))
            .unwrap();
        assert_eq!(
            service("secret2").verify(&token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_any_tampered_character_is_rejected() {
        let tokens = service("test_secret");
        let token = tokens
            .issue("u1", "user", Utc::now() + Duration::hours(1))
            .unwrap();

        for (i, c) in token.char_indices() {
            let replacement = if c == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + c.len_utf8(), &replacement.to_string());
            assert_eq!(
                tokens.verify(&tampered),
                Err(TokenError::InvalidSignature),
                "tampering position {i} must not verify"
            );
        }
    }

    #[test]
    fn test_tampered_expired_token_is_invalid_not_expired() {
        let tokens = service("test_secret");
        let token = tokens
            .issue("u1", "user", Utc::now() - Duration::hours(1))
            .unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert_eq!(tokens.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let tokens = service("test_secret");
        for garbage in ["", "invalid_token", "a.b.c", "...."] {
            assert_eq!(tokens.verify(garbage), Err(TokenError::InvalidSignature));
        }
    }

    #[test]
    fn test_issue_pair_windows() {
        let tokens = TokenService::new("test_secret", Duration::minutes(30), Duration::days(7));
        let pair = tokens.issue_pair("u1", "user").unwrap();

        let now = Utc::now();
        assert!(tokens.verify(&pair.access_token).is_ok());
        assert_eq!(
            tokens.verify_at(&pair.access_token, now + Duration::minutes(31)),
            Err(TokenError::Expired)
        );
        assert!(tokens
            .verify_at(&pair.refresh_token, now + Duration::days(6))
            .is_ok());
        assert_eq!(
            tokens.verify_at(&pair.refresh_token, now + Duration::days(8)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_issue_pair_overflowing_window_is_an_error() {
        let huge = Duration::try_days(100_000_000).unwrap();
        let tokens = TokenService::new("test_secret", Duration::minutes(30), huge);
        assert!(matches!(
            tokens.issue_pair("u1", "user"),
            Err(TokenError::Encoding(_))
        ));
    }
}
