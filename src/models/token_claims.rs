use serde::{Deserialize, Serialize};

/// Signed payload of every token.
///
/// `sub` carries the account id, the same value the user store is queried
/// with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}
