use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purpose of a signed token: session authentication or password reset.
/// Both kinds share the signing mechanism but differ in TTL, and neither
/// is accepted where the other is required.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Session")]
    Session,
    #[serde(alias = "Reset")]
    Reset,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // user ID
    pub iat: usize,      // issued at (unix timestamp)
    pub exp: usize,      // expires at (unix timestamp)
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // token purpose
}
