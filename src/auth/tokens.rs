use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use crate::config::JwtConfig;
use crate::state::AppState;

/// Expired tokens map to a different user remediation than malformed or
/// forged ones ("link expired, request a new one" vs re-login), so the
/// two outcomes stay separate variants.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub session_ttl: Duration,
    pub reset_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            session_ttl_minutes,
            reset_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            session_ttl: Duration::from_secs((session_ttl_minutes as u64) * 60),
            reset_ttl: Duration::from_secs((reset_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    /// Mint a token for `user_id` expiring at now + ttl. CPU-only, never
    /// touches storage.
    pub fn sign_with_ttl(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        ttl: TimeDuration,
    ) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + ttl;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token =
            encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Signing)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_session(&self, user_id: Uuid) -> Result<String, TokenError> {
        let ttl = TimeDuration::seconds(self.session_ttl.as_secs() as i64);
        self.sign_with_ttl(user_id, TokenKind::Session, ttl)
    }

    pub fn sign_reset(&self, user_id: Uuid) -> Result<String, TokenError> {
        let ttl = TimeDuration::seconds(self.reset_ttl.as_secs() as i64);
        self.sign_with_ttl(user_id, TokenKind::Reset, ttl)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.into_kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_session(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Session {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    pub fn verify_reset(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Reset {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[test]
    fn sign_and_verify_session_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_session(user_id).expect("sign session");
        let claims = keys.verify_session(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Session);
    }

    #[test]
    fn sign_and_verify_reset_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_reset(user_id).expect("sign reset");
        let claims = keys.verify_reset(&token).expect("verify reset");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.kind, TokenKind::Reset);
    }

    #[test]
    fn verify_reset_rejects_session_token() {
        let keys = make_keys();
        let token = keys.sign_session(Uuid::new_v4()).expect("sign session");
        let err = keys.verify_reset(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn verify_session_rejects_reset_token() {
        let keys = make_keys();
        let token = keys.sign_reset(Uuid::new_v4()).expect("sign reset");
        let err = keys.verify_session(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let keys = make_keys();
        // Past the default validation leeway.
        let token = keys
            .sign_with_ttl(Uuid::new_v4(), TokenKind::Session, TimeDuration::minutes(-5))
            .expect("sign");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn tampered_token_is_invalid_not_expired() {
        let keys = make_keys();
        let token = keys.sign_session(Uuid::new_v4()).expect("sign session");
        let mut tampered = token.clone();
        // Flip a payload character; the signature no longer matches.
        let mid = token.len() / 2;
        tampered.replace_range(mid..mid + 1, if &token[mid..mid + 1] == "a" { "b" } else { "a" });
        let err = keys.verify(&tampered).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let keys = make_keys();
        let err = keys.verify("not-even-a-jwt").unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let keys = make_keys();
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            issuer: keys.issuer.clone(),
            audience: keys.audience.clone(),
            session_ttl: keys.session_ttl,
            reset_ttl: keys.reset_ttl,
        };
        let token = other.sign_session(Uuid::new_v4()).expect("sign");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }
}
