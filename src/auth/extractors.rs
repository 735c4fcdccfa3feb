use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::tokens::JwtKeys;
use crate::error::AuthError;
use crate::state::AppState;
use crate::store::{User, UserStore};

/// Cookie carrying the session token; http-only, set on signin and cleared
/// on logout.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Authenticated user for the request, resolved from whichever carrier the
/// client used (cookie first, then bearer header).
#[derive(Debug)]
pub struct CurrentUser(pub User);

/// Convert a carried token into the user it was issued for. Read-only:
/// verification then a store lookup, nothing mutated.
pub async fn resolve_session(state: &AppState, token: &str) -> Result<User, AuthError> {
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify_session(token).map_err(|e| {
        warn!(error = %e, "session token rejected");
        AuthError::InvalidSession
    })?;

    let user = state.store.find_by_id(claims.sub).await?;
    // A verified token whose subject no longer exists: account was deleted
    // after issuance.
    user.ok_or(AuthError::UserNotFound)
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(|t| t.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .or_else(|| bearer_token(parts));

        let Some(token) = token else {
            return Err(AuthError::Unauthenticated);
        };

        let user = resolve_session(state, &token).await?;
        Ok(CurrentUser(user))
    }
}
