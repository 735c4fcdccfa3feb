use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Auth flow failures with their user-facing message.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required request field is absent or empty.
    #[error("{0}")]
    MissingField(&'static str),

    #[error("Invalid email")]
    InvalidEmail,

    #[error("User already exists")]
    DuplicateUser,

    /// Unknown email and wrong password share this variant so the two
    /// cases stay indistinguishable to the caller.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No token carrier on the request at all.
    #[error("No access token provided")]
    Unauthenticated,

    /// Carried token failed verification.
    #[error("Could not validate credentials")]
    InvalidSession,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("store error")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingField(_)
            | AuthError::InvalidEmail
            | AuthError::DuplicateUser
            | AuthError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::Unauthenticated
            | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Store(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Unexpected faults get logged with their cause and rendered with a
        // fixed message; the cause never reaches the client.
        let message = match &self {
            AuthError::Store(e) => {
                error!(error = %e, "credential store failure");
                "Internal server error".to_string()
            }
            AuthError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_message(err: AuthError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, value["message"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn statuses_follow_the_taxonomy() {
        assert_eq!(
            AuthError::MissingField("Email is required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::DuplicateUser.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::InvalidOrExpiredToken.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn internal_errors_render_a_fixed_message() {
        let (status, message) =
            body_message(AuthError::Internal(anyhow::anyhow!("smtp handshake: secret detail")))
                .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }

    #[tokio::test]
    async fn validation_errors_render_their_message() {
        let (status, message) =
            body_message(AuthError::MissingField("Email and password are required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Email and password are required");
    }
}
