use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ForgetPasswordRequest, MeResponse, MessageResponse, ResetPasswordRequest,
            SigninRequest, SigninResponse, SignupRequest,
        },
        extractors::{CurrentUser, ACCESS_TOKEN_COOKIE},
        password::{hash_password, verify_password},
        tokens::JwtKeys,
    },
    error::AuthError,
    mail::Mailer,
    state::AppState,
    store::{NewUser, StoreError, UserStore},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/auth/forget_password", post(forget_password))
        .route("/auth/reset_with_token/:token", post(reset_with_token))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Login keys are normalized before any lookup so the same address always
/// hits the same record.
fn normalized_email(raw: Option<String>) -> Option<String> {
    raw.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty())
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.is_empty())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    let email = normalized_email(payload.email);
    let password = non_empty(payload.password);
    let (Some(email), Some(password)) = (email, password) else {
        warn!("signup with missing fields");
        return Err(AuthError::MissingField("Email and password are required"));
    };

    if !is_valid_email(&email) {
        warn!(email = %email, "signup with invalid email");
        return Err(AuthError::InvalidEmail);
    }

    if state.store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "signup for already registered email");
        return Err(AuthError::DuplicateUser);
    }

    let password_hash = hash_password(&password)?;
    let user = state
        .store
        .insert(NewUser {
            username: non_empty(payload.username),
            email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            // Lost the race against a concurrent signup for the same email.
            StoreError::Conflict => AuthError::DuplicateUser,
            other => AuthError::Store(other),
        })?;

    info!(user_id = %user.id, email = %user.email, "user created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully")),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SigninRequest>,
) -> Result<(CookieJar, Json<SigninResponse>), AuthError> {
    let email = normalized_email(payload.email);
    let password = non_empty(payload.password);
    let (Some(email), Some(password)) = (email, password) else {
        warn!("signin with missing fields");
        return Err(AuthError::MissingField("Email and password are required"));
    };

    // Unknown email and wrong password take the same exit.
    let user = match state.store.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "signin unknown email");
            return Err(AuthError::InvalidCredentials);
        }
    };
    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "signin invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys
        .sign_session(user.id)
        .map_err(|e| AuthError::Internal(e.into()))?;

    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        jar.add(cookie),
        Json(SigninResponse {
            message: "You are logged in successfully".into(),
            access_token: token,
        }),
    ))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse { user: user.into() })
}

pub async fn logout(
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    // Stateless tokens have no server-side revocation; logout only tells the
    // client to drop the cookie.
    let mut cookie = Cookie::from(ACCESS_TOKEN_COOKIE);
    cookie.set_path("/");

    info!(user_id = %user.id, "user logged out");
    (
        jar.remove(cookie),
        Json(MessageResponse::new("You are logged out successfully")),
    )
}

#[instrument(skip(state, payload))]
pub async fn forget_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgetPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Some(email) = normalized_email(payload.email) else {
        warn!("forget_password with missing email");
        return Err(AuthError::MissingField("Email is required"));
    };

    let user = state
        .store
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys
        .sign_reset(user.id)
        .map_err(|e| AuthError::Internal(e.into()))?;
    let reset_url = format!(
        "{}/auth/reset_with_token/{}",
        state.config.public_base_url.trim_end_matches('/'),
        token
    );

    // The token travels only in the mail body, never in the response.
    state
        .mailer
        .send(
            &user.email,
            "Password Reset Request",
            &format!("To reset your password, click the following link: {reset_url}"),
        )
        .await?;

    info!(user_id = %user.id, "password reset mail sent");
    Ok(Json(MessageResponse::new("Password reset email sent")))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_with_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Some(new_password) = non_empty(payload.new_password) else {
        warn!("reset_with_token with missing password");
        return Err(AuthError::MissingField("New password is required"));
    };

    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_reset(&token).map_err(|e| {
        warn!(error = %e, "reset token rejected");
        AuthError::InvalidOrExpiredToken
    })?;

    let password_hash = hash_password(&new_password)?;
    if !state.store.update_password(claims.sub, &password_hash).await? {
        return Err(AuthError::UserNotFound);
    }

    info!(user_id = %claims.sub, "password reset");
    Ok(Json(MessageResponse::new("Password reset successful")))
}
