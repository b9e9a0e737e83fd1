//! Password login and one-time-code verification endpoints.
//!
//! Login never grants tokens: a correct password only authorizes issuing a
//! one-time code. Tokens are minted in `verify_otp` once the code checks
//! out. Rate limits run before any password work so brute force is cheap to
//! reject, and credential failures are uniform whether or not the account
//! exists.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::errors::AuthError;
use super::otp;
use super::session::{issue_token_pair, profile, token_cookies, token_pair_response};
use super::state::AuthState;
use super::storage;
use super::types::{LoginRequest, LoginResponse, VerifyOtpRequest, VerifyOtpResponse};
use super::utils::{burn_password_verification, extract_client_ip, normalize_email, valid_email, verify_password};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Verification code sent", body = LoginResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 401, description = "Incorrect username or password", body = String),
        (status = 429, description = "Rate limited", body = String),
        (status = 503, description = "Code delivery failed, retry", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match handle_login(&headers, &pool, &auth_state, &request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            if let AuthError::Internal(ref cause) = err {
                error!("login failed: {cause:#}");
            }
            err.into_response()
        }
    }
}

async fn handle_login(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
    request: &LoginRequest,
) -> Result<LoginResponse, AuthError> {
    // Bucket checks come first: a denied request costs no password hashing
    // and leaks nothing about whether the account exists.
    if let Some(ip) = extract_client_ip(headers) {
        if !state.ip_limiter().admit(&ip) {
            return Err(AuthError::RateLimited);
        }
    }
    let identifier = request.username.trim().to_lowercase();
    if !state.user_limiter().admit(&identifier) {
        return Err(AuthError::RateLimited);
    }

    let user = match storage::find_user(pool, &identifier).await? {
        Some(user) => user,
        None => {
            // Unknown accounts still pay for a full verification.
            burn_password_verification(&request.password);
            return Err(AuthError::InvalidCredentials);
        }
    };
    if !verify_password(&user.password_hash, &request.password) {
        return Err(AuthError::InvalidCredentials);
    }

    // Durable per-email ceiling, counted from persisted rows so it holds
    // across restarts and multiple instances.
    if otp::is_rate_limited(pool, &user.email, state.config()).await? {
        return Err(AuthError::RateLimited);
    }

    let (otp_id, code) = otp::issue(pool, &user.email, state.config()).await?;
    let body = format!(
        "Your verification code is {code}. It expires in {} minutes.",
        state.config().otp_ttl_seconds() / 60
    );
    if let Err(err) = state
        .messenger()
        .send(&user.email, "Your verification code", &body)
    {
        error!("failed to send verification code: {err:#}");
        // Burn the record so nothing suggests a code was delivered.
        if let Err(err) = otp::invalidate(pool, otp_id).await {
            error!("failed to invalidate undelivered code: {err:#}");
        }
        return Err(AuthError::MessengerFailure);
    }

    Ok(LoginResponse {
        message: "Verification code sent".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/v1/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Tokens issued", body = VerifyOtpResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 401, description = "Code rejected", body = String),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };
    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    match handle_verify_otp(&headers, &pool, &auth_state, &email, &request.otp).await {
        Ok(response) => response,
        Err(err) => {
            if let AuthError::Internal(ref cause) = err {
                error!("otp verification failed: {cause:#}");
            }
            err.into_response()
        }
    }
}

async fn handle_verify_otp(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
    email: &str,
    code: &str,
) -> Result<axum::response::Response, AuthError> {
    if let Some(ip) = extract_client_ip(headers) {
        if !state.ip_limiter().admit(&ip) {
            return Err(AuthError::RateLimited);
        }
    }

    otp::verify(pool, email, code, state.config()).await?;

    let user = storage::find_user(pool, email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let (access, refresh) = issue_token_pair(state, &user)?;
    let refresh_id = refresh.id.ok_or_else(|| {
        AuthError::Internal(anyhow::anyhow!("refresh token issued without an id"))
    })?;
    let mut conn = pool
        .acquire()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;
    super::refresh_store::create(&mut conn, refresh_id, user.id, &refresh.value, refresh.expires_at)
        .await?;

    let cookies = token_cookies(state, &access, &refresh)?;
    let response = VerifyOtpResponse {
        profile: profile(&user),
        tokens: token_pair_response(state, &access, &refresh),
    };
    Ok((StatusCode::OK, cookies, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::test_support::{auth_state, auth_state_with_zero_capacity};
    use anyhow::Result;
    use axum::http::HeaderValue;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    #[tokio::test]
    async fn login_missing_payload_is_bad_request() -> Result<()> {
        let pool = lazy_pool()?;
        let response = login(
            HeaderMap::new(),
            Extension(pool),
            Extension(auth_state()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn login_denied_by_ip_bucket_before_any_password_work() -> Result<()> {
        let pool = lazy_pool()?;
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.5"));
        // Zero-capacity buckets deny immediately; the lazy pool would fail
        // loudly if the handler reached the database.
        let response = login(
            headers,
            Extension(pool),
            Extension(auth_state_with_zero_capacity()),
            Some(Json(LoginRequest {
                username: "alice".to_string(),
                password: "hunter2hunter2".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        Ok(())
    }

    #[tokio::test]
    async fn login_denied_by_user_bucket_without_client_ip() -> Result<()> {
        let pool = lazy_pool()?;
        let response = login(
            HeaderMap::new(),
            Extension(pool),
            Extension(auth_state_with_zero_capacity()),
            Some(Json(LoginRequest {
                username: "alice".to_string(),
                password: "hunter2hunter2".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        Ok(())
    }

    #[tokio::test]
    async fn verify_otp_missing_payload_is_bad_request() -> Result<()> {
        let pool = lazy_pool()?;
        let response = verify_otp(
            HeaderMap::new(),
            Extension(pool),
            Extension(auth_state()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn verify_otp_rejects_invalid_email() -> Result<()> {
        let pool = lazy_pool()?;
        let response = verify_otp(
            HeaderMap::new(),
            Extension(pool),
            Extension(auth_state()),
            Some(Json(VerifyOtpRequest {
                email: "not-an-email".to_string(),
                otp: "4821".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn verify_otp_denied_by_ip_bucket() -> Result<()> {
        let pool = lazy_pool()?;
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.5"));
        let response = verify_otp(
            headers,
            Extension(pool),
            Extension(auth_state_with_zero_capacity()),
            Some(Json(VerifyOtpRequest {
                email: "alice@lab.example".to_string(),
                otp: "4821".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        Ok(())
    }
}
