//! Session lifecycle endpoints: refresh rotation, logout, and introspection.
//!
//! Refresh rotation is atomic per token id: the presented token is revoked
//! with a conditional update and the replacement is stored in the same
//! transaction, so concurrent calls with the same raw value produce exactly
//! one winner. Reuse of an already-rotated token is treated as a theft
//! signal and surfaces to the client exactly like an expired session.

use anyhow::{anyhow, Context, Result};
use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use super::errors::AuthError;
use super::refresh_store::{self, RefreshTokenError, RefreshTokenRecord};
use super::state::{AuthState, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME};
use super::storage::{self, UserRecord};
use super::types::{LogoutResponse, ProfileResponse, RefreshRequest, TokenPairResponse};
use crate::token::{Claims, IssuedToken, TokenUse};

#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = TokenPairResponse),
        (status = 401, description = "Refresh token rejected, cookies cleared", body = String)
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    match rotate(&headers, &pool.0, &auth_state, payload).await {
        Ok((cookies, tokens)) => (StatusCode::OK, cookies, Json(tokens)).into_response(),
        Err(err @ AuthError::Internal(_)) => {
            error!("refresh failed: {err:#}");
            err.into_response()
        }
        // Any auth failure forces re-login, so clear both cookies.
        Err(err) => (
            err.status(),
            clear_token_cookies(&auth_state),
            err.public_message().to_string(),
        )
            .into_response(),
    }
}

async fn rotate(
    headers: &HeaderMap,
    backend: &impl SessionBackend,
    state: &AuthState,
    payload: Option<Json<RefreshRequest>>,
) -> Result<(HeaderMap, TokenPairResponse), AuthError> {
    let raw = extract_refresh_token(headers, payload).ok_or(AuthError::TokenMalformed)?;
    let claims = state
        .signer()
        .verify_refresh_token(&raw, Utc::now().timestamp())?;
    let jti = refresh_token_id(&claims)?;

    // The subject's live version gates every use of an outstanding token.
    let user = backend
        .find_user(&claims.sub)
        .await?
        .ok_or(AuthError::TokenVersionMismatch)?;
    if user.token_version != claims.token_version()? {
        return Err(AuthError::TokenVersionMismatch);
    }

    let record = match backend.validate_refresh(jti, &raw).await {
        Ok(record) => record,
        Err(RefreshTokenError::IntegrityMismatch) => {
            warn!(%jti, "refresh token digest mismatch, id presented without its secret");
            return Err(AuthError::RefreshTokenIntegrityFailure);
        }
        Err(err) => return Err(err.into()),
    };
    if record.user_id != user.id {
        warn!(%jti, "refresh token subject does not own the stored record");
        return Err(AuthError::RefreshTokenIntegrityFailure);
    }

    let (access, refresh) = issue_token_pair(state, &user)?;
    let new_id = refresh
        .id
        .ok_or_else(|| AuthError::Internal(anyhow!("refresh token issued without an id")))?;
    if !backend
        .rotate_refresh(record.id, new_id, user.id, &refresh.value, refresh.expires_at)
        .await?
    {
        warn!(%jti, user_id = %user.id, "refresh token already rotated, possible replay");
        return Err(AuthError::RefreshTokenRevoked);
    }

    let cookies = token_cookies(state, &access, &refresh)?;
    Ok((cookies, token_pair_response(state, &access, &refresh)))
}

/// Storage operations rotation needs, behind a trait so the replay and
/// version-gate paths are testable without a database.
pub(super) trait SessionBackend {
    async fn find_user(&self, identifier: &str) -> Result<Option<UserRecord>>;

    async fn validate_refresh(
        &self,
        id: Uuid,
        raw: &str,
    ) -> Result<RefreshTokenRecord, RefreshTokenError>;

    /// Revoke `old` and persist the replacement in one atomic step. A
    /// `false` result means `old` was already revoked, the replay signal.
    async fn rotate_refresh(
        &self,
        old: Uuid,
        new_id: Uuid,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool>;
}

impl SessionBackend for PgPool {
    async fn find_user(&self, identifier: &str) -> Result<Option<UserRecord>> {
        storage::find_user(self, identifier).await
    }

    async fn validate_refresh(
        &self,
        id: Uuid,
        raw: &str,
    ) -> Result<RefreshTokenRecord, RefreshTokenError> {
        refresh_store::validate(self, id, raw).await
    }

    // Revoke-then-insert in one transaction: either the old token is revoked
    // and the new one stored, or neither changes.
    async fn rotate_refresh(
        &self,
        old: Uuid,
        new_id: Uuid,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut tx = self
            .begin()
            .await
            .context("failed to start rotation transaction")?;
        if !refresh_store::revoke(&mut tx, old).await? {
            let _ = tx.rollback().await;
            return Ok(false);
        }
        refresh_store::create(&mut tx, new_id, user_id, token, expires_at).await?;
        tx.commit()
            .await
            .context("failed to commit rotation transaction")?;
        Ok(true)
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Session ended, cookies cleared", body = LogoutResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    // Best effort: invalidate whatever the presented tokens identify, then
    // clear cookies no matter what.
    let now = Utc::now().timestamp();
    let access_claims = extract_access_token(&headers).and_then(|token| {
        auth_state
            .signer()
            .verify(&token, TokenUse::Access, now, true)
            .ok()
    });
    let refresh_claims = extract_refresh_token(&headers, payload).and_then(|token| {
        auth_state
            .signer()
            .verify(&token, TokenUse::Refresh, now, true)
            .ok()
    });

    let subject = access_claims
        .as_ref()
        .or(refresh_claims.as_ref())
        .map(|claims| claims.sub.clone());
    if let Some(subject) = subject {
        match storage::find_user(&pool, &subject).await {
            Ok(Some(user)) => {
                if let Err(err) = storage::bump_token_version(&pool, user.id).await {
                    error!("failed to bump token version on logout: {err:#}");
                }
            }
            Ok(None) => {}
            Err(err) => error!("failed to look up user on logout: {err:#}"),
        }
    }

    if let Some(jti) = refresh_claims.as_ref().and_then(|claims| {
        claims
            .jti
            .as_deref()
            .and_then(|jti| Uuid::parse_str(jti).ok())
    }) {
        match pool.acquire().await {
            Ok(mut conn) => {
                if let Err(err) = refresh_store::revoke(&mut conn, jti).await {
                    error!("failed to revoke refresh token on logout: {err:#}");
                }
            }
            Err(err) => error!("failed to acquire connection on logout: {err:#}"),
        }
    }

    (
        StatusCode::OK,
        clear_token_cookies(&auth_state),
        Json(LogoutResponse {
            message: "Signed out".to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = ProfileResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    // Missing or invalid tokens are "no session"; no auth state is leaked.
    let Some(token) = extract_access_token(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };
    let Ok(claims) = auth_state
        .signer()
        .verify_access_token(&token, Utc::now().timestamp())
    else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match storage::find_user(&pool, &claims.sub).await {
        Ok(Some(user))
            if claims
                .token_version()
                .is_ok_and(|version| version == user.token_version) =>
        {
            (StatusCode::OK, Json(profile(&user))).into_response()
        }
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("failed to look up session user: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(super) fn profile(user: &UserRecord) -> ProfileResponse {
    ProfileResponse {
        user_id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
    }
}

/// Sign a fresh access/refresh pair carrying the user's live token version.
pub(super) fn issue_token_pair(
    state: &AuthState,
    user: &UserRecord,
) -> Result<(IssuedToken, IssuedToken), AuthError> {
    let access = state
        .signer()
        .issue_access_token(&user.username, user.token_version)?;
    let refresh = state
        .signer()
        .issue_refresh_token(&user.username, user.token_version)?;
    Ok((access, refresh))
}

pub(super) fn token_pair_response(
    state: &AuthState,
    access: &IssuedToken,
    refresh: &IssuedToken,
) -> TokenPairResponse {
    TokenPairResponse {
        access_token: access.value.clone(),
        refresh_token: refresh.value.clone(),
        token_type: "Bearer".to_string(),
        // The signer owns the TTLs, so `expires_in` always matches `exp`.
        expires_in: state.signer().access_ttl_seconds(),
    }
}

fn refresh_token_id(claims: &Claims) -> Result<Uuid, AuthError> {
    claims
        .jti
        .as_deref()
        .and_then(|jti| Uuid::parse_str(jti).ok())
        .ok_or(AuthError::TokenMalformed)
}

/// Build both `Set-Cookie` headers for a freshly issued token pair.
pub(super) fn token_cookies(
    state: &AuthState,
    access: &IssuedToken,
    refresh: &IssuedToken,
) -> Result<HeaderMap, AuthError> {
    let now = Utc::now();
    let access_age = (access.expires_at - now).num_seconds().max(0);
    let refresh_age = (refresh.expires_at - now).num_seconds().max(0);

    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        build_cookie(state, ACCESS_COOKIE_NAME, &access.value, access_age)
            .context("failed to build access cookie")?,
    );
    headers.append(
        SET_COOKIE,
        build_cookie(state, REFRESH_COOKIE_NAME, &refresh.value, refresh_age)
            .context("failed to build refresh cookie")?,
    );
    Ok(headers)
}

/// Expire both cookies. Infallible so logout can always clear them.
pub(super) fn clear_token_cookies(state: &AuthState) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in [ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME] {
        if let Ok(cookie) = build_cookie(state, name, "", 0) {
            headers.append(SET_COOKIE, cookie);
        }
    }
    headers
}

fn build_cookie(
    state: &AuthState,
    name: &str,
    value: &str,
    max_age: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let config = state.config();
    let same_site = config.cookie_same_site();
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite={same_site}; Max-Age={max_age}");
    if let Some(domain) = config.cookie_domain() {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    // Only mark cookies secure when the frontend is served over HTTPS.
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Access tokens arrive as a bearer header or the access cookie.
pub(super) fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    extract_bearer_token(headers).or_else(|| extract_cookie(headers, ACCESS_COOKIE_NAME))
}

/// Refresh tokens arrive as the refresh cookie or an explicit body field.
fn extract_refresh_token(headers: &HeaderMap, payload: Option<Json<RefreshRequest>>) -> Option<String> {
    extract_cookie(headers, REFRESH_COOKIE_NAME)
        .or_else(|| payload.and_then(|Json(request)| request.refresh_token))
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::test_support::{auth_state, auth_state_with_frontend};
    use crate::api::handlers::auth::utils::{digests_match, hash_refresh_token};
    use anyhow::Result;
    use sqlx::postgres::PgPoolOptions;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).expect("cookie header"));
        headers
    }

    struct StoredToken {
        user_id: Uuid,
        token_hash: Vec<u8>,
        expires_at: DateTime<Utc>,
        revoked: bool,
    }

    /// Single-user in-memory backend mirroring the store's semantics so
    /// rotation paths run without a database.
    struct MemoryBackend {
        user: Mutex<UserRecord>,
        tokens: Mutex<HashMap<Uuid, StoredToken>>,
    }

    impl MemoryBackend {
        fn new(user: UserRecord) -> Self {
            Self {
                user: Mutex::new(user),
                tokens: Mutex::new(HashMap::new()),
            }
        }

        fn insert_token(&self, id: Uuid, user_id: Uuid, value: &str, expires_at: DateTime<Utc>) {
            self.tokens.lock().unwrap().insert(
                id,
                StoredToken {
                    user_id,
                    token_hash: hash_refresh_token(value),
                    expires_at,
                    revoked: false,
                },
            );
        }

        fn bump_version(&self) {
            self.user.lock().unwrap().token_version += 1;
        }
    }

    impl SessionBackend for MemoryBackend {
        async fn find_user(&self, identifier: &str) -> Result<Option<UserRecord>> {
            let user = self.user.lock().unwrap().clone();
            Ok((user.username == identifier || user.email == identifier).then_some(user))
        }

        async fn validate_refresh(
            &self,
            id: Uuid,
            raw: &str,
        ) -> Result<RefreshTokenRecord, RefreshTokenError> {
            let tokens = self.tokens.lock().unwrap();
            let stored = tokens.get(&id).ok_or(RefreshTokenError::NotFound)?;
            if stored.revoked {
                return Err(RefreshTokenError::Revoked);
            }
            if stored.expires_at <= Utc::now() {
                return Err(RefreshTokenError::Expired);
            }
            if !digests_match(&stored.token_hash, &hash_refresh_token(raw)) {
                return Err(RefreshTokenError::IntegrityMismatch);
            }
            Ok(RefreshTokenRecord {
                id,
                user_id: stored.user_id,
            })
        }

        async fn rotate_refresh(
            &self,
            old: Uuid,
            new_id: Uuid,
            user_id: Uuid,
            token: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<bool> {
            let mut tokens = self.tokens.lock().unwrap();
            match tokens.get_mut(&old) {
                Some(stored) if !stored.revoked => stored.revoked = true,
                _ => return Ok(false),
            }
            tokens.insert(
                new_id,
                StoredToken {
                    user_id,
                    token_hash: hash_refresh_token(token),
                    expires_at,
                    revoked: false,
                },
            );
            Ok(true)
        }
    }

    fn test_user() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@lab.example".to_string(),
            password_hash: String::new(),
            token_version: 1,
        }
    }

    /// Issue a refresh token for `user`, store it in the backend, and return
    /// headers presenting it as the refresh cookie.
    fn seeded_refresh(
        state: &AuthState,
        backend: &MemoryBackend,
        user: &UserRecord,
    ) -> Result<HeaderMap> {
        let refresh = state
            .signer()
            .issue_refresh_token(&user.username, user.token_version)?;
        let id = refresh.id.context("refresh token issued without an id")?;
        backend.insert_token(id, user.id, &refresh.value, refresh.expires_at);
        Ok(cookie_headers(&format!(
            "{REFRESH_COOKIE_NAME}={}",
            refresh.value
        )))
    }

    #[test]
    fn build_cookie_carries_configured_attributes() -> Result<()> {
        let state = auth_state_with_frontend("https://lab.example.com");
        let cookie = build_cookie(&state, ACCESS_COOKIE_NAME, "value", 900)?;
        let cookie = cookie.to_str()?;
        assert!(cookie.starts_with("labgate_access=value; "));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=900"));
        assert!(cookie.contains("Secure"));
        Ok(())
    }

    #[test]
    fn build_cookie_skips_secure_for_plain_http() -> Result<()> {
        let state = auth_state_with_frontend("http://localhost:5173");
        let cookie = build_cookie(&state, REFRESH_COOKIE_NAME, "value", 60)?;
        assert!(!cookie.to_str()?.contains("Secure"));
        Ok(())
    }

    #[test]
    fn clear_token_cookies_expires_both() {
        let state = auth_state();
        let headers = clear_token_cookies(&state);
        let cookies: Vec<_> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|cookie| cookie.contains("Max-Age=0")));
        assert!(cookies.iter().any(|c| c.starts_with("labgate_access=")));
        assert!(cookies.iter().any(|c| c.starts_with("labgate_refresh=")));
    }

    #[test]
    fn extract_access_token_prefers_bearer_over_cookie() {
        let mut headers = cookie_headers("labgate_access=from-cookie");
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(
            extract_access_token(&headers),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn extract_refresh_token_prefers_cookie_over_body() {
        let headers = cookie_headers("labgate_refresh=from-cookie; other=x");
        let payload = Some(Json(RefreshRequest {
            refresh_token: Some("from-body".to_string()),
        }));
        assert_eq!(
            extract_refresh_token(&headers, payload),
            Some("from-cookie".to_string())
        );

        let payload = Some(Json(RefreshRequest {
            refresh_token: Some("from-body".to_string()),
        }));
        assert_eq!(
            extract_refresh_token(&HeaderMap::new(), payload),
            Some("from-body".to_string())
        );
    }

    #[tokio::test]
    async fn rotated_token_cannot_be_reused() -> Result<()> {
        let state = auth_state();
        let user = test_user();
        let backend = MemoryBackend::new(user.clone());
        let headers = seeded_refresh(&state, &backend, &user)?;

        let (_, first) = rotate(&headers, &backend, &state, None)
            .await
            .expect("first rotation succeeds");

        // Presenting the rotated token again is the replay signal.
        let err = rotate(&headers, &backend, &state, None)
            .await
            .expect_err("replay must be rejected");
        assert!(matches!(err, AuthError::RefreshTokenRevoked));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            err.public_message(),
            AuthError::TokenExpired.public_message()
        );

        // The replacement issued by the winning rotation still works.
        let headers = cookie_headers(&format!("{REFRESH_COOKIE_NAME}={}", first.refresh_token));
        rotate(&headers, &backend, &state, None)
            .await
            .expect("replacement token rotates");
        Ok(())
    }

    #[tokio::test]
    async fn tokens_minted_before_version_bump_are_rejected() -> Result<()> {
        let state = auth_state();
        let user = test_user();
        let backend = MemoryBackend::new(user.clone());
        let headers = seeded_refresh(&state, &backend, &user)?;

        backend.bump_version();

        let err = rotate(&headers, &backend, &state, None)
            .await
            .expect_err("stale version must be rejected");
        assert!(matches!(err, AuthError::TokenVersionMismatch));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn rotate_refresh_revokes_exactly_once() -> Result<()> {
        let user = test_user();
        let backend = MemoryBackend::new(user.clone());
        let old = Uuid::new_v4();
        let expires_at = Utc::now() + chrono::Duration::hours(1);
        backend.insert_token(old, user.id, "stale", expires_at);

        assert!(
            backend
                .rotate_refresh(old, Uuid::new_v4(), user.id, "next", expires_at)
                .await?
        );
        // Second revocation of the same id must lose, not error.
        assert!(
            !backend
                .rotate_refresh(old, Uuid::new_v4(), user.id, "other", expires_at)
                .await?
        );
        Ok(())
    }

    #[test]
    fn token_pair_expires_in_matches_signer_ttl() -> Result<()> {
        let state = auth_state();
        let user = test_user();
        let (access, refresh) = issue_token_pair(&state, &user)?;
        let response = token_pair_response(&state, &access, &refresh);
        assert_eq!(response.expires_in, crate::token::DEFAULT_ACCESS_TTL_SECONDS);
        let until_expiry = (access.expires_at - Utc::now()).num_seconds();
        assert!((response.expires_in - until_expiry).abs() <= 2);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_without_token_is_unauthorized_and_clears_cookies() -> Result<()> {
        let pool = lazy_pool()?;
        let response = refresh(
            HeaderMap::new(),
            Extension(pool),
            Extension(auth_state()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(SET_COOKIE));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_with_garbage_token_is_unauthorized() -> Result<()> {
        let pool = lazy_pool()?;
        let headers = cookie_headers("labgate_refresh=not-a-token");
        let response = refresh(headers, Extension(pool), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn session_without_token_is_no_content() -> Result<()> {
        let pool = lazy_pool()?;
        let response = session(HeaderMap::new(), Extension(pool), Extension(auth_state()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        Ok(())
    }

    #[tokio::test]
    async fn session_with_garbage_token_is_no_content() -> Result<()> {
        let pool = lazy_pool()?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer garbage"));
        let response = session(headers, Extension(pool), Extension(auth_state()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        Ok(())
    }

    #[tokio::test]
    async fn logout_without_tokens_still_clears_cookies() -> Result<()> {
        let pool = lazy_pool()?;
        let response = logout(
            HeaderMap::new(),
            Extension(pool),
            Extension(auth_state()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|cookie| cookie.contains("Max-Age=0")));
        Ok(())
    }
}
