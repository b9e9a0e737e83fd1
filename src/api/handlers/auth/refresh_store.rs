//! Persistence for refresh tokens, keyed by the signed token's `jti`.
//!
//! Only a SHA-256 digest of the token is stored. Rotation revokes the old
//! record and inserts the replacement inside one transaction; the revoke is
//! a conditional update so a replayed token cannot rotate twice.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Row};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use super::utils::{digests_match, hash_refresh_token};

#[derive(Debug, Error)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token revoked")]
    Revoked,
    #[error("refresh token expired")]
    Expired,
    #[error("refresh token digest mismatch")]
    IntegrityMismatch,
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

#[derive(Debug)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
}

/// Insert a record for a freshly issued refresh token.
pub(super) async fn create(
    conn: &mut PgConnection,
    id: Uuid,
    user_id: Uuid,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    let query = r"
        INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
        VALUES ($1, $2, $3, $4)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .bind(user_id)
        .bind(hash_refresh_token(token))
        .bind(expires_at)
        .execute(conn)
        .instrument(span)
        .await
        .context("failed to store refresh token")?;
    Ok(())
}

/// Check a presented token against its stored record. The signature on the
/// token is verified by the caller before this runs; this guards the
/// server-side state the signature cannot carry.
pub(super) async fn validate(
    pool: &PgPool,
    id: Uuid,
    token: &str,
) -> Result<RefreshTokenRecord, RefreshTokenError> {
    let query = r"
        SELECT id, user_id, token_hash, expires_at, revoked
        FROM refresh_tokens
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to load refresh token")?
        .ok_or(RefreshTokenError::NotFound)?;

    let revoked: bool = row.get("revoked");
    if revoked {
        return Err(RefreshTokenError::Revoked);
    }
    let expires_at: DateTime<Utc> = row.get("expires_at");
    if expires_at <= Utc::now() {
        return Err(RefreshTokenError::Expired);
    }
    let stored: Vec<u8> = row.get("token_hash");
    if !digests_match(&hash_refresh_token(token), &stored) {
        return Err(RefreshTokenError::IntegrityMismatch);
    }

    Ok(RefreshTokenRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
    })
}

/// Revoke a record, returning whether this call flipped it. A `false`
/// result during rotation means another caller got there first, which is
/// the replay signal.
pub(super) async fn revoke(conn: &mut PgConnection, id: Uuid) -> Result<bool> {
    let query = "UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1 AND revoked = FALSE";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .execute(conn)
        .instrument(span)
        .await
        .context("failed to revoke refresh token")?;
    Ok(result.rows_affected() > 0)
}
