//! Database helpers for the user directory.
//!
//! The auth subsystem only reads user rows and increments `token_version`;
//! everything else about users is owned by the platform services. The bump
//! is a single conditional-free `UPDATE ... RETURNING` so it stays atomic
//! with respect to concurrent refresh and logout on the same user.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

/// Fields of a user row the auth flows need.
#[derive(Debug, Clone)]
pub(super) struct UserRecord {
    pub(super) id: Uuid,
    pub(super) username: String,
    pub(super) email: String,
    pub(super) password_hash: String,
    pub(super) token_version: i64,
}

/// Look a user up by username or email, both unique.
pub(super) async fn find_user(pool: &PgPool, identifier: &str) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, username, email, password_hash, token_version
        FROM users
        WHERE username = $1 OR email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(identifier)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up user")?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        token_version: row.get("token_version"),
    }))
}

/// Increment `token_version` by exactly one, invalidating every outstanding
/// token for the user without enumerating them. Returns the new version.
pub(super) async fn bump_token_version(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let query = r"
        UPDATE users
        SET token_version = token_version + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING token_version
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to bump token version")?;

    Ok(row.get("token_version"))
}
