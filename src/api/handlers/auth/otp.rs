//! One-time-code issuance and verification backed by the `otp_codes` table.
//!
//! Codes are 4 random digits, stored only as a salted SHA-256 digest.
//! Issuing does not invalidate prior unused codes; verification always
//! targets the most recently created record for the email. Attempt counting
//! uses conditional updates so the ceiling holds under concurrent calls and
//! across multiple service instances.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use super::state::AuthConfig;
use super::utils::{digests_match, generate_otp_code, generate_otp_salt, hash_otp_code};

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("no one-time code on file")]
    NotFound,
    #[error("one-time code expired")]
    Expired,
    #[error("one-time code attempts exceeded")]
    AttemptsExceeded,
    #[error("one-time code already used")]
    AlreadyUsed,
    #[error("one-time code mismatch")]
    Mismatch,
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

/// Latest persisted code record for an email, newest first.
#[derive(Debug)]
struct OtpRecord {
    id: Uuid,
    code_salt: Vec<u8>,
    code_hash: Vec<u8>,
    attempts: i64,
    used: bool,
    expires_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Pre-checks in the order callers observe them: a used code stays
    /// "already used" even after it expires.
    fn rejection(&self, now: DateTime<Utc>, max_attempts: i64) -> Option<OtpError> {
        if self.used {
            Some(OtpError::AlreadyUsed)
        } else if self.expires_at <= now {
            Some(OtpError::Expired)
        } else if self.attempts >= max_attempts {
            Some(OtpError::AttemptsExceeded)
        } else {
            None
        }
    }
}

/// True when the email already hit the issuance ceiling inside the trailing
/// window. Counted from persisted rows so the limit survives restarts.
pub(super) async fn is_rate_limited(pool: &PgPool, email: &str, config: &AuthConfig) -> Result<bool> {
    let query = r"
        SELECT COUNT(*)
        FROM otp_codes
        WHERE email = $1
          AND created_at > NOW() - ($2 * INTERVAL '1 second')
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(config.otp_issue_window_seconds())
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to count recent one-time codes")?;
    let issued: i64 = row.get(0);
    Ok(issued >= config.otp_issue_limit())
}

/// Persist a fresh code record and return (record id, plaintext code) for
/// out-of-band delivery. Prior unused records are superseded, not deleted.
pub(super) async fn issue(pool: &PgPool, email: &str, config: &AuthConfig) -> Result<(Uuid, String)> {
    let code = generate_otp_code()?;
    let salt = generate_otp_salt()?;
    let code_hash = hash_otp_code(&salt, &code);

    let query = r"
        INSERT INTO otp_codes (email, code_salt, code_hash, expires_at)
        VALUES ($1, $2, $3, NOW() + ($4 * INTERVAL '1 second'))
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(salt.as_slice())
        .bind(&code_hash)
        .bind(config.otp_ttl_seconds())
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert one-time code")?;

    Ok((row.get("id"), code))
}

/// Mark a record used without a successful verification. Called when email
/// dispatch fails so no row suggests a code was delivered.
pub(super) async fn invalidate(pool: &PgPool, id: Uuid) -> Result<()> {
    let query = "UPDATE otp_codes SET used = TRUE WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to invalidate one-time code")?;
    Ok(())
}

/// Verify `code` against the latest record for `email`. Succeeds at most
/// once per record; every path that touches counters is a conditional
/// update, never read-then-write in application code.
pub(super) async fn verify(
    pool: &PgPool,
    email: &str,
    code: &str,
    config: &AuthConfig,
) -> Result<(), OtpError> {
    let max_attempts = config.otp_max_attempts();
    let record = load_latest(pool, email).await?.ok_or(OtpError::NotFound)?;
    if let Some(err) = record.rejection(Utc::now(), max_attempts) {
        return Err(err);
    }

    // Claim one attempt atomically; losing the race re-reads the contested
    // row by id, so a newer code issued meanwhile cannot change the outcome.
    if !claim_attempt(pool, record.id, max_attempts).await? {
        let contested = load(pool, record.id).await?;
        return Err(race_loss_error(contested, Utc::now(), max_attempts));
    }

    let presented = hash_otp_code(&record.code_salt, code);
    if !digests_match(&presented, &record.code_hash) {
        // The incremented attempt count is already persisted.
        return Err(OtpError::Mismatch);
    }

    // Exactly-once: only the first matching caller flips `used`.
    if consume(pool, record.id).await? {
        Ok(())
    } else {
        Err(OtpError::AlreadyUsed)
    }
}

/// Explain a lost `claim_attempt` race from the contested row's own state.
fn race_loss_error(record: Option<OtpRecord>, now: DateTime<Utc>, max_attempts: i64) -> OtpError {
    match record {
        None => OtpError::NotFound,
        Some(record) => record
            .rejection(now, max_attempts)
            .unwrap_or(OtpError::AttemptsExceeded),
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> OtpRecord {
    OtpRecord {
        id: row.get("id"),
        code_salt: row.get("code_salt"),
        code_hash: row.get("code_hash"),
        attempts: row.get("attempts"),
        used: row.get("used"),
        expires_at: row.get("expires_at"),
    }
}

async fn load_latest(pool: &PgPool, email: &str) -> Result<Option<OtpRecord>> {
    let query = r"
        SELECT id, code_salt, code_hash, attempts, used, expires_at
        FROM otp_codes
        WHERE email = $1
        ORDER BY created_at DESC
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to load one-time code")?;

    Ok(row.as_ref().map(record_from_row))
}

async fn load(pool: &PgPool, id: Uuid) -> Result<Option<OtpRecord>> {
    let query = r"
        SELECT id, code_salt, code_hash, attempts, used, expires_at
        FROM otp_codes
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
        .context("failed to load one-time code")?;

    Ok(row.as_ref().map(record_from_row))
}

async fn claim_attempt(pool: &PgPool, id: Uuid, max_attempts: i64) -> Result<bool> {
    let query = r"
        UPDATE otp_codes
        SET attempts = attempts + 1
        WHERE id = $1
          AND used = FALSE
          AND attempts < $2
          AND expires_at > NOW()
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .bind(max_attempts)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to record verification attempt")?;
    Ok(result.rows_affected() > 0)
}

async fn consume(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "UPDATE otp_codes SET used = TRUE WHERE id = $1 AND used = FALSE";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to consume one-time code")?;
    Ok(result.rows_affected() > 0)
}
