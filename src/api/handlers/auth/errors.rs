//! Error taxonomy for the authentication flows.
//!
//! Client-visible messages stay generic: credential failures never reveal
//! whether the account exists, and token-integrity failures surface exactly
//! like an expired session. The precise variant is logged server-side.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::otp::OtpError;
use super::refresh_store::RefreshTokenError;
use crate::token;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("rate limited")]
    RateLimited,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("one-time code not found")]
    OtpNotFound,
    #[error("one-time code expired")]
    OtpExpired,
    #[error("one-time code attempts exceeded")]
    OtpAttemptsExceeded,
    #[error("one-time code already used")]
    OtpAlreadyUsed,
    #[error("one-time code mismatch")]
    OtpMismatch,
    #[error("token expired")]
    TokenExpired,
    #[error("token malformed")]
    TokenMalformed,
    #[error("token version mismatch")]
    TokenVersionMismatch,
    #[error("refresh token revoked")]
    RefreshTokenRevoked,
    #[error("refresh token integrity failure")]
    RefreshTokenIntegrityFailure,
    #[error("failed to send one-time code")]
    MessengerFailure,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidCredentials
            | Self::OtpNotFound
            | Self::OtpExpired
            | Self::OtpAttemptsExceeded
            | Self::OtpAlreadyUsed
            | Self::OtpMismatch
            | Self::TokenExpired
            | Self::TokenMalformed
            | Self::TokenVersionMismatch
            | Self::RefreshTokenRevoked
            | Self::RefreshTokenIntegrityFailure => StatusCode::UNAUTHORIZED,
            Self::MessengerFailure => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the client sees. Deliberately coarser than the variant.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::RateLimited => "Too many requests",
            Self::InvalidCredentials => "Incorrect username or password",
            Self::OtpNotFound | Self::OtpExpired | Self::OtpMismatch => {
                "Invalid or expired verification code"
            }
            Self::OtpAttemptsExceeded => "Too many verification attempts, request a new code",
            Self::OtpAlreadyUsed => "Verification code already used, request a new code",
            // Revoked/integrity failures are indistinguishable from expiry on
            // the wire so a token thief learns nothing from the response.
            Self::TokenExpired
            | Self::TokenMalformed
            | Self::TokenVersionMismatch
            | Self::RefreshTokenRevoked
            | Self::RefreshTokenIntegrityFailure => "Session expired, sign in again",
            Self::MessengerFailure => "Failed to send verification code, retry",
            Self::Internal(_) => "Internal error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message().to_string()).into_response()
    }
}

impl From<OtpError> for AuthError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::NotFound => Self::OtpNotFound,
            OtpError::Expired => Self::OtpExpired,
            OtpError::AttemptsExceeded => Self::OtpAttemptsExceeded,
            OtpError::AlreadyUsed => Self::OtpAlreadyUsed,
            OtpError::Mismatch => Self::OtpMismatch,
            OtpError::Db(err) => Self::Internal(err),
        }
    }
}

impl From<RefreshTokenError> for AuthError {
    fn from(err: RefreshTokenError) -> Self {
        match err {
            RefreshTokenError::NotFound | RefreshTokenError::Revoked => Self::RefreshTokenRevoked,
            RefreshTokenError::Expired => Self::TokenExpired,
            RefreshTokenError::IntegrityMismatch => Self::RefreshTokenIntegrityFailure,
            RefreshTokenError::Db(err) => Self::Internal(err),
        }
    }
}

impl From<token::Error> for AuthError {
    fn from(err: token::Error) -> Self {
        if err.is_expired() {
            Self::TokenExpired
        } else {
            Self::TokenMalformed
        }
    }
}
