//! Authentication and session-lifecycle handlers.
//!
//! The login flow is a small state machine: a correct password authorizes a
//! one-time code, a correct code mints the token pair, and every failure
//! path drops back to the start without granting anything. Tokens carry the
//! user's `token_version`; bumping the counter on logout invalidates every
//! outstanding token at once without tracking them individually.
//!
//! Refresh tokens are single use. `/v1/auth/refresh` rotates the presented
//! token atomically, and reuse of an already-rotated token is logged as a
//! theft signal while surfacing to the client like any expired session.

mod errors;
pub(crate) mod login;
mod otp;
mod rate_limit;
mod refresh_store;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod types;
mod utils;

pub use rate_limit::{NoopRateLimiter, RateLimiter, TokenBucketLimiter};
pub use state::{AuthConfig, AuthState};

#[cfg(test)]
pub(crate) mod test_support;
