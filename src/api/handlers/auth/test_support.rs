//! Shared fixtures for handler tests.

use std::sync::Arc;
use std::time::Duration;

use super::rate_limit::{NoopRateLimiter, TokenBucketLimiter};
use super::state::{AuthConfig, AuthState};
use crate::api::email::LogMessenger;
use crate::token::{TokenSigner, TEST_PRIVATE_KEY_PEM};

fn test_signer() -> TokenSigner {
    TokenSigner::from_private_key(
        TEST_PRIVATE_KEY_PEM.as_bytes(),
        "k1",
        "https://labgate.example.test",
        "labgate",
        crate::token::DEFAULT_ACCESS_TTL_SECONDS,
        crate::token::DEFAULT_REFRESH_TTL_SECONDS,
    )
    .expect("test key must parse")
}

/// State with no-op limiters, suitable for everything but rate-limit paths.
pub(crate) fn auth_state() -> Arc<AuthState> {
    auth_state_with_frontend("http://localhost:5173")
}

pub(crate) fn auth_state_with_frontend(frontend_base_url: &str) -> Arc<AuthState> {
    Arc::new(AuthState::new(
        AuthConfig::new(frontend_base_url.to_string()),
        test_signer(),
        Arc::new(NoopRateLimiter),
        Arc::new(NoopRateLimiter),
        Arc::new(LogMessenger),
    ))
}

/// State whose buckets deny every request, for short-circuit tests.
pub(crate) fn auth_state_with_zero_capacity() -> Arc<AuthState> {
    Arc::new(AuthState::new(
        AuthConfig::new("http://localhost:5173".to_string()),
        test_signer(),
        Arc::new(TokenBucketLimiter::new(0, 0, Duration::from_secs(60))),
        Arc::new(TokenBucketLimiter::new(0, 0, Duration::from_secs(60))),
        Arc::new(LogMessenger),
    ))
}
