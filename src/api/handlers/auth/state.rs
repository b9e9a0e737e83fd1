//! Auth configuration and shared handler state.

use std::sync::Arc;

use super::rate_limit::RateLimiter;
use crate::api::email::Messenger;
use crate::token::TokenSigner;

const DEFAULT_OTP_TTL_SECONDS: i64 = 5 * 60;
const DEFAULT_OTP_MAX_ATTEMPTS: i64 = 5;
const DEFAULT_OTP_ISSUE_WINDOW_SECONDS: i64 = 5 * 60;
const DEFAULT_OTP_ISSUE_LIMIT: i64 = 3;

pub(super) const ACCESS_COOKIE_NAME: &str = "labgate_access";
pub(super) const REFRESH_COOKIE_NAME: &str = "labgate_refresh";

/// Auth behavior knobs. Token lifetimes live on the `TokenSigner`, which is
/// the single source of truth for `exp` and the reported `expires_in`.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    otp_ttl_seconds: i64,
    otp_max_attempts: i64,
    otp_issue_window_seconds: i64,
    otp_issue_limit: i64,
    cookie_domain: Option<String>,
    cookie_same_site: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
            otp_max_attempts: DEFAULT_OTP_MAX_ATTEMPTS,
            otp_issue_window_seconds: DEFAULT_OTP_ISSUE_WINDOW_SECONDS,
            otp_issue_limit: DEFAULT_OTP_ISSUE_LIMIT,
            cookie_domain: None,
            cookie_same_site: "Lax".to_string(),
        }
    }

    #[must_use]
    pub fn with_otp_ttl_seconds(mut self, seconds: i64) -> Self {
        self.otp_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_otp_max_attempts(mut self, max_attempts: i64) -> Self {
        self.otp_max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_otp_issue_limit(mut self, limit: i64) -> Self {
        self.otp_issue_limit = limit;
        self
    }

    #[must_use]
    pub fn with_otp_issue_window_seconds(mut self, seconds: i64) -> Self {
        self.otp_issue_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_domain(mut self, domain: Option<String>) -> Self {
        self.cookie_domain = domain;
        self
    }

    #[must_use]
    pub fn with_cookie_same_site(mut self, same_site: String) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(super) fn otp_ttl_seconds(&self) -> i64 {
        self.otp_ttl_seconds
    }

    pub(super) fn otp_max_attempts(&self) -> i64 {
        self.otp_max_attempts
    }

    pub(super) fn otp_issue_window_seconds(&self) -> i64 {
        self.otp_issue_window_seconds
    }

    pub(super) fn otp_issue_limit(&self) -> i64 {
        self.otp_issue_limit
    }

    pub(super) fn cookie_domain(&self) -> Option<&str> {
        self.cookie_domain.as_deref()
    }

    pub(super) fn cookie_same_site(&self) -> &str {
        &self.cookie_same_site
    }

    pub(super) fn cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    signer: TokenSigner,
    ip_limiter: Arc<dyn RateLimiter>,
    user_limiter: Arc<dyn RateLimiter>,
    messenger: Arc<dyn Messenger>,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        signer: TokenSigner,
        ip_limiter: Arc<dyn RateLimiter>,
        user_limiter: Arc<dyn RateLimiter>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            config,
            signer,
            ip_limiter,
            user_limiter,
            messenger,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub(super) fn ip_limiter(&self) -> &dyn RateLimiter {
        self.ip_limiter.as_ref()
    }

    pub(super) fn user_limiter(&self) -> &dyn RateLimiter {
        self.user_limiter.as_ref()
    }

    pub(super) fn messenger(&self) -> &dyn Messenger {
        self.messenger.as_ref()
    }
}
