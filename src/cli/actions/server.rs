use crate::{
    api,
    api::handlers::auth::{AuthConfig, AuthState, TokenBucketLimiter},
    cli::globals::GlobalArgs,
    token::TokenSigner,
};
use anyhow::{Context, Result};
use std::{fs, sync::Arc, time::Duration};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub signing_key_path: String,
    pub kid: String,
    pub issuer: String,
    pub audience: String,
    pub frontend_base_url: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub otp_ttl_seconds: i64,
    pub otp_max_attempts: i64,
    pub otp_issue_limit: i64,
    pub otp_issue_window_seconds: i64,
    pub ip_rate_limit_capacity: u32,
    pub ip_rate_limit_window_seconds: u64,
    pub user_rate_limit_capacity: u32,
    pub user_rate_limit_window_seconds: u64,
    pub cookie_domain: Option<String>,
    pub cookie_same_site: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the signing key cannot be loaded or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let key_bytes = fs::read(&args.signing_key_path)
        .with_context(|| format!("Failed to read signing key: {}", args.signing_key_path))?;
    let globals = GlobalArgs::new(key_bytes);

    debug!("Global args: {:?}", globals);

    // A key that does not parse is fatal at startup, never at request time.
    let signer = TokenSigner::from_private_key(
        globals.signing_key(),
        &args.kid,
        &args.issuer,
        &args.audience,
        args.access_ttl_seconds,
        args.refresh_ttl_seconds,
    )
    .context("Failed to load token signing key")?;

    let auth_config = AuthConfig::new(args.frontend_base_url)
        .with_otp_ttl_seconds(args.otp_ttl_seconds)
        .with_otp_max_attempts(args.otp_max_attempts)
        .with_otp_issue_limit(args.otp_issue_limit)
        .with_otp_issue_window_seconds(args.otp_issue_window_seconds)
        .with_cookie_domain(args.cookie_domain)
        .with_cookie_same_site(args.cookie_same_site);

    let ip_limiter = TokenBucketLimiter::new(
        args.ip_rate_limit_capacity,
        args.ip_rate_limit_capacity,
        Duration::from_secs(args.ip_rate_limit_window_seconds),
    );
    let user_limiter = TokenBucketLimiter::new(
        args.user_rate_limit_capacity,
        args.user_rate_limit_capacity,
        Duration::from_secs(args.user_rate_limit_window_seconds),
    );

    let auth_state = AuthState::new(
        auth_config,
        signer,
        Arc::new(ip_limiter),
        Arc::new(user_limiter),
        Arc::new(api::email::LogMessenger),
    );

    api::new(args.port, args.dsn, auth_state).await
}
