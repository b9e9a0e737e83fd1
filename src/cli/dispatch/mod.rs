//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let signing_key_path = matches
        .get_one::<String>("signing-key")
        .cloned()
        .context("missing required argument: --signing-key")?;

    let get_string = |name: &str| -> Result<String> {
        matches
            .get_one::<String>(name)
            .cloned()
            .with_context(|| format!("missing required argument: --{name}"))
    };
    let get_i64 = |name: &str| -> Result<i64> {
        matches
            .get_one::<i64>(name)
            .copied()
            .with_context(|| format!("missing required argument: --{name}"))
    };

    Ok(Action::Server(Args {
        port,
        dsn,
        signing_key_path,
        kid: get_string("kid")?,
        issuer: get_string("issuer")?,
        audience: get_string("audience")?,
        frontend_base_url: get_string("frontend-base-url")?,
        access_ttl_seconds: get_i64("access-ttl-seconds")?,
        refresh_ttl_seconds: get_i64("refresh-ttl-seconds")?,
        otp_ttl_seconds: get_i64("otp-ttl-seconds")?,
        otp_max_attempts: get_i64("otp-max-attempts")?,
        otp_issue_limit: get_i64("otp-issue-limit")?,
        otp_issue_window_seconds: get_i64("otp-issue-window-seconds")?,
        ip_rate_limit_capacity: matches
            .get_one::<u32>("ip-rate-limit-capacity")
            .copied()
            .unwrap_or(5),
        ip_rate_limit_window_seconds: matches
            .get_one::<u64>("ip-rate-limit-window-seconds")
            .copied()
            .unwrap_or(60),
        user_rate_limit_capacity: matches
            .get_one::<u32>("user-rate-limit-capacity")
            .copied()
            .unwrap_or(5),
        user_rate_limit_window_seconds: matches
            .get_one::<u64>("user-rate-limit-window-seconds")
            .copied()
            .unwrap_or(60),
        cookie_domain: matches.get_one::<String>("cookie-domain").cloned(),
        cookie_same_site: get_string("cookie-same-site")?,
    }))
}
