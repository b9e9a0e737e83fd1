//! Outbound message delivery abstraction.
//!
//! One-time codes leave the service through a `Messenger`. Delivery is part
//! of the login request path, so a failed send is surfaced to the caller as
//! a retryable error instead of being silently swallowed; the login handler
//! also invalidates the just-issued code so no record suggests a code was
//! delivered when it was not.
//!
//! The default sender for local dev is `LogMessenger`, which logs the
//! message and returns `Ok(())`. Production deployments implement the trait
//! over SMTP or a delivery API.

use anyhow::Result;
use tracing::info;

/// Message delivery abstraction used by the auth handlers.
pub trait Messenger: Send + Sync {
    /// Deliver a message or return an error so the caller can fail closed.
    ///
    /// # Errors
    ///
    /// Returns an error when the message could not be handed off.
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogMessenger;

impl Messenger for LogMessenger {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        info!(to_email = %to, subject = %subject, body = %body, "email send stub");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_messenger_always_succeeds() {
        let messenger = LogMessenger;
        assert!(
            messenger
                .send("alice@lab.example", "Your verification code", "4821")
                .is_ok()
        );
    }
}
