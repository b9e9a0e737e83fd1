//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    /// Username or email address.
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyOtpResponse {
    pub profile: ProfileResponse,
    pub tokens: TokenPairResponse,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshRequest {
    /// Optional when the refresh token is sent as a cookie.
    pub refresh_token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LogoutResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ProfileResponse {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn login_request_round_trips() -> Result<()> {
        let request = LoginRequest {
            username: "alice".to_string(),
            password: "hunter2hunter2".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let username = value
            .get("username")
            .and_then(serde_json::Value::as_str)
            .context("missing username")?;
        assert_eq!(username, "alice");
        let decoded: LoginRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.password, "hunter2hunter2");
        Ok(())
    }

    #[test]
    fn refresh_request_accepts_missing_token() -> Result<()> {
        let decoded: RefreshRequest = serde_json::from_str("{}")?;
        assert!(decoded.refresh_token.is_none());
        Ok(())
    }

    #[test]
    fn token_pair_serializes_all_fields() -> Result<()> {
        let response = TokenPairResponse {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 900,
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(
            value.get("expires_in").and_then(serde_json::Value::as_i64),
            Some(900)
        );
        assert_eq!(
            value.get("token_type").and_then(serde_json::Value::as_str),
            Some("Bearer")
        );
        Ok(())
    }

    #[test]
    fn verify_otp_response_nests_profile_and_tokens() -> Result<()> {
        let response = VerifyOtpResponse {
            profile: ProfileResponse {
                user_id: "11111111-2222-3333-4444-555555555555".to_string(),
                username: "alice".to_string(),
                email: "alice@lab.example".to_string(),
            },
            tokens: TokenPairResponse {
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
                token_type: "Bearer".to_string(),
                expires_in: 900,
            },
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(
            value
                .pointer("/profile/username")
                .and_then(serde_json::Value::as_str),
            Some("alice")
        );
        assert!(value.pointer("/tokens/access_token").is_some());
        Ok(())
    }
}
