//! Client for the hosted auth provider
//!
//! Sign-in is passwordless: the provider emails a magic link, the browser
//! lands back on the app with a one-time code, and the code is exchanged for
//! a session. After that every request carries the session's access token
//! and this module only resolves tokens to users.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("auth error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("failed to decode auth response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The authenticated account as the provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppUser {
    pub id: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Tokens handed back from a code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: AppUser,
}

/// Profile fields a signed-in user may change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Request a magic-link email. The provider answers 200 whether or not
    /// the address has an account, so this reveals nothing about membership.
    pub async fn sign_in_with_otp(&self, email: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoint("otp"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "create_user": true }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Exchange the one-time code from the magic-link redirect for a session.
    pub async fn exchange_code(&self, code: &str) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(self.endpoint("token?grant_type=pkce"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .await?;
        let body = check_status(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Resolve an access token to its account. The 401 from an expired or
    /// garbage token comes through as AuthError::Api.
    pub async fn get_user(&self, access_token: &str) -> Result<AppUser, AuthError> {
        let response = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;
        let body = check_status(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Change email and/or password for the signed-in account.
    pub async fn update_user(&self, access_token: &str, update: &UserUpdate) -> Result<AppUser, AuthError> {
        let response = self
            .http
            .put(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .json(update)
            .send()
            .await?;
        let body = check_status(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Revoke the session behind an access token.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<String, AuthError> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(AuthError::Api { status: status.as_u16(), message: body });
    }
    Ok(body)
}
