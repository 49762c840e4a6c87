//! Hosted authentication provider client
//!
//! Speaks the GoTrue-style REST API used by hosted backends: password
//! sign-in, sign-up with user metadata, and admin user deletion. Access
//! tokens are HS256 JWTs signed with the project secret, so session lookup
//! verifies them locally instead of calling out.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

/// Audience claim the provider puts on user access tokens
const TOKEN_AUDIENCE: &str = "authenticated";

/// A verified session for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: String,
    /// Unix timestamp (seconds)
    pub expires_at: i64,
}

/// Identity created by the provider at sign-up
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Extra user data stored with the identity
#[derive(Debug, Clone, Serialize)]
pub struct SignUpMetadata {
    pub full_name: String,
}

/// Capabilities the application needs from the auth provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve an access token to a session. `Ok(None)` for missing,
    /// expired, or forged tokens.
    async fn get_session(&self, access_token: &str) -> AppResult<Option<Session>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Session>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> AppResult<AuthIdentity>;

    /// Admin deletion, used to roll back a half-finished sign-up
    async fn delete_user(&self, user_id: Uuid) -> AppResult<()>;
}

/// JWT claims on provider-issued access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub aud: Option<String>,
}

/// Verify an access token against the project secret
pub fn verify_access_token(token: &str, secret: &str) -> Option<Session> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[TOKEN_AUDIENCE]);

    let data = match decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!("Rejected access token: {}", e);
            return None;
        }
    };

    let user_id = Uuid::parse_str(&data.claims.sub).ok()?;
    Some(Session {
        user_id,
        email: data.claims.email,
        access_token: token.to_string(),
        expires_at: data.claims.exp,
    })
}

/// REST client for the hosted provider
#[derive(Clone)]
pub struct HostedAuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
    jwt_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthIdentity,
}

/// Sign-up returns the bare user, or `{ user, session }` when email
/// confirmation is disabled
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    WithSession { user: AuthIdentity },
    Bare(AuthIdentity),
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ProviderErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

impl HostedAuthClient {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.provider_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    /// Turn a non-success response into an error. Client errors carry the
    /// provider's message unchanged.
    async fn error_from(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.json::<ProviderErrorBody>().await.unwrap_or_default();
        let message = body
            .into_message()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

        if status.is_client_error() {
            AppError::AuthProvider(message)
        } else {
            AppError::AuthProviderUnavailable(format!("{}: {}", status, message))
        }
    }

    fn transport(e: reqwest::Error) -> AppError {
        AppError::AuthProviderUnavailable(e.to_string())
    }
}

#[async_trait]
impl AuthProvider for HostedAuthClient {
    async fn get_session(&self, access_token: &str) -> AppResult<Option<Session>> {
        Ok(verify_access_token(access_token, &self.jwt_secret))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Session> {
        let response = self
            .client
            .post(self.url("/token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(Self::transport)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let token: TokenResponse = response.json().await.map_err(Self::transport)?;
        let expires_at = token
            .expires_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp() + token.expires_in);

        Ok(Session {
            user_id: token.user.id,
            email: token.user.email,
            access_token: token.access_token,
            expires_at,
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> AppResult<AuthIdentity> {
        let response = self
            .client
            .post(self.url("/signup"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": metadata,
            }))
            .send()
            .await
            .map_err(Self::transport)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: SignUpResponse = response.json().await.map_err(Self::transport)?;
        Ok(match body {
            SignUpResponse::WithSession { user } => user,
            SignUpResponse::Bare(user) => user,
        })
    }

    async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/admin/users/{}", user_id)))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(Self::transport)?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                tracing::warn!(%user_id, "Identity already gone during delete");
                Ok(())
            }
            _ => Err(Self::error_from(response).await),
        }
    }
}
