//! Authentication service for sign-up, sign-in, and role lookup

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use shared::{validate_email, Profile, SignInInput, SignUpInput, UserRole};

use crate::error::{AppError, AppResult};
use crate::external::{AuthProvider, Session, SignUpMetadata};
use crate::repositories::{NewProfile, ProfileStore};
use crate::services::saga::SagaOutcome;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(provider: Arc<dyn AuthProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { provider, profiles }
    }

    /// Register a new user: auth identity first, then a `buyer` profile.
    ///
    /// If the profile insert fails the identity is deleted again. A failed
    /// delete leaves an identity without a profile and ends in
    /// `CompensationFailed`.
    pub async fn sign_up(&self, input: SignUpInput) -> SagaOutcome<Profile> {
        let input = input.normalized();
        if let Err(errors) = input.validate() {
            return SagaOutcome::Aborted(errors.into());
        }

        let email = input.email.clone();
        let full_name = input.full_name.clone();

        let identity = match self
            .provider
            .sign_up(
                &email,
                &input.password,
                &SignUpMetadata {
                    full_name: full_name.clone(),
                },
            )
            .await
        {
            Ok(identity) => identity,
            Err(e) => return SagaOutcome::Aborted(e),
        };

        let profile = self
            .profiles
            .insert_profile(NewProfile {
                id: identity.id,
                email: identity.email.clone().unwrap_or_else(|| email.clone()),
                full_name,
                role: UserRole::Buyer,
            })
            .await;

        let insert_error = match profile {
            Ok(profile) => {
                tracing::info!(user_id = %profile.id, "User registered");
                return SagaOutcome::Completed(profile);
            }
            Err(e) => e,
        };

        tracing::error!(
            identity_id = %identity.id,
            "Profile creation failed, removing auth identity: {}",
            insert_error
        );
        let error = AppError::Registration(insert_error.to_string());

        match self.provider.delete_user(identity.id).await {
            Ok(()) => SagaOutcome::Compensated { error },
            Err(compensation_error) => {
                tracing::error!(
                    identity_id = %identity.id,
                    "Rollback failed, identity left without profile: {}",
                    compensation_error
                );
                SagaOutcome::CompensationFailed {
                    error,
                    compensation_error,
                }
            }
        }
    }

    /// Validate credentials shape, then let the provider check them
    pub async fn sign_in(&self, input: SignInInput) -> AppResult<Session> {
        let input = input.normalized();
        input.validate()?;
        self.provider
            .sign_in_with_password(&input.email, &input.password)
            .await
    }

    /// Role from the profile row; `buyer` when there is no row or it can't be read
    pub async fn role_for(&self, user_id: Uuid) -> UserRole {
        match self.profiles.find_profile(user_id).await {
            Ok(Some(profile)) => profile.role,
            Ok(None) => UserRole::default(),
            Err(e) => {
                tracing::error!(%user_id, "Role lookup failed, defaulting to buyer: {}", e);
                UserRole::default()
            }
        }
    }

    pub async fn profile(&self, user_id: Uuid) -> AppResult<Profile> {
        self.profiles
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))
    }

    /// Whether a profile uses this email. Not-found is `Ok(false)`; only
    /// genuine query failures are errors.
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let email = email.trim();
        validate_email(email).map_err(|msg| AppError::validation("email", msg))?;
        Ok(self.profiles.find_profile_by_email(email).await?.is_some())
    }
}
