//! User profile and role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_display_name;

/// Application-level role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Buyer,
    Seller,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Buyer => "buyer",
            UserRole::Seller => "seller",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "buyer" => Some(UserRole::Buyer),
            "seller" => Some(UserRole::Seller),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Profile row linked 1:1 with an authentication identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Same id as the authentication identity
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Sign-up form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpInput {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(custom = "validate_display_name")]
    pub full_name: String,
}

/// Sign-in form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInInput {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl SignUpInput {
    /// Trim surrounding whitespace from email and name. Run before
    /// `validate` so the checks see what will be stored.
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self.full_name = self.full_name.trim().to_string();
        self
    }
}

impl SignInInput {
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self
    }
}
