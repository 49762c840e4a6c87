//! Validation utilities for the B2B marketplace
//!
//! Checks that run before any data-access call. Failures carry the name of
//! the offending field so forms can show the message next to it.

use std::borrow::Cow;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationError;

/// Validation failure tied to one input field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    pub fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

// ============================================================================
// Account Validations
// ============================================================================

/// Validate email format with the same rule as `#[validate(email)]`
/// on the sign-up and sign-in forms
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if validator::validate_email(email.trim()) {
        Ok(())
    } else {
        Err("Please enter a valid email address")
    }
}

/// Display names must contain something other than whitespace
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("display_name");
        err.message = Some(Cow::Borrowed("Name is required"));
        return Err(err);
    }
    if name.trim().chars().count() > 120 {
        let mut err = ValidationError::new("display_name");
        err.message = Some(Cow::Borrowed("Name must be at most 120 characters"));
        return Err(err);
    }
    Ok(())
}

// ============================================================================
// Messaging Validations
// ============================================================================

/// Reject empty or whitespace-only message text, returning the trimmed text
pub fn validate_message_text(text: &str) -> Result<&str, FieldError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new("message", "Message cannot be empty"));
    }
    Ok(trimmed)
}

/// Enquiry form as submitted from a product or business page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnquiryInput {
    pub product_id: Option<String>,
    pub seller_id: Option<String>,
    pub message: Option<String>,
    /// Page to come back to after signing in
    pub return_to: Option<String>,
}

/// Enquiry with every field present and parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEnquiry {
    pub product_id: Uuid,
    pub seller_business_id: Uuid,
    pub message: String,
}

fn required_id(value: Option<&str>, field: &'static str, missing: &'static str) -> Result<Uuid, FieldError> {
    let raw = value.map(str::trim).filter(|s| !s.is_empty());
    match raw {
        None => Err(FieldError::new(field, missing)),
        Some(raw) => Uuid::parse_str(raw).map_err(|_| FieldError::new(field, "Invalid identifier")),
    }
}

/// Check that product, seller, and message are all present
pub fn validate_enquiry(input: &EnquiryInput) -> Result<ValidEnquiry, FieldError> {
    let product_id = required_id(input.product_id.as_deref(), "product_id", "Product is required")?;
    let seller_business_id = required_id(input.seller_id.as_deref(), "seller_id", "Seller is required")?;
    let message = validate_message_text(input.message.as_deref().unwrap_or_default())?;

    Ok(ValidEnquiry {
        product_id,
        seller_business_id,
        message: message.to_string(),
    })
}

/// Only same-site relative paths are accepted as post-login return targets.
///
/// Browsers read `\` as `/` and drop tabs and newlines inside URLs, so any
/// of those could turn `/x` into a scheme-relative `//host` link.
pub fn sanitize_return_path(path: Option<&str>) -> Option<&str> {
    path.map(str::trim).filter(|p| {
        p.starts_with('/')
            && !p
                .chars()
                .any(|c| c == '\\' || c.is_control() || c.is_whitespace())
            && !p.starts_with("//")
            && !p.contains("://")
    })
}
