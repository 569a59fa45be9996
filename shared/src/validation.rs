//! Input validation functions
//!
//! These run before any store write. Email format is checked by the
//! backend with the `validator` crate; everything else lives here so the
//! rules can be tested without a database.

use crate::types::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateAccountRequest};
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Minimum and maximum lengths accepted for usernames
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;

/// Minimum and maximum lengths accepted for passwords
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.]+$").expect("username pattern is valid"));

/// Validate that a required field is present and not only whitespace
pub fn require_non_blank(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::new(field, "is required")),
    }
}

/// Validate username format
///
/// Lowercase letters, digits, underscores and dots. Input is lower-cased
/// by the caller before storage, so upper-case letters are accepted here.
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(format!(
            "Username must be at least {} characters",
            USERNAME_MIN_LEN
        ));
    }
    if len > USERNAME_MAX_LEN {
        return Err(format!(
            "Username must be at most {} characters",
            USERNAME_MAX_LEN
        ));
    }
    if !USERNAME_PATTERN.is_match(username) {
        return Err(
            "Username may only contain letters, digits, underscores and dots".to_string(),
        );
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < PASSWORD_MIN_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_LEN
        ));
    }
    if password.len() > PASSWORD_MAX_LEN {
        return Err("Password too long".to_string());
    }
    Ok(())
}

/// Validate a display name
pub fn validate_full_name(full_name: &str) -> Result<(), String> {
    if full_name.trim().chars().count() > 100 {
        return Err("Full name must be at most 100 characters".to_string());
    }
    Ok(())
}

/// Check a registration request for missing fields
///
/// Returns the first missing field. Format checks are separate so the
/// caller can map the two failure kinds to different error variants.
pub fn check_register_fields(req: &RegisterRequest) -> Result<(), ValidationError> {
    require_non_blank("fullName", req.full_name.as_deref())?;
    require_non_blank("username", req.username.as_deref())?;
    require_non_blank("email", req.email.as_deref())?;
    require_non_blank("password", req.password.as_deref())?;
    Ok(())
}

/// Check a login request: one identifier and a password
pub fn check_login_fields(req: &LoginRequest) -> Result<(), ValidationError> {
    let has_username = require_non_blank("username", req.username.as_deref()).is_ok();
    let has_email = require_non_blank("email", req.email.as_deref()).is_ok();
    if !has_username && !has_email {
        return Err(ValidationError::new(
            "username",
            "username or email is required",
        ));
    }
    require_non_blank("password", req.password.as_deref())
}

/// Check a change-password request for missing fields
pub fn check_change_password_fields(req: &ChangePasswordRequest) -> Result<(), ValidationError> {
    require_non_blank("oldPassword", req.old_password.as_deref())?;
    require_non_blank("newPassword", req.new_password.as_deref())
}

/// Check an account update request for missing fields
pub fn check_update_account_fields(req: &UpdateAccountRequest) -> Result<(), ValidationError> {
    require_non_blank("fullName", req.full_name.as_deref())?;
    require_non_blank("email", req.email.as_deref())
}

/// Map wire field names to user-friendly display labels
pub fn get_field_display_label(field_name: &str) -> &str {
    match field_name {
        "fullName" => "Full name",
        "username" => "Username",
        "email" => "Email",
        "password" => "Password",
        "oldPassword" => "Old password",
        "newPassword" => "New password",
        _ => field_name,
    }
}

/// Validation error with field context
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub display_label: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            display_label: get_field_display_label(field).to_string(),
        }
    }

    /// Format as user-friendly error message
    pub fn user_message(&self) -> String {
        if self.message.starts_with(&self.field) {
            // Already self-describing, e.g. "username or email is required"
            return self.message.clone();
        }
        format!("{} {}", self.display_label, self.message)
    }
}
