//! Admin user listing helpers: role and status labels, add-admin checks.

use crate::error::{AppResult, ValidationErrors};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

const NAME_MAX: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AdminRole {
    Super,
    Sub,
    User,
    Other(String),
}

impl From<String> for AdminRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            | "Super" => AdminRole::Super,
            | "Sub" => AdminRole::Sub,
            | "User" => AdminRole::User,
            | _ => AdminRole::Other(value),
        }
    }
}

impl From<AdminRole> for String {
    fn from(role: AdminRole) -> Self {
        match role {
            | AdminRole::Super => "Super".to_string(),
            | AdminRole::Sub => "Sub".to_string(),
            | AdminRole::User => "User".to_string(),
            | AdminRole::Other(raw) => raw,
        }
    }
}

impl AdminRole {
    pub fn display_name(&self) -> &str {
        match self {
            | AdminRole::Super => "Super Admin",
            | AdminRole::Sub => "Sub Admin",
            | AdminRole::User => "User",
            | AdminRole::Other(raw) if raw.is_empty() => "Unknown",
            | AdminRole::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdminStatus {
    Active,
    Blocked,
}

impl AdminStatus {
    pub fn from_blocked(is_blocked: bool) -> Self {
        if is_blocked { AdminStatus::Blocked } else { AdminStatus::Active }
    }
}

impl fmt::Display for AdminStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            | AdminStatus::Active => f.write_str("Active"),
            | AdminStatus::Blocked => f.write_str("Blocked"),
        }
    }
}

/// Avatar letter for an admin row; `?` when there is no email.
pub fn email_initial(email: &str) -> String {
    email
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

/// Body of the add-admin request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAdminDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl AddAdminDetails {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();

        for (field, value, label) in [
            ("firstName", &self.first_name, "First name"),
            ("lastName", &self.last_name, "Last name"),
        ] {
            if value.trim().is_empty() {
                errors.add(field, format!("{} is required", label));
            } else if value.chars().count() > NAME_MAX {
                errors.add(field, format!("{} must be at most {} characters", label, NAME_MAX));
            }
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !EMAIL.is_match(email) {
            errors.add("email", "Invalid email");
        }

        if self.role.trim().is_empty() {
            errors.add("role", "Role is required");
        }

        errors.into_result()
    }
}
