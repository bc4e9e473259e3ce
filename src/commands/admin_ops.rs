//! Admin management operations.

use crate::admins::{self, AddAdminDetails, AdminRole, AdminStatus};
use serde::Serialize;

/// Display fields for one row of the admin table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRowLabels {
    pub initial: String,
    pub role: String,
    pub status: AdminStatus,
}

pub fn admin_row_labels(email: &str, role: &str, is_blocked: bool) -> AdminRowLabels {
    AdminRowLabels {
        initial: admins::email_initial(email),
        role: AdminRole::from(role.to_string()).display_name().to_string(),
        status: AdminStatus::from_blocked(is_blocked),
    }
}

pub fn validate_new_admin(details: &AddAdminDetails) -> Result<(), String> {
    details.validate().map_err(|e| e.to_frontend_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_labels() {
        let labels = admin_row_labels("sam@example.com", "Super", true);
        assert_eq!(labels.initial, "S");
        assert_eq!(labels.role, "Super Admin");
        assert_eq!(labels.status, AdminStatus::Blocked);
    }

    #[test]
    fn new_admin_needs_an_email() {
        let details: AddAdminDetails = serde_json::from_value(serde_json::json!({
            "firstName": "Sam",
            "lastName": "Lee",
            "email": "",
            "role": "Sub"
        }))
        .unwrap();
        assert_eq!(validate_new_admin(&details).unwrap_err(), "Email is required");
    }
}
