//! User account entity.

use chrono::{DateTime, Utc};

pub const ADMIN_ROLE: &str = "admin";
pub const DEFAULT_ROLE: &str = "default";

/// A registered account. Never exposed through the generic resource API.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub password_hash: String,
    pub enabled: bool,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Input data for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub password_hash: String,
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_role() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            first_name: None,
            last_name: None,
            email: None,
            mobile_number: None,
            password_hash: String::new(),
            enabled: true,
            roles: vec![DEFAULT_ROLE.to_string()],
            created_at: Utc::now(),
        };

        assert!(user.has_role(DEFAULT_ROLE));
        assert!(!user.has_role(ADMIN_ROLE));
    }
}
