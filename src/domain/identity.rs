//! Authenticated caller identity.

use chrono::{DateTime, Utc};

/// Decoded from a verified access token and attached to the request by the
/// authentication gate. Lives for one request; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    pub fn has_any_role<S: AsRef<str>>(&self, permitted: &[S]) -> bool {
        self.roles
            .iter()
            .any(|role| permitted.iter().any(|p| p.as_ref() == role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(roles: &[&str]) -> Identity {
        Identity {
            user_id: 1,
            username: "alice".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_any_role() {
        let user = identity(&["default"]);

        assert!(user.has_any_role(&["admin", "default"]));
        assert!(!user.has_any_role(&["admin"]));
    }

    #[test]
    fn test_no_roles_never_matches() {
        assert!(!identity(&[]).has_any_role(&["admin"]));
    }
}
