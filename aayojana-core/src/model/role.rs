use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// A capability tag granted to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Organizer,
    Attendee,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Organizer, Role::Attendee, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Organizer => "organizer",
            Role::Attendee => "attendee",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("Unknown role '{}'. Expected one of: organizer, attendee, admin", s)
            })
    }
}

/// A row of the `user_roles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: String,
    pub user_id: UserId,
    pub role: Role,
}

/// Insert payload for `user_roles`.
#[derive(Debug, Clone, Serialize)]
pub struct NewUserRole {
    pub user_id: UserId,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!("Organizer".parse::<Role>(), Ok(Role::Organizer));
        assert_eq!(" admin ".parse::<Role>(), Ok(Role::Admin));
        assert!("guest".parse::<Role>().is_err());
    }

    #[test]
    fn role_rows_use_lowercase_names() {
        let row: UserRole =
            serde_json::from_str(r#"{"id":"r1","user_id":"u1","role":"attendee"}"#).unwrap();
        assert_eq!(row.role, Role::Attendee);
        assert_eq!(row.user_id.as_str(), "u1");
    }
}
