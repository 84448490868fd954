use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Organisational role of a user inside a tenant.
///
/// Roles arriving from membership rows are parsed leniently: a name this
/// build does not know becomes [`Role::Unknown`], which the role catalog maps
/// to the teacher capability set. Configuration files use [`Role::parse_strict`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Owner,
    Admin,
    Teacher,
    Admissions,
    Finance,
    Parent,
    Student,
    /// A role name not recognised by this build, kept verbatim for audit output.
    Unknown(String),
}

impl Role {
    /// Every recognised role, in catalog order.
    pub const KNOWN: [Role; 7] = [
        Role::Owner,
        Role::Admin,
        Role::Teacher,
        Role::Admissions,
        Role::Finance,
        Role::Parent,
        Role::Student,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Admissions => "admissions",
            Role::Finance => "finance",
            Role::Parent => "parent",
            Role::Student => "student",
            Role::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Unknown(_))
    }

    /// Parse a role name from a membership record. Never fails.
    pub fn lenient(name: &str) -> Self {
        let name = name.trim();
        Role::KNOWN
            .into_iter()
            .find(|r| r.as_str() == name)
            .unwrap_or_else(|| Role::Unknown(name.to_string()))
    }

    /// Parse a role name from configuration; unknown names are rejected.
    pub fn parse_strict(name: &str) -> Result<Self, ConfigurationError> {
        match Role::lenient(name) {
            Role::Unknown(_) => Err(ConfigurationError::UnknownRole(name.to_string())),
            known => Ok(known),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::lenient(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parse_keeps_unknown_name() {
        assert_eq!(Role::lenient("finance"), Role::Finance);
        assert_eq!(Role::lenient("janitor"), Role::Unknown("janitor".into()));
        assert!(!Role::lenient("janitor").is_known());
    }

    #[test]
    fn strict_parse_rejects_unknown() {
        assert_eq!(Role::parse_strict("parent").unwrap(), Role::Parent);
        assert_eq!(
            Role::parse_strict("janitor").unwrap_err(),
            ConfigurationError::UnknownRole("janitor".into())
        );
    }

    #[test]
    fn serde_round_trips_unknown_role_verbatim() {
        let role: Role = serde_json::from_str("\"librarian\"").unwrap();
        assert_eq!(role, Role::Unknown("librarian".into()));
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"librarian\"");
        assert_eq!(serde_json::to_string(&Role::Admissions).unwrap(), "\"admissions\"");
    }
}
