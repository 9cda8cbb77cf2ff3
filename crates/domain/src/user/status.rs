//! User lifecycle status.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UserError;

/// The status of a user account.
///
/// State transitions:
/// ```text
/// Pending ──► Active
///    │          │
///    └──────────┴──► Suspended
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// Registered but not yet activated.
    #[default]
    Pending,

    /// Activated and allowed to use the platform.
    Active,

    /// Suspended; reachable from any status.
    Suspended,
}

impl UserStatus {
    /// Returns true if the account can be activated from this status.
    pub fn can_activate(&self) -> bool {
        matches!(self, UserStatus::Pending)
    }

    /// Returns true if the account can be suspended from this status.
    pub fn can_suspend(&self) -> bool {
        true
    }

    /// Returns the status name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "PENDING",
            UserStatus::Active => "ACTIVE",
            UserStatus::Suspended => "SUSPENDED",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(UserStatus::Pending),
            "ACTIVE" => Ok(UserStatus::Active),
            "SUSPENDED" => Ok(UserStatus::Suspended),
            _ => Err(UserError::InvalidData(format!("unknown user status '{s}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(UserStatus::default(), UserStatus::Pending);
    }

    #[test]
    fn test_only_pending_can_activate() {
        assert!(UserStatus::Pending.can_activate());
        assert!(!UserStatus::Active.can_activate());
        assert!(!UserStatus::Suspended.can_activate());
    }

    #[test]
    fn test_any_status_can_suspend() {
        assert!(UserStatus::Pending.can_suspend());
        assert!(UserStatus::Active.can_suspend());
        assert!(UserStatus::Suspended.can_suspend());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(UserStatus::Active.to_string(), "ACTIVE");
        assert_eq!(
            serde_json::to_string(&UserStatus::Suspended).unwrap(),
            "\"SUSPENDED\""
        );
        let parsed: UserStatus = serde_json::from_str("\"PENDING\"").unwrap();
        assert_eq!(parsed, UserStatus::Pending);
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("active".parse::<UserStatus>().unwrap(), UserStatus::Active);
        assert_eq!("SUSPENDED".parse::<UserStatus>().unwrap(), UserStatus::Suspended);
        assert!("deleted".parse::<UserStatus>().is_err());
    }
}
