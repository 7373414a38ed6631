use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Closed set of roles. Historical data carried free-form role strings
/// ("Admin", "admin", "ADMIN"); parsing is case-insensitive and happens once
/// at the boundary, never inside business rules.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Role {
    Admin = 1,
    #[strum(serialize = "Sub-Admin", serialize = "SubAdmin", serialize = "sub_admin")]
    SubAdmin = 2,
    #[strum(serialize = "HR")]
    Hr = 3,
    #[strum(serialize = "Team Lead", serialize = "TeamLead", serialize = "team_lead")]
    TeamLead = 4,
    Employee = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::SubAdmin),
            3 => Some(Role::Hr),
            4 => Some(Role::TeamLead),
            5 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Admin and Sub-Admin records are shielded from HR-level visibility.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::SubAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("hr").unwrap(), Role::Hr);
        assert_eq!(Role::from_str("sub-admin").unwrap(), Role::SubAdmin);
        assert_eq!(Role::from_str("team lead").unwrap(), Role::TeamLead);
        assert_eq!(Role::from_str("employee").unwrap(), Role::Employee);
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("superuser").is_err());
        assert!(Role::from_id(0).is_none());
        assert!(Role::from_id(6).is_none());
    }

    #[test]
    fn id_round_trip() {
        for role in [
            Role::Admin,
            Role::SubAdmin,
            Role::Hr,
            Role::TeamLead,
            Role::Employee,
        ] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
    }
}
