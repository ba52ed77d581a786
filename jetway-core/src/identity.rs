use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Traveler,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Traveler => "traveler",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "traveler" => Ok(Role::Traveler),
            other => Err(format!("Invalid role: {}. Must be \"admin\" or \"traveler\"", other)),
        }
    }
}

/// Verified caller identity supplied by the auth layer for each request.
/// The core never checks credentials itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: Uuid,
    pub role: Role,
}

impl Requester {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner-or-admin access rule used for booking reads and cancellation.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_or_admin() {
        let owner = Uuid::new_v4();
        assert!(Requester::new(owner, Role::Traveler).can_access(owner));
        assert!(Requester::new(Uuid::new_v4(), Role::Admin).can_access(owner));
        assert!(!Requester::new(Uuid::new_v4(), Role::Traveler).can_access(owner));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("pilot".parse::<Role>().is_err());
    }
}
