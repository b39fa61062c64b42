//! Account model and role profiles

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Hub, ParseEnumError};

/// Profile image every account starts with
pub const DEFAULT_PROFILE_IMAGE: &str = "default.jpg";

/// Role selector submitted at signup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Vendor,
    Customer,
    Shipper,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Vendor => "vendor",
            Role::Customer => "customer",
            Role::Shipper => "shipper",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vendor" => Ok(Role::Vendor),
            "customer" => Ok(Role::Customer),
            "shipper" => Ok(Role::Shipper),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

/// The single active role of an account together with its role-specific fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleProfile {
    Vendor { name: String, address: String },
    Customer { name: String, address: String },
    Shipper { hub: Hub },
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Vendor { .. } => Role::Vendor,
            RoleProfile::Customer { .. } => Role::Customer,
            RoleProfile::Shipper { .. } => Role::Shipper,
        }
    }
}

/// Vendor attributes that must be unique across all vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorField {
    Name,
    Address,
}

/// Account entity
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_image: String,
    pub profile: RoleProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    /// Display name of a vendor or customer; shippers have none
    pub fn display_name(&self) -> Option<&str> {
        match &self.profile {
            RoleProfile::Vendor { name, .. } | RoleProfile::Customer { name, .. } => Some(name),
            RoleProfile::Shipper { .. } => None,
        }
    }

    pub fn address(&self) -> Option<&str> {
        match &self.profile {
            RoleProfile::Vendor { address, .. } | RoleProfile::Customer { address, .. } => {
                Some(address)
            }
            RoleProfile::Shipper { .. } => None,
        }
    }

    pub fn hub(&self) -> Option<Hub> {
        match self.profile {
            RoleProfile::Shipper { hub } => Some(hub),
            _ => None,
        }
    }
}

/// New account record, credential already hashed
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub profile_image: String,
    pub profile: RoleProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_name() {
        for role in [Role::Vendor, Role::Customer, Role::Shipper] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn profile_serializes_with_role_tag() {
        let profile = RoleProfile::Shipper { hub: Hub::Hanoi };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json, serde_json::json!({"role": "shipper", "hub": "Hanoi"}));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let account = Account {
            id: Uuid::new_v4(),
            username: "customer01".to_string(),
            password_hash: "secret-hash".to_string(),
            profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
            profile: RoleProfile::Customer {
                name: "Nguyen Van A".to_string(),
                address: "12 Le Loi".to_string(),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("secret-hash"));
        assert_eq!(account.display_name(), Some("Nguyen Van A"));
        assert_eq!(account.hub(), None);
    }
}
