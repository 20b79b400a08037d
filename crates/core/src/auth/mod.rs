//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - Account role definitions

mod password;

pub use password::{PasswordError, hash_password, verify_password};

use serde::{Deserialize, Serialize};

/// Role of an authenticated account within a business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The business account itself (a `users` row).
    Owner,
    /// A worker added by the owner (a `workers` row).
    Worker,
}

impl Role {
    /// Returns true if this role can add, edit and remove workers.
    #[must_use]
    pub const fn can_manage_workers(&self) -> bool {
        matches!(self, Self::Owner)
    }

    /// Returns true if this role can delete business records.
    #[must_use]
    pub const fn can_delete_records(&self) -> bool {
        matches!(self, Self::Owner)
    }

    /// Returns true if this role can create and edit products and categories.
    #[must_use]
    pub const fn can_manage_catalog(&self) -> bool {
        matches!(self, Self::Owner | Self::Worker)
    }

    /// Returns true if this role can change the business profile.
    #[must_use]
    pub const fn can_update_business(&self) -> bool {
        matches!(self, Self::Owner)
    }

    /// Convert to the string stored in tokens.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Worker => "worker",
        }
    }

    /// Parse from the string stored in tokens.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Self::Owner),
            "worker" => Some(Self::Worker),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
