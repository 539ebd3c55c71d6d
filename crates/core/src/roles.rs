//! Role model for kernel API callers.
//!
//! Role names travel inside access-token claims, so the string forms below are
//! part of the wire format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ROLE_ADMINISTRATOR: &str = "administrator";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_READER: &str = "reader";
pub const ROLE_VISITOR: &str = "visitor";

/// Authorization level of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Editor,
    Reader,
    Visitor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => ROLE_ADMINISTRATOR,
            Role::Editor => ROLE_EDITOR,
            Role::Reader => ROLE_READER,
            Role::Visitor => ROLE_VISITOR,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Administrator
    }

    /// Readers and visitors may look but never mutate.
    pub fn is_read_only(self) -> bool {
        matches!(self, Role::Reader | Role::Visitor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMINISTRATOR => Ok(Role::Administrator),
            ROLE_EDITOR => Ok(Role::Editor),
            ROLE_READER => Ok(Role::Reader),
            ROLE_VISITOR => Ok(Role::Visitor),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
