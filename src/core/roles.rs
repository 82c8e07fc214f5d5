use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Name of a guarded operation, usually the action a route performs.
pub type Capability = &'static str;

pub const ADD_NOTE: Capability = "addnote";
pub const GET_NOTES: Capability = "getnotes";
pub const EDIT_NOTE: Capability = "editnote";
pub const DELETE_NOTE: Capability = "deletenote";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
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
            "user" => Ok(Role::User),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Immutable role → capability table, built once at startup and shared by
/// reference across requests.
#[derive(Debug, Clone)]
pub struct RoleRights {
    rights: HashMap<Role, HashSet<Capability>>,
    none: HashSet<Capability>,
}

impl RoleRights {
    pub fn new<I, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Role, C)>,
        C: IntoIterator<Item = Capability>,
    {
        let rights: HashMap<Role, HashSet<Capability>> = entries
            .into_iter()
            .map(|(role, caps)| (role, caps.into_iter().collect::<HashSet<_>>()))
            .collect();
        Self {
            rights,
            none: HashSet::new(),
        }
    }

    /// Capabilities granted to `role`. Unknown roles get the empty set.
    pub fn rights_of(&self, role: &str) -> &HashSet<Capability> {
        role.parse::<Role>()
            .ok()
            .and_then(|role| self.rights.get(&role))
            .unwrap_or(&self.none)
    }

    pub fn allows(&self, role: &str, capability: &str) -> bool {
        self.rights_of(role).contains(capability)
    }
}

impl Default for RoleRights {
    fn default() -> Self {
        RoleRights::new([
            (Role::Admin, vec![]),
            (Role::User, vec![ADD_NOTE, GET_NOTES, EDIT_NOTE, DELETE_NOTE]),
        ])
    }
}
