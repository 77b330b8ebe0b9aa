//! Authorization module - Permission Engine and menu pruning
//!
//! Answers "is X permitted" for menu entries, API endpoints and UI actions
//! against the resources granted to the current session, and derives the
//! visible navigation tree. This is UX gating only; the server re-checks
//! every request.

mod engine;
mod prune;

pub use engine::{PermissionCheck, PermissionEngine};
pub use prune::prune;

use std::fmt;
use std::str::FromStr;

/// Menu names reachable without any grant.
pub const PUBLIC_MENUS: [&str; 4] = ["welcome", "welcome.index", "login", "login.index"];

/// Authorization enforcement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthzMode {
    /// No permission checks (development mode)
    Off,
    /// Log denials but allow (testing mode)
    Advisory,
    /// Hide and block what was not granted
    #[default]
    Strict,
}

impl AuthzMode {
    pub fn is_enforced(&self) -> bool {
        matches!(self, AuthzMode::Strict)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthzMode::Off => "off",
            AuthzMode::Advisory => "advisory",
            AuthzMode::Strict => "strict",
        }
    }
}

impl From<bool> for AuthzMode {
    fn from(need_permission: bool) -> Self {
        if need_permission {
            AuthzMode::Strict
        } else {
            AuthzMode::Off
        }
    }
}

impl FromStr for AuthzMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(AuthzMode::Off),
            "advisory" => Ok(AuthzMode::Advisory),
            "strict" => Ok(AuthzMode::Strict),
            other => Err(format!("unknown authz mode: {other}")),
        }
    }
}

impl fmt::Display for AuthzMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
