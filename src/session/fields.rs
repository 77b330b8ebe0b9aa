use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::events::SessionEvent;
use crate::models::{ResourceList, UserInfo};

/// One independently stored piece of session state.
///
/// Implementors are zero-sized markers; the associated items say where the
/// value lives, what it defaults to and which events announce changes.
pub trait SessionField {
    type Value: Serialize + DeserializeOwned + Default + Clone;

    /// Key suffix appended to the store's namespace prefix.
    const KEY: &'static str;

    fn set_event(value: &Self::Value) -> SessionEvent;

    fn removed_event() -> SessionEvent;

    /// Turns a stored document back into a value, falling back to the default.
    fn decode(raw: Value) -> Self::Value {
        serde_json::from_value(raw).unwrap_or_else(|err| {
            tracing::warn!(field = Self::KEY, error = %err, "stored value has unexpected shape, using default");
            Self::Value::default()
        })
    }
}

pub struct TokenField;

impl SessionField for TokenField {
    type Value = String;
    const KEY: &'static str = "token";

    fn set_event(value: &String) -> SessionEvent {
        SessionEvent::TokenSet(value.clone())
    }

    fn removed_event() -> SessionEvent {
        SessionEvent::TokenRemoved
    }
}

pub struct UserInfoField;

impl SessionField for UserInfoField {
    type Value = UserInfo;
    const KEY: &'static str = "user";

    fn set_event(value: &UserInfo) -> SessionEvent {
        SessionEvent::UserInfoSet(value.clone())
    }

    fn removed_event() -> SessionEvent {
        SessionEvent::UserInfoRemoved
    }
}

pub struct RoleField;

impl SessionField for RoleField {
    type Value = Vec<String>;
    const KEY: &'static str = "role";

    fn set_event(value: &Vec<String>) -> SessionEvent {
        SessionEvent::RoleSet(value.clone())
    }

    fn removed_event() -> SessionEvent {
        SessionEvent::RoleRemoved
    }
}

pub struct ResourceField;

impl SessionField for ResourceField {
    type Value = ResourceList;
    const KEY: &'static str = "resource";

    fn set_event(value: &ResourceList) -> SessionEvent {
        SessionEvent::ResourceSet(value.clone())
    }

    fn removed_event() -> SessionEvent {
        SessionEvent::ResourceRemoved
    }

    fn decode(raw: Value) -> ResourceList {
        ResourceList::from_value(raw)
    }
}
