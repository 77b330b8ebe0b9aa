use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Class of a granted capability.
///
/// Any tag other than `menu`, `api` or `action` is carried as `Unknown` so the
/// stored list round-trips, but such entries never match an authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    Menu,
    Api,
    Action,
    Unknown(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Menu => "menu",
            ResourceType::Api => "api",
            ResourceType::Action => "action",
            ResourceType::Unknown(tag) => tag,
        }
    }
}

impl From<String> for ResourceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "menu" => ResourceType::Menu,
            "api" => ResourceType::Api,
            "action" => ResourceType::Action,
            _ => ResourceType::Unknown(value),
        }
    }
}

impl From<ResourceType> for String {
    fn from(value: ResourceType) -> Self {
        match value {
            ResourceType::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One granted capability: a menu name, an API path or an action tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: ResourceType,
    pub name: String,
}

impl Resource {
    pub fn new(kind: ResourceType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn menu(name: impl Into<String>) -> Self {
        Self::new(ResourceType::Menu, name)
    }

    pub fn api(name: impl Into<String>) -> Self {
        Self::new(ResourceType::Api, name)
    }

    pub fn action(name: impl Into<String>) -> Self {
        Self::new(ResourceType::Action, name)
    }
}

/// Ordered list of granted resources, always replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceList(pub Vec<Resource>);

impl ResourceList {
    pub fn new(resources: impl IntoIterator<Item = Resource>) -> Self {
        Self(resources.into_iter().collect())
    }

    /// Decodes a stored value entry by entry.
    ///
    /// Entries that are not `{type, name}` objects are dropped; anything other
    /// than an array yields an empty list.
    pub fn from_value(value: Value) -> Self {
        let entries = match value {
            Value::Array(entries) => entries,
            Value::Null => return Self::default(),
            other => {
                tracing::warn!(value = %other, "resource list is not an array, ignoring");
                return Self::default();
            }
        };

        let resources = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Resource>(entry.clone()) {
                Ok(resource) => Some(resource),
                Err(err) => {
                    tracing::warn!(entry = %entry, error = %err, "dropping malformed resource entry");
                    None
                }
            })
            .collect();

        Self(resources)
    }

    /// Names of every resource of `kind`, in stored order.
    pub fn names_of(&self, kind: &ResourceType) -> Vec<String> {
        self.0
            .iter()
            .filter(|resource| &resource.kind == kind)
            .map(|resource| resource.name.clone())
            .collect()
    }

    pub fn contains(&self, kind: &ResourceType, name: &str) -> bool {
        self.0
            .iter()
            .any(|resource| &resource.kind == kind && resource.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Resource> for ResourceList {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_type_round_trips_but_never_matches() {
        let list = ResourceList::from_value(json!([
            {"type": "menu", "name": "reports"},
            {"type": "widget", "name": "reports"},
        ]));

        assert_eq!(list.len(), 2);
        assert_eq!(list.names_of(&ResourceType::Menu), vec!["reports"]);
        assert!(list.names_of(&ResourceType::Api).is_empty());

        let stored = serde_json::to_value(&list).unwrap();
        assert_eq!(stored[1]["type"], "widget");
    }

    #[test]
    fn malformed_entries_are_dropped_individually() {
        let list = ResourceList::from_value(json!([
            {"type": "api", "name": "/users"},
            {"type": "api"},
            "not-an-object",
            {"type": "action", "name": "user.delete"},
        ]));

        assert_eq!(
            list,
            ResourceList::new([Resource::api("/users"), Resource::action("user.delete")])
        );
    }

    #[test]
    fn non_array_value_is_empty() {
        assert!(ResourceList::from_value(json!({"type": "menu"})).is_empty());
        assert!(ResourceList::from_value(Value::Null).is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let list = ResourceList::new([Resource::menu("home"), Resource::menu("home")]);
        assert_eq!(list.names_of(&ResourceType::Menu), vec!["home", "home"]);
        assert!(list.contains(&ResourceType::Menu, "home"));
    }
}
