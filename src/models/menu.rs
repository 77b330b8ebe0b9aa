use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ConfigError;

/// A navigation entry. Only `name` and `children` are interpreted; everything
/// else (title, icon, path, ...) rides along in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MenuNode>>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl MenuNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: None,
            attributes: Map::new(),
        }
    }

    pub fn group(name: impl Into<String>, children: Vec<MenuNode>) -> Self {
        Self {
            name: name.into(),
            children: Some(children),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// True when the node has at least one child.
    pub fn has_children(&self) -> bool {
        self.children.as_ref().is_some_and(|children| !children.is_empty())
    }
}

/// The static menu tree the application ships with. Read-only input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuDefinition(Vec<MenuNode>);

impl MenuDefinition {
    pub fn new(nodes: Vec<MenuNode>) -> Self {
        Self(nodes)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::MenuRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn nodes(&self) -> &[MenuNode] {
        &self.0
    }
}
