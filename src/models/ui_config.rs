use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SIDEBAR_COLLAPSE_KEY: &str = "sidebarCollapse";

/// Display preferences. Survives logout; unknown keys are preserved on write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    #[serde(default)]
    pub sidebar_collapse: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UiConfig {
    /// Whether a stored value already carries the sidebar flag.
    pub fn is_initialized(value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|object| object.contains_key(SIDEBAR_COLLAPSE_KEY))
    }
}
