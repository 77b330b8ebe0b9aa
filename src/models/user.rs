use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

const KNOWN_KEYS: [&str; 3] = ["id", "userName", "displayName"];

/// Profile of the signed-in user as handed over by the login flow.
///
/// `extra` holds every other key. Entries in `extra` named like a typed field
/// are never written; the typed field wins.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub user_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub display_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserInfo {
    pub fn new(
        id: impl Into<String>,
        user_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            user_name: user_name.into(),
            display_name: display_name.into(),
            extra: Map::new(),
        }
    }
}

impl Serialize for UserInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = self
            .extra
            .iter()
            .filter(|(key, _)| !KNOWN_KEYS.contains(&key.as_str()));

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("userName", &self.user_name)?;
        map.serialize_entry("displayName", &self.display_name)?;
        for (key, value) in extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// Backends hand out ids as numbers or strings; null means absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_id_becomes_string() {
        let user: UserInfo = serde_json::from_value(json!({
            "id": 42,
            "userName": "ada",
            "displayName": "Ada Lovelace",
            "avatar": "/a.png"
        }))
        .unwrap();

        assert_eq!(user.id, "42");
        assert_eq!(user.user_name, "ada");
        assert_eq!(user.extra["avatar"], "/a.png");
    }

    #[test]
    fn typed_fields_win_over_same_named_extras() {
        let mut user = UserInfo::new("7", "ada", "Ada");
        user.extra.insert("id".into(), json!("shadow"));
        user.extra.insert("displayName".into(), json!("Shadow"));
        user.extra.insert("avatar".into(), json!("/a.png"));

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value, json!({"id": "7", "userName": "ada", "displayName": "Ada", "avatar": "/a.png"}));

        let read_back: UserInfo = serde_json::from_value(value).unwrap();
        assert_eq!(read_back.id, "7");
        assert_eq!(read_back.display_name, "Ada");
        assert_eq!(read_back.extra.len(), 1);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let user: UserInfo = serde_json::from_value(json!({"userName": null})).unwrap();
        assert_eq!(user, UserInfo::default());
    }
}
