use std::sync::Arc;

use anyhow::Result;
use tempfile::tempdir;

use admin_guard::models::{MenuDefinition, Resource, ResourceList, UserInfo};
use admin_guard::storage::JsonFileStore;
use admin_guard::{AuthzMode, EventBus, PermissionEngine, SessionStore};

fn open(path: &std::path::Path) -> Result<SessionStore> {
    let backend = JsonFileStore::open(path)?;
    Ok(SessionStore::init(Arc::new(backend), "console-", Arc::new(EventBus::new())))
}

#[test]
fn session_survives_restart_and_logout_keeps_preferences() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("session.json");

    let store = open(&path)?;
    store.token().set("jwt".to_string());
    store.user_info().set(UserInfo::new("9", "grace", "Grace Hopper"));
    store.resource().set(ResourceList::new([Resource::menu("reports"), Resource::menu("sales")]));
    store.config().toggle_sidebar_collapse();
    store.teardown();

    let store = Arc::new(open(&path)?);
    assert_eq!(store.token().get(), "jwt");
    assert_eq!(store.user_info().user_name(), "grace");
    assert!(store.config().sidebar_collapse());

    let menu = MenuDefinition::from_json(
        r#"[{"name": "reports", "children": [{"name": "sales"}, {"name": "audit"}]}]"#,
    )?;
    let engine = PermissionEngine::new(Arc::clone(&store), menu, AuthzMode::Strict);
    assert_eq!(engine.filtered_menu()[0].children.as_ref().map(Vec::len), Some(1));

    store.clear();
    drop(engine);

    let store = open(&path)?;
    assert_eq!(store.token().get(), "");
    assert!(store.resource().menu().is_empty());
    assert!(store.config().sidebar_collapse());
    Ok(())
}

#[test]
fn menu_definition_loads_from_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("menu.json");
    std::fs::write(&path, r#"[{"name": "welcome"}, {"name": "system", "icon": "gear", "children": []}]"#)?;

    let menu = MenuDefinition::from_path(&path)?;
    assert_eq!(menu.nodes().len(), 2);
    assert_eq!(menu.nodes()[1].attributes["icon"], "gear");

    assert!(MenuDefinition::from_path(dir.path().join("missing.json")).is_err());
    Ok(())
}
