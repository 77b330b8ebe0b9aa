use std::collections::HashSet;
use std::sync::Arc;

use super::prune::prune;
use super::{AuthzMode, PUBLIC_MENUS};
use crate::models::{MenuDefinition, MenuNode, ResourceType};
use crate::session::SessionStore;

/// The seam UI code checks against.
pub trait PermissionCheck: Send + Sync {
    /// Whether the current session may use the resource `name` of class `kind`.
    fn can(&self, kind: &ResourceType, name: &str) -> bool;
}

/// Answers permission queries from the live session.
///
/// Nothing is cached: every query re-reads the granted resources from the
/// [`SessionStore`], so a login or permission refresh is visible immediately.
#[derive(Debug, Clone)]
pub struct PermissionEngine {
    store: Arc<SessionStore>,
    menu: Arc<MenuDefinition>,
    mode: AuthzMode,
}

impl PermissionEngine {
    pub fn new(store: Arc<SessionStore>, menu: MenuDefinition, mode: AuthzMode) -> Self {
        Self {
            store,
            menu: Arc::new(menu),
            mode,
        }
    }

    pub fn mode(&self) -> AuthzMode {
        self.mode
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn menu_definition(&self) -> &MenuDefinition {
        &self.menu
    }

    /// Empty names and the welcome/login entry points are always reachable.
    pub fn is_auth_menu(&self, name: &str) -> bool {
        if name.is_empty() || PUBLIC_MENUS.contains(&name) {
            return true;
        }
        self.decide(&ResourceType::Menu, name, || {
            self.store.resource().get().contains(&ResourceType::Menu, name)
        })
    }

    pub fn is_auth_api(&self, name: &str) -> bool {
        self.decide(&ResourceType::Api, name, || {
            self.store.resource().get().contains(&ResourceType::Api, name)
        })
    }

    pub fn is_auth_action(&self, name: &str) -> bool {
        self.decide(&ResourceType::Action, name, || {
            self.store.resource().get().contains(&ResourceType::Action, name)
        })
    }

    /// The menu tree the current session may see.
    ///
    /// Unless enforcement is strict this is a copy of the full definition.
    pub fn filtered_menu(&self) -> Vec<MenuNode> {
        if !self.mode.is_enforced() {
            return self.menu.nodes().to_vec();
        }

        let granted = self.store.resource().menu();
        let authorized: HashSet<&str> = granted.iter().map(String::as_str).collect();
        let visible = prune(self.menu.nodes(), &authorized);

        tracing::debug!(
            granted = authorized.len(),
            top_level = visible.len(),
            "menu filtered"
        );
        visible
    }

    fn decide<F>(&self, kind: &ResourceType, name: &str, granted: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        match self.mode {
            AuthzMode::Off => true,
            AuthzMode::Advisory => {
                if !granted() {
                    tracing::warn!(kind = %kind, name = %name, "advisory: access would be denied");
                }
                true
            }
            AuthzMode::Strict => {
                let allowed = granted();
                if !allowed {
                    tracing::debug!(kind = %kind, name = %name, "permission denied");
                }
                allowed
            }
        }
    }
}

impl PermissionCheck for PermissionEngine {
    fn can(&self, kind: &ResourceType, name: &str) -> bool {
        match kind {
            ResourceType::Menu => self.is_auth_menu(name),
            ResourceType::Api => self.is_auth_api(name),
            ResourceType::Action => self.is_auth_action(name),
            ResourceType::Unknown(_) => self.decide(kind, name, || false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Resource, ResourceList};

    fn engine(mode: AuthzMode) -> PermissionEngine {
        let store = Arc::new(SessionStore::in_memory("test-"));
        store.resource().set(ResourceList::new([
            Resource::menu("reports"),
            Resource::api("/users"),
            Resource::action("user.delete"),
        ]));
        PermissionEngine::new(store, MenuDefinition::default(), mode)
    }

    #[test]
    fn strict_mode_checks_membership() {
        let engine = engine(AuthzMode::Strict);
        assert!(engine.is_auth_menu("reports"));
        assert!(!engine.is_auth_menu("audit"));
        assert!(engine.is_auth_api("/users"));
        assert!(!engine.is_auth_api("/reports"));
        assert!(engine.is_auth_action("user.delete"));
        assert!(!engine.is_auth_action("user.create"));
    }

    #[test]
    fn resource_class_matters() {
        let engine = engine(AuthzMode::Strict);
        assert!(!engine.is_auth_api("reports"));
        assert!(!engine.is_auth_menu("/users"));
    }

    #[test]
    fn advisory_mode_permits_everything() {
        let engine = engine(AuthzMode::Advisory);
        assert!(engine.is_auth_menu("audit"));
        assert!(engine.is_auth_api("/reports"));
        assert!(engine.can(&ResourceType::Action, "user.create"));
    }

    #[test]
    fn unknown_typed_grant_matches_nothing() {
        let store = Arc::new(SessionStore::in_memory("test-"));
        store.resource().set(ResourceList::new([Resource::new(
            ResourceType::Unknown("button".into()),
            "export",
        )]));
        let engine = PermissionEngine::new(store, MenuDefinition::default(), AuthzMode::Strict);

        assert!(!engine.is_auth_menu("export"));
        assert!(!engine.is_auth_api("export"));
        assert!(!engine.is_auth_action("export"));
    }

    #[test]
    fn unknown_class_is_denied_when_enforced() {
        let engine = engine(AuthzMode::Strict);
        assert!(!engine.can(&ResourceType::Unknown("widget".into()), "reports"));
        assert!(engine.can(&ResourceType::Menu, "reports"));
    }
}
