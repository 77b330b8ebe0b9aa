//! Session Store: namespaced, notifying storage of the current user's session.
//!
//! Five fields live under `<prefix><key>`: `config`, `token`, `user`, `role`
//! and `resource`. Each has its own get/set/remove lifecycle and every
//! mutation is announced on the [`EventBus`] before the call returns.
//!
//! # Failure semantics
//!
//! Accessors never fail. If the backend cannot be read, or holds a value of the
//! wrong shape, the field's empty default is returned. If a write fails the new
//! value is lost. Both cases are reported with `tracing::warn!` and nothing
//! else; the event for a failed write is still published.
//!
//! # Threads
//!
//! The store is `Send + Sync`. Writers are serialized, so a read always sees
//! the latest completed write and `toggle_sidebar_collapse` never loses an
//! update. Events are published after the write lock is released: when two
//! threads write the same field at once, subscribers may receive the events
//! in a different order than the writes landed. A handler that needs the
//! current value should re-read the field rather than trust the payload.

mod fields;

pub use fields::{ResourceField, RoleField, SessionField, TokenField, UserInfoField};

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};

use crate::events::{EventBus, SessionEvent};
use crate::models::resource::ResourceType;
use crate::models::ui_config::SIDEBAR_COLLAPSE_KEY;
use crate::models::UiConfig;
use crate::storage::{KeyValueStore, MemoryStore};

pub const CONFIG_KEY: &str = "config";

pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    prefix: String,
    bus: Arc<EventBus>,
    // Serializes writers. Publishing happens after release so handlers may write back.
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("prefix", &self.prefix)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Builds the store and seeds the config default if it is missing.
    pub fn init(backend: Arc<dyn KeyValueStore>, prefix: impl Into<String>, bus: Arc<EventBus>) -> Self {
        let store = Self {
            backend,
            prefix: prefix.into(),
            bus,
            write_lock: Mutex::new(()),
        };
        store.config().ensure_initialized();
        tracing::debug!(prefix = %store.prefix, "session store initialized");
        store
    }

    /// Fresh store over a private [`MemoryStore`] and bus.
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        Self::init(Arc::new(MemoryStore::new()), prefix, Arc::new(EventBus::new()))
    }

    /// Flushes the backend and drops every subscriber on the bus.
    pub fn teardown(self) {
        if let Err(err) = self.backend.flush() {
            tracing::warn!(error = %err, "failed to flush session backend on teardown");
        }
        self.bus.clear();
        tracing::debug!(prefix = %self.prefix, "session store torn down");
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Fully qualified storage key for a field.
    pub fn key(&self, field: &str) -> String {
        format!("{}{}", self.prefix, field)
    }

    pub fn field<F: SessionField>(&self) -> FieldHandle<'_, F> {
        FieldHandle {
            store: self,
            _field: PhantomData,
        }
    }

    pub fn token(&self) -> FieldHandle<'_, TokenField> {
        self.field()
    }

    pub fn user_info(&self) -> FieldHandle<'_, UserInfoField> {
        self.field()
    }

    pub fn role(&self) -> FieldHandle<'_, RoleField> {
        self.field()
    }

    pub fn resource(&self) -> FieldHandle<'_, ResourceField> {
        self.field()
    }

    pub fn config(&self) -> ConfigHandle<'_> {
        ConfigHandle { store: self }
    }

    /// Logs the user out locally: removes token, user, role and resource,
    /// each with its own removal event. Config is kept.
    pub fn clear(&self) {
        self.token().remove();
        self.user_info().remove();
        self.role().remove();
        self.resource().remove();
        tracing::info!(prefix = %self.prefix, "session cleared");
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_raw(&self, field: &str) -> Option<Value> {
        let key = self.key(field);
        match self.backend.get(&key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "session read failed, using default");
                None
            }
        }
    }

    fn write_raw(&self, field: &str, value: Value) {
        let key = self.key(field);
        if let Err(err) = self.backend.set(&key, value) {
            tracing::warn!(key = %key, error = %err, "session write lost");
        }
    }

    fn remove_raw(&self, field: &str) {
        let key = self.key(field);
        if let Err(err) = self.backend.remove(&key) {
            tracing::warn!(key = %key, error = %err, "session remove lost");
        }
    }

    fn publish(&self, event: SessionEvent) {
        self.bus.publish(event);
    }
}

/// Accessor for one [`SessionField`], borrowed from a [`SessionStore`].
pub struct FieldHandle<'s, F: SessionField> {
    store: &'s SessionStore,
    _field: PhantomData<F>,
}

impl<F: SessionField> FieldHandle<'_, F> {
    /// Stored value, or the field's empty default.
    pub fn get(&self) -> F::Value {
        self.store
            .read_raw(F::KEY)
            .filter(|raw| !raw.is_null())
            .map(F::decode)
            .unwrap_or_default()
    }

    /// Replaces the stored value and publishes the field's set event.
    pub fn set(&self, value: F::Value) {
        {
            let _guard = self.store.lock();
            match serde_json::to_value(&value) {
                Ok(raw) => self.store.write_raw(F::KEY, raw),
                Err(err) => {
                    tracing::warn!(field = F::KEY, error = %err, "value not serializable, write lost")
                }
            }
        }
        self.store.publish(F::set_event(&value));
    }

    /// Deletes the stored value and publishes the field's removal event.
    pub fn remove(&self) {
        {
            let _guard = self.store.lock();
            self.store.remove_raw(F::KEY);
        }
        self.store.publish(F::removed_event());
    }
}

impl FieldHandle<'_, UserInfoField> {
    pub fn id(&self) -> String {
        self.get().id
    }

    pub fn user_name(&self) -> String {
        self.get().user_name
    }

    pub fn display_name(&self) -> String {
        self.get().display_name
    }
}

impl FieldHandle<'_, ResourceField> {
    /// Names of granted menu entries.
    pub fn menu(&self) -> Vec<String> {
        self.get().names_of(&ResourceType::Menu)
    }

    /// Granted API endpoints.
    pub fn api(&self) -> Vec<String> {
        self.get().names_of(&ResourceType::Api)
    }

    /// Granted UI actions.
    pub fn action(&self) -> Vec<String> {
        self.get().names_of(&ResourceType::Action)
    }
}

/// Accessor for the display preferences. Unlike the session fields, config
/// is merged on write and is never removed by [`SessionStore::clear`].
pub struct ConfigHandle<'s> {
    store: &'s SessionStore,
}

impl ConfigHandle<'_> {
    pub fn get(&self) -> UiConfig {
        let raw = self.ensure_initialized();
        serde_json::from_value(Value::Object(raw)).unwrap_or_else(|err| {
            tracing::warn!(field = CONFIG_KEY, error = %err, "stored config has unexpected shape, using default");
            UiConfig::default()
        })
    }

    pub fn sidebar_collapse(&self) -> bool {
        self.get().sidebar_collapse
    }

    /// Flips `sidebarCollapse`, keeping every other config key, and returns the new state.
    pub fn toggle_sidebar_collapse(&self) -> bool {
        let collapsed = {
            let _guard = self.store.lock();
            let mut config = self.read_object();
            let collapsed = !config
                .get(SIDEBAR_COLLAPSE_KEY)
                .and_then(Value::as_bool)
                .unwrap_or(false);
            config.insert(SIDEBAR_COLLAPSE_KEY.to_string(), Value::Bool(collapsed));
            self.store.write_raw(CONFIG_KEY, Value::Object(config));
            collapsed
        };
        self.store.publish(SessionEvent::SidebarToggled { collapsed });
        collapsed
    }

    /// Writes `sidebarCollapse: false` into the stored config when the flag is absent.
    /// Returns the config object as it now stands. No event is published.
    pub(crate) fn ensure_initialized(&self) -> Map<String, Value> {
        let _guard = self.store.lock();
        let raw = self.store.read_raw(CONFIG_KEY);
        if raw.as_ref().is_some_and(UiConfig::is_initialized) {
            return self.read_object_from(raw);
        }

        let mut config = self.read_object_from(raw);
        config.insert(SIDEBAR_COLLAPSE_KEY.to_string(), Value::Bool(false));
        self.store.write_raw(CONFIG_KEY, Value::Object(config.clone()));
        config
    }

    fn read_object(&self) -> Map<String, Value> {
        self.read_object_from(self.store.read_raw(CONFIG_KEY))
    }

    fn read_object_from(&self, raw: Option<Value>) -> Map<String, Value> {
        match raw {
            Some(Value::Object(config)) => config,
            _ => Map::new(),
        }
    }
}
