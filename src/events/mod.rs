//! Synchronous, typed publish/subscribe for session changes.
//!
//! Every session mutation produces one [`SessionEvent`]. The bus wraps it in a
//! [`Notification`] envelope and hands it to each matching subscriber in
//! registration order before `publish` returns. A handler that panics is
//! logged and skipped; the remaining handlers still run.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{ResourceList, UserInfo};

/// Named event kinds, one per field and mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    ToggleSidebarCollapse,
    SetToken,
    RemoveToken,
    #[serde(rename = "set-userinfo")]
    SetUserInfo,
    #[serde(rename = "remove-userinfo")]
    RemoveUserInfo,
    SetRole,
    RemoveRole,
    SetResource,
    RemoveResource,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::ToggleSidebarCollapse => "toggle-sidebar-collapse",
            Topic::SetToken => "set-token",
            Topic::RemoveToken => "remove-token",
            Topic::SetUserInfo => "set-userinfo",
            Topic::RemoveUserInfo => "remove-userinfo",
            Topic::SetRole => "set-role",
            Topic::RemoveRole => "remove-role",
            Topic::SetResource => "set-resource",
            Topic::RemoveResource => "remove-resource",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What changed. `*Set` variants carry the value just written; removals carry nothing.
/// Serialized with the same tag as [`Topic::as_str`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "topic", content = "payload")]
pub enum SessionEvent {
    #[serde(rename = "toggle-sidebar-collapse")]
    SidebarToggled { collapsed: bool },
    #[serde(rename = "set-token")]
    TokenSet(String),
    #[serde(rename = "remove-token")]
    TokenRemoved,
    #[serde(rename = "set-userinfo")]
    UserInfoSet(UserInfo),
    #[serde(rename = "remove-userinfo")]
    UserInfoRemoved,
    #[serde(rename = "set-role")]
    RoleSet(Vec<String>),
    #[serde(rename = "remove-role")]
    RoleRemoved,
    #[serde(rename = "set-resource")]
    ResourceSet(ResourceList),
    #[serde(rename = "remove-resource")]
    ResourceRemoved,
}

impl SessionEvent {
    pub fn topic(&self) -> Topic {
        match self {
            SessionEvent::SidebarToggled { .. } => Topic::ToggleSidebarCollapse,
            SessionEvent::TokenSet(_) => Topic::SetToken,
            SessionEvent::TokenRemoved => Topic::RemoveToken,
            SessionEvent::UserInfoSet(_) => Topic::SetUserInfo,
            SessionEvent::UserInfoRemoved => Topic::RemoveUserInfo,
            SessionEvent::RoleSet(_) => Topic::SetRole,
            SessionEvent::RoleRemoved => Topic::RemoveRole,
            SessionEvent::ResourceSet(_) => Topic::SetResource,
            SessionEvent::ResourceRemoved => Topic::RemoveResource,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub topic: Topic,
    pub occurred_at: DateTime<Utc>,
    pub event: SessionEvent,
}

impl Notification {
    pub fn new(event: SessionEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: event.topic(),
            occurred_at: Utc::now(),
            event,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&Notification) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    topic: Option<Topic>,
    handler: Handler,
}

#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for a single topic.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.register(Some(topic), Arc::new(handler))
    }

    /// Registers `handler` for every topic.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(handler))
    }

    /// Returns false when `id` was not (or no longer) registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut subscribers) = self.subscribers.write() else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id != id);
        subscribers.len() != before
    }

    pub fn clear(&self) {
        if let Ok(mut subscribers) = self.subscribers.write() {
            subscribers.clear();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Delivers `event` synchronously and returns how many handlers completed.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe or
    /// unsubscribe while being called; such changes apply to the next publish.
    pub fn publish(&self, event: SessionEvent) -> usize {
        let notification = Notification::new(event);
        let topic = notification.topic;

        let handlers: Vec<(SubscriptionId, Handler)> = match self.subscribers.read() {
            Ok(subscribers) => subscribers
                .iter()
                .filter(|s| s.topic.map_or(true, |t| t == topic))
                .map(|s| (s.id, Arc::clone(&s.handler)))
                .collect(),
            Err(_) => {
                tracing::error!(topic = %topic, "subscriber list poisoned, event dropped");
                return 0;
            }
        };

        let mut delivered = 0;
        for (id, handler) in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&notification))) {
                Ok(()) => delivered += 1,
                Err(cause) => {
                    tracing::error!(
                        topic = %topic,
                        subscription = id.0,
                        cause = panic_message(&*cause),
                        "subscriber panicked while handling event"
                    );
                }
            }
        }

        tracing::trace!(topic = %topic, delivered, "event published");
        delivered
    }

    fn register(&self, topic: Option<Topic>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.subscribers.write() {
            Ok(mut subscribers) => subscribers.push(Subscriber { id, topic, handler }),
            Err(_) => tracing::error!("subscriber list poisoned, subscription ignored"),
        }
        id
    }
}

fn panic_message(cause: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = cause.downcast_ref::<&str>() {
        message
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<Topic>>>, impl Fn(&Notification) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |n: &Notification| sink.lock().unwrap().push(n.topic))
    }

    #[test]
    fn delivers_only_matching_topic() {
        let bus = EventBus::new();
        let (seen, handler) = recorder();
        bus.subscribe(Topic::SetToken, handler);

        bus.publish(SessionEvent::TokenSet("t".into()));
        bus.publish(SessionEvent::RoleRemoved);

        assert_eq!(*seen.lock().unwrap(), vec![Topic::SetToken]);
    }

    #[test]
    fn delivers_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe_all(move |_| order.lock().unwrap().push(label));
        }

        assert_eq!(bus.publish(SessionEvent::TokenRemoved), 3);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn panicking_handler_does_not_stop_others() {
        let bus = EventBus::new();
        bus.subscribe_all(|_| panic!("broken subscriber"));
        let (seen, handler) = recorder();
        bus.subscribe_all(handler);

        let delivered = bus.publish(SessionEvent::ResourceRemoved);

        assert_eq!(delivered, 1);
        assert_eq!(*seen.lock().unwrap(), vec![Topic::RemoveResource]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let (seen, handler) = recorder();
        let id = bus.subscribe_all(handler);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(SessionEvent::TokenRemoved);

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn handler_may_subscribe_during_publish() {
        let bus = Arc::new(EventBus::new());
        let inner = Arc::clone(&bus);
        bus.subscribe_all(move |_| {
            inner.subscribe_all(|_| {});
        });

        bus.publish(SessionEvent::TokenRemoved);
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn event_serializes_with_topic_name() {
        let value = serde_json::to_value(SessionEvent::RoleSet(vec!["admin".into()])).unwrap();
        assert_eq!(value["topic"], "set-role");
        assert_eq!(value["payload"][0], "admin");
        assert_eq!(serde_json::to_value(Topic::SetUserInfo).unwrap(), "set-userinfo");
    }

    #[test]
    fn envelope_and_event_agree_on_topic_name() {
        let events = [
            SessionEvent::SidebarToggled { collapsed: true },
            SessionEvent::TokenSet("t".into()),
            SessionEvent::TokenRemoved,
            SessionEvent::UserInfoSet(UserInfo::default()),
            SessionEvent::UserInfoRemoved,
            SessionEvent::RoleSet(vec![]),
            SessionEvent::RoleRemoved,
            SessionEvent::ResourceSet(ResourceList::default()),
            SessionEvent::ResourceRemoved,
        ];

        for event in events {
            let topic = event.topic();
            let value = serde_json::to_value(Notification::new(event)).unwrap();
            assert_eq!(value["topic"], topic.as_str());
            assert_eq!(value["event"]["topic"], value["topic"], "{value}");
        }
    }
}
