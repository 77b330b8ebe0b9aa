pub mod authz;
pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod session;
pub mod storage;

// Re-export commonly used items for consumers and tests
pub use authz::{AuthzMode, PermissionCheck, PermissionEngine};
pub use config::GuardConfig;
pub use events::{EventBus, Notification, SessionEvent, Topic};
pub use session::SessionStore;
