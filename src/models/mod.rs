pub mod menu;
pub mod resource;
pub mod ui_config;
pub mod user;

pub use menu::{MenuDefinition, MenuNode};
pub use resource::{Resource, ResourceList, ResourceType};
pub use ui_config::UiConfig;
pub use user::UserInfo;
