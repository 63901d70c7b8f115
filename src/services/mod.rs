pub mod inventory_service;
pub mod notification_hub;
pub mod validation;

pub use inventory_service::{InventoryService, SharedInventoryService};
pub use notification_hub::{NotificationHub, SharedNotificationHub, Subscription};
pub use validation::{ValidationMode, validate};
