mod device;
mod event;
mod event_sync_mapping;
pub mod providers;
mod reminder;
mod shared;
mod subscription;
mod user;

pub use device::Device;
pub use event::{CalendarEvent, CalendarProvider, SyncState};
pub use event_sync_mapping::EventSyncMapping;
pub use reminder::{Reminder, ReminderTarget};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use subscription::Subscription;
pub use user::{User, UserGoogleIntegration};
