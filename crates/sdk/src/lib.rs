mod base;
mod events_api;
mod reconciler;
mod store;

pub use base::{APIError, APIResponse};
pub use events_api::{EventsApi, HttpEventsApi};
pub use reconciler::{EventChangeObserver, LocalEvent, ReconcileError, Reconciler};
pub use store::{InMemoryKeyValueStore, KeyValueStore, LocalEventCache};

pub use tempo_api_structs::dtos::CalendarEventDTO;
pub use tempo_api_structs::dtos::EventPayload;
pub use tempo_domain::ID;
