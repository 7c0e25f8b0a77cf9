use crate::event::CalendarProvider;
use crate::shared::entity::ID;

/// Bridges a canonical event id to a specific provider's external id and
/// calendar id, scoped per user. Gives O(1) identity lookup during provider
/// pull instead of scanning the event set.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSyncMapping {
    pub event_id: ID,
    pub user_id: ID,
    pub provider: CalendarProvider,
    pub external_id: String,
    pub external_calendar_id: String,
    /// When this provider last observed the canonical record, epoch millis.
    /// Tombstones may only be purged once every mapping has observed them.
    pub last_synced_at: i64,
}
