mod inmemory;
mod postgres;

pub use inmemory::InMemoryEventRepo;
pub use postgres::PostgresEventRepo;
use tempo_domain::{CalendarEvent, CalendarProvider, ID};

#[async_trait::async_trait]
pub trait IEventRepo: Send + Sync {
    async fn insert(&self, e: &CalendarEvent) -> anyhow::Result<()>;
    async fn save(&self, e: &CalendarEvent) -> anyhow::Result<()>;
    async fn find(&self, event_id: &ID) -> Option<CalendarEvent>;
    /// All live events for a user. Tombstones are excluded.
    async fn find_by_user(&self, user_id: &ID) -> Vec<CalendarEvent>;
    async fn find_by_sync_id(&self, user_id: &ID, sync_id: &str) -> Option<CalendarEvent>;
    async fn find_by_external_id(
        &self,
        user_id: &ID,
        provider: CalendarProvider,
        external_id: &str,
        external_calendar_id: &str,
    ) -> Option<CalendarEvent>;
    /// Change feed: every event whose change cursor is strictly newer than
    /// `since`, tombstones included when `include_deleted` is set. Ordered by
    /// cursor so callers can resume from the last returned watermark.
    async fn find_changes_since(
        &self,
        user_id: &ID,
        since: i64,
        include_deleted: bool,
    ) -> Vec<CalendarEvent>;
    /// Tombstones across all users with `deleted_at` before the given
    /// timestamp. Used by the purge job.
    async fn find_tombstones_before(&self, before: i64) -> Vec<CalendarEvent>;
    /// Hard delete. Only the tombstone purge path may call this.
    async fn delete(&self, event_id: &ID) -> Option<CalendarEvent>;
}
