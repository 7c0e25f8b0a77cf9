mod inmemory;
mod postgres;

use crate::repos::shared::repo::DeleteResult;
pub use inmemory::InMemoryEventSyncMappingRepo;
pub use postgres::PostgresEventSyncMappingRepo;
use tempo_domain::{CalendarProvider, EventSyncMapping, ID};

#[async_trait::async_trait]
pub trait IEventSyncMappingRepo: Send + Sync {
    /// Insert or replace the mapping keyed by `(user, provider, external_id)`.
    async fn upsert(&self, m: &EventSyncMapping) -> anyhow::Result<()>;
    async fn find_by_external(
        &self,
        user_id: &ID,
        provider: CalendarProvider,
        external_id: &str,
    ) -> Option<EventSyncMapping>;
    async fn find_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<EventSyncMapping>>;
    async fn delete_by_event(&self, event_id: &ID) -> anyhow::Result<DeleteResult>;
}
