use super::IEventSyncMappingRepo;
use crate::repos::shared::inmemory_repo::*;
use crate::repos::shared::repo::DeleteResult;
use tempo_domain::{CalendarProvider, EventSyncMapping, ID};

pub struct InMemoryEventSyncMappingRepo {
    mappings: std::sync::Mutex<Vec<EventSyncMapping>>,
}

impl InMemoryEventSyncMappingRepo {
    pub fn new() -> Self {
        Self {
            mappings: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IEventSyncMappingRepo for InMemoryEventSyncMappingRepo {
    async fn upsert(&self, m: &EventSyncMapping) -> anyhow::Result<()> {
        delete_by(&self.mappings, |existing| {
            existing.user_id == m.user_id
                && existing.provider == m.provider
                && existing.external_id == m.external_id
        });
        insert(m, &self.mappings);
        Ok(())
    }

    async fn find_by_external(
        &self,
        user_id: &ID,
        provider: CalendarProvider,
        external_id: &str,
    ) -> Option<EventSyncMapping> {
        find_by(&self.mappings, |m| {
            m.user_id == *user_id && m.provider == provider && m.external_id == external_id
        })
        .into_iter()
        .next()
    }

    async fn find_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<EventSyncMapping>> {
        Ok(find_by(&self.mappings, |m| m.event_id == *event_id))
    }

    async fn delete_by_event(&self, event_id: &ID) -> anyhow::Result<DeleteResult> {
        Ok(delete_by(&self.mappings, |m| m.event_id == *event_id))
    }
}
