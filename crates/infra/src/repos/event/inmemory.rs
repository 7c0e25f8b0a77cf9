use super::IEventRepo;
use crate::repos::shared::inmemory_repo::*;
use tempo_domain::{CalendarEvent, CalendarProvider, ID};

pub struct InMemoryEventRepo {
    calendar_events: std::sync::Mutex<Vec<CalendarEvent>>,
}

impl InMemoryEventRepo {
    pub fn new() -> Self {
        Self {
            calendar_events: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for InMemoryEventRepo {
    async fn insert(&self, e: &CalendarEvent) -> anyhow::Result<()> {
        insert(e, &self.calendar_events);
        Ok(())
    }

    async fn save(&self, e: &CalendarEvent) -> anyhow::Result<()> {
        save(e, &self.calendar_events);
        Ok(())
    }

    async fn find(&self, event_id: &ID) -> Option<CalendarEvent> {
        find(event_id, &self.calendar_events)
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<CalendarEvent> {
        find_by(&self.calendar_events, |e| {
            e.owner_user_id == *user_id && !e.is_tombstone()
        })
    }

    async fn find_by_sync_id(&self, user_id: &ID, sync_id: &str) -> Option<CalendarEvent> {
        find_by(&self.calendar_events, |e| {
            e.owner_user_id == *user_id && e.sync_id == sync_id
        })
        .into_iter()
        .next()
    }

    async fn find_by_external_id(
        &self,
        user_id: &ID,
        provider: CalendarProvider,
        external_id: &str,
        external_calendar_id: &str,
    ) -> Option<CalendarEvent> {
        find_by(&self.calendar_events, |e| {
            e.owner_user_id == *user_id
                && e.provider == Some(provider)
                && e.external_id.as_deref() == Some(external_id)
                && e.external_calendar_id.as_deref() == Some(external_calendar_id)
        })
        .into_iter()
        .next()
    }

    async fn find_changes_since(
        &self,
        user_id: &ID,
        since: i64,
        include_deleted: bool,
    ) -> Vec<CalendarEvent> {
        let mut changes = find_by(&self.calendar_events, |e| {
            e.owner_user_id == *user_id
                && e.change_cursor() > since
                && (include_deleted || !e.is_tombstone())
        });
        changes.sort_by_key(|e| e.change_cursor());
        changes
    }

    async fn find_tombstones_before(&self, before: i64) -> Vec<CalendarEvent> {
        find_by(&self.calendar_events, |e| {
            matches!(e.deleted_at, Some(deleted_at) if deleted_at < before)
        })
    }

    async fn delete(&self, event_id: &ID) -> Option<CalendarEvent> {
        delete(event_id, &self.calendar_events)
    }
}
