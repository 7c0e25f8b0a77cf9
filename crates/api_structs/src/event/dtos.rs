use serde::{Deserialize, Serialize};
use tempo_domain::{CalendarEvent, CalendarProvider, SyncState, ID};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventDTO {
    pub id: ID,
    pub owner_user_id: ID,
    pub sync_id: String,
    pub title: String,
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub reminder_minutes: Option<i64>,
    pub reminder_at: Option<i64>,
    pub provider: Option<CalendarProvider>,
    pub external_id: Option<String>,
    pub external_calendar_id: Option<String>,
    pub sync_state: SyncState,
    pub last_synced_at: Option<i64>,
    pub external_updated_at: Option<i64>,
    pub source_device: Option<String>,
    pub created: i64,
    pub updated: i64,
    pub deleted_at: Option<i64>,
}

impl CalendarEventDTO {
    pub fn new(event: CalendarEvent) -> Self {
        Self {
            id: event.id.clone(),
            owner_user_id: event.owner_user_id.clone(),
            sync_id: event.sync_id,
            title: event.title,
            date: event.date,
            start_time: event.start_time,
            end_time: event.end_time,
            description: event.description,
            color: event.color,
            reminder_minutes: event.reminder_minutes,
            reminder_at: event.reminder_at,
            provider: event.provider,
            external_id: event.external_id,
            external_calendar_id: event.external_calendar_id,
            sync_state: event.sync_state,
            last_synced_at: event.last_synced_at,
            external_updated_at: event.external_updated_at,
            source_device: event.source_device,
            created: event.created,
            updated: event.updated,
            deleted_at: event.deleted_at,
        }
    }
}

/// The mutable event fields a client submits on create and update. The
/// `sync_id` is minted on the creating side and makes retried creates
/// idempotent.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub reminder_minutes: Option<i64>,
    #[serde(default)]
    pub reminder_at: Option<i64>,
    #[serde(default)]
    pub sync_id: Option<String>,
    #[serde(default)]
    pub provider: Option<CalendarProvider>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub external_calendar_id: Option<String>,
    #[serde(default)]
    pub sync_state: Option<SyncState>,
    #[serde(default)]
    pub last_synced_at: Option<i64>,
    #[serde(default)]
    pub source_device: Option<String>,
}
