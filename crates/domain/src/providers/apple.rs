use crate::event::SyncState;
use serde::{Deserialize, Serialize};

/// One item of a device-sync upsert batch, keyed by
/// `external_id` + `external_calendar_id`. An item flagged `deleted` asks the
/// canonical store to tombstone the record, not to remove it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleCalendarItem {
    pub external_id: String,
    pub external_calendar_id: String,
    pub title: String,
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub sync_state: Option<SyncState>,
    pub last_synced_at: Option<i64>,
    /// The device's notion of when this item last changed, epoch millis
    pub external_updated_at: Option<i64>,
    #[serde(default)]
    pub deleted: bool,
}
