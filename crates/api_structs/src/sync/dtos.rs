use serde::{Deserialize, Serialize};

/// One local event submitted for a provider push. `tmr_id` is the client's
/// own id for the event; it doubles as the `sync_id` bridging token when the
/// canonical record does not exist yet.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSyncEventDTO {
    pub tmr_id: String,
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
    pub last_modified: Option<i64>,
}

/// Per-item outcome of a provider push batch. A stale or already synced item
/// still reports an action; it never fails the batch.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSyncResultDTO {
    pub tmr_id: String,
    pub action: String,
    pub google_id: Option<String>,
}

/// Per-item outcome of a device-sync upsert batch.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AppleSyncResultDTO {
    pub external_id: String,
    pub action: String,
}
