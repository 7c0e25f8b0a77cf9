use crate::dtos::{AppleSyncResultDTO, CalendarEventDTO, GoogleSyncEventDTO, GoogleSyncResultDTO};
use serde::{Deserialize, Serialize};
use tempo_domain::providers::apple::AppleCalendarItem;
use tempo_domain::ID;

pub mod sync_google_events {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(default)]
        pub user_id: Option<ID>,
        pub events: Vec<GoogleSyncEventDTO>,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub results: Vec<GoogleSyncResultDTO>,
        pub synced_count: usize,
    }
}

pub mod fetch_google_events {
    use super::*;

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        /// Accepted for wire compatibility, the authenticated identity
        /// always decides whose calendars are pulled
        #[serde(default)]
        pub user_id: Option<ID>,
        #[serde(default)]
        pub days_back: Option<i64>,
        #[serde(default)]
        pub days_forward: Option<i64>,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub ok: bool,
        pub events: Vec<CalendarEventDTO>,
    }
}

pub mod delete_google_event {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(default)]
        pub google_event_id: Option<String>,
        #[serde(default)]
        pub tmr_event_id: Option<String>,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub ok: bool,
    }
}

pub mod connect_google_account {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub code: String,
        pub redirect_uri: String,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub ok: bool,
    }
}

pub mod upsert_apple_events {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(default)]
        pub source_device: Option<String>,
        pub events: Vec<AppleCalendarItem>,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub results: Vec<AppleSyncResultDTO>,
        pub synced_count: usize,
    }
}

pub mod get_event_changes {
    use super::*;

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        #[serde(default)]
        pub since: Option<i64>,
        /// Truthy values: `1` or `true`
        #[serde(default)]
        pub include_deleted: Option<String>,
    }

    impl QueryParams {
        pub fn include_deleted(&self) -> bool {
            matches!(self.include_deleted.as_deref(), Some("1") | Some("true"))
        }
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub events: Vec<CalendarEventDTO>,
    }
}

pub mod register_device {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub label: String,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub device_token: String,
    }
}
