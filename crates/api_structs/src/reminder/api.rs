use serde::{Deserialize, Serialize};
use tempo_domain::ID;

pub mod create_reminder {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(default)]
        pub subscription_id: Option<ID>,
        #[serde(default)]
        pub user_id: Option<ID>,
        pub title: String,
        pub body: String,
        #[serde(default)]
        pub deliver_at: Option<i64>,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub reminder_id: ID,
    }
}
