use serde::{Deserialize, Serialize};
use tempo_domain::ID;

/// The opaque push provider payload: an endpoint url plus whatever key
/// material the provider hands out, stored verbatim.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPayload {
    pub endpoint: String,
    #[serde(default)]
    pub keys: serde_json::Value,
}

pub mod subscribe {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub subscription: SubscriptionPayload,
        #[serde(default)]
        pub device_id: Option<String>,
        #[serde(default)]
        pub user_id: Option<ID>,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub id: ID,
    }
}

pub mod unsubscribe {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(default)]
        pub id: Option<ID>,
        #[serde(default)]
        pub endpoint: Option<String>,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub ok: bool,
    }
}
