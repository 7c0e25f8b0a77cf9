use crate::shared::entity::{Entity, ID};

/// A registered push endpoint. The dedup key is the `endpoint` value, not the
/// row id: registering the same endpoint twice must yield one row.
///
/// Subscriptions are hard deleted when the push provider confirms the
/// endpoint is permanently gone, never soft deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: ID,
    /// Anonymous subscriptions are device-scoped and carry no user
    pub user_id: Option<ID>,
    /// Device identifier for anonymous subscriptions
    pub device_id: Option<String>,
    pub endpoint: String,
    /// Opaque provider payload (encryption keys etc), stored verbatim
    pub keys: serde_json::Value,
    /// Consecutive transient delivery failures. Reset on a successful
    /// delivery, incremented on transient failure, and the subscription is
    /// pruned once it reaches the registry threshold.
    pub failure_count: i64,
    pub created: i64,
}

impl Entity for Subscription {
    fn id(&self) -> &ID {
        &self.id
    }
}
