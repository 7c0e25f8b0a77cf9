use crate::shared::entity::{Entity, ID};

/// A non-interactive sync agent registered by a user. The `token` is a
/// long-lived credential, distinct from an interactive session token, sent
/// as `Authorization: Device <token>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: ID,
    pub user_id: ID,
    pub label: String,
    pub token: String,
    pub created: i64,
}

impl Entity for Device {
    fn id(&self) -> &ID {
        &self.id
    }
}
