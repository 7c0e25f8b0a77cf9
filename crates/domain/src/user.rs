use crate::shared::entity::{Entity, ID};

/// OAuth tokens for the user's Google Calendar integration. The access token
/// is refreshed proactively when `access_token_expires_ts` has passed and the
/// refreshed tokens are persisted before use.
#[derive(Debug, Clone, PartialEq)]
pub struct UserGoogleIntegration {
    pub access_token: String,
    pub access_token_expires_ts: i64,
    pub refresh_token: String,
}

/// The current user identity. Authentication itself happens elsewhere; this
/// record only carries the opaque API token the auth guard resolves and any
/// provider integrations the user has connected.
#[derive(Debug, Clone)]
pub struct User {
    pub id: ID,
    pub api_token: String,
    pub google: Option<UserGoogleIntegration>,
    pub created: i64,
}

impl User {
    pub fn new(api_token: String, created: i64) -> Self {
        Self {
            id: Default::default(),
            api_token,
            google: None,
            created,
        }
    }
}

impl Entity for User {
    fn id(&self) -> &ID {
        &self.id
    }
}
