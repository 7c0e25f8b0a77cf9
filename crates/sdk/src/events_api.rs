use crate::base::{APIResponse, BaseClient};
use reqwest::StatusCode;
use tempo_api_structs::dtos::{CalendarEventDTO, EventPayload};
use tempo_api_structs::{create_event, get_events};
use tempo_domain::ID;

/// The slice of the server api the reconciler depends on. A trait so tests
/// can reconcile against a fake server without a network.
#[async_trait::async_trait]
pub trait EventsApi: Send + Sync {
    /// The server's current live event list for the authenticated user
    async fn list_events(&self) -> APIResponse<Vec<CalendarEventDTO>>;
    /// Creates a canonical record and returns its server id. Idempotent
    /// under retry when the payload carries a sync id.
    async fn create_event(&self, payload: EventPayload) -> APIResponse<ID>;
}

pub struct HttpEventsApi {
    base: BaseClient,
}

impl HttpEventsApi {
    pub fn new(address: String, api_key: String) -> Self {
        let mut base = BaseClient::new(address);
        base.set_api_key(api_key);
        Self { base }
    }
}

#[async_trait::async_trait]
impl EventsApi for HttpEventsApi {
    async fn list_events(&self) -> APIResponse<Vec<CalendarEventDTO>> {
        let res: get_events::APIResponse = self.base.get("events".into(), StatusCode::OK).await?;
        Ok(res.events)
    }

    async fn create_event(&self, payload: EventPayload) -> APIResponse<ID> {
        let body = create_event::RequestBody { event: payload };
        let res: create_event::APIResponse = self
            .base
            .post(body, "events/create".into(), StatusCode::CREATED)
            .await?;
        Ok(res.event_id)
    }
}
