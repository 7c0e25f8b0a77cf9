use crate::error::TempoError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use tempo_api_structs::create_event::*;
use tempo_api_structs::dtos::EventPayload;
use tempo_domain::{CalendarEvent, User, ID};
use tempo_infra::TempoContext;

pub async fn create_event_controller(
    http_req: actix_web::HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let user = protect_route(&http_req, &ctx).await?;

    let usecase = CreateEventUseCase {
        user,
        payload: body.0.event,
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Created().json(APIResponse { event_id: event.id }))
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct CreateEventUseCase {
    pub user: User,
    pub payload: EventPayload,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    MissingField(&'static str),
    StorageError,
}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::MissingField(field) => {
                Self::BadClientData(format!("The required field `{}` is missing", field))
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateEventUseCase {
    type Response = CalendarEvent;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateEvent";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        if self.payload.date.is_empty() {
            return Err(UseCaseError::MissingField("date"));
        }
        if self.payload.title.is_empty() {
            return Err(UseCaseError::MissingField("title"));
        }

        // The sync id makes a retried create idempotent: when a prior attempt
        // succeeded but the response was lost, the second attempt must find
        // the existing record instead of creating a duplicate.
        let sync_id = self
            .payload
            .sync_id
            .clone()
            .unwrap_or_else(|| ID::default().as_string());
        if let Some(existing) = ctx
            .repos
            .events
            .find_by_sync_id(&self.user.id, &sync_id)
            .await
        {
            return Ok(existing);
        }

        let now = ctx.sys.get_timestamp_millis();
        let e = CalendarEvent {
            id: Default::default(),
            owner_user_id: self.user.id.clone(),
            sync_id,
            title: self.payload.title.clone(),
            date: self.payload.date.clone(),
            start_time: self.payload.start_time.clone(),
            end_time: self.payload.end_time.clone(),
            description: self.payload.description.clone(),
            color: self.payload.color.clone(),
            reminder_minutes: self.payload.reminder_minutes,
            reminder_at: self.payload.reminder_at,
            provider: self.payload.provider,
            external_id: self.payload.external_id.clone(),
            external_calendar_id: self.payload.external_calendar_id.clone(),
            sync_state: self.payload.sync_state.unwrap_or_default(),
            last_synced_at: self.payload.last_synced_at,
            external_updated_at: None,
            source_device: self.payload.source_device.clone(),
            created: now,
            updated: now,
            deleted_at: None,
        };

        ctx.repos
            .events
            .insert(&e)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(e)
    }
}
