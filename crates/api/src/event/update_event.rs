use crate::error::TempoError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use tempo_api_structs::dtos::EventPayload;
use tempo_api_structs::update_event::*;
use tempo_domain::{CalendarEvent, User, ID};
use tempo_infra::TempoContext;

pub async fn update_event_controller(
    http_req: actix_web::HttpRequest,
    path_params: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let user = protect_route(&http_req, &ctx).await?;

    let usecase = UpdateEventUseCase {
        user,
        event_id: path_params.event_id.clone(),
        payload: body.0.event,
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Ok().json(APIResponse::new(event)))
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct UpdateEventUseCase {
    pub user: User,
    pub event_id: ID,
    pub payload: EventPayload,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    MissingField(&'static str),
    StorageError,
}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(event_id) => {
                Self::NotFound(format!("The event with id: {}, was not found.", event_id))
            }
            UseCaseError::MissingField(field) => {
                Self::BadClientData(format!("The required field `{}` is missing", field))
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for UpdateEventUseCase {
    type Response = CalendarEvent;

    type Error = UseCaseError;

    const NAME: &'static str = "UpdateEvent";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        if self.payload.date.is_empty() {
            return Err(UseCaseError::MissingField("date"));
        }

        // Cross-user access answers NotFound, existence is never leaked
        let mut e = match ctx.repos.events.find(&self.event_id).await {
            Some(e) if e.owner_user_id == self.user.id && !e.is_tombstone() => e,
            _ => return Err(UseCaseError::NotFound(self.event_id.clone())),
        };

        // Whole record replace of the mutable fields, not a field level patch
        e.title = self.payload.title.clone();
        e.date = self.payload.date.clone();
        e.start_time = self.payload.start_time.clone();
        e.end_time = self.payload.end_time.clone();
        e.description = self.payload.description.clone();
        e.color = self.payload.color.clone();
        e.reminder_minutes = self.payload.reminder_minutes;
        e.reminder_at = self.payload.reminder_at;
        if let Some(provider) = self.payload.provider {
            e.provider = Some(provider);
        }
        if let Some(external_id) = &self.payload.external_id {
            e.external_id = Some(external_id.clone());
        }
        if let Some(external_calendar_id) = &self.payload.external_calendar_id {
            e.external_calendar_id = Some(external_calendar_id.clone());
        }
        if let Some(sync_state) = self.payload.sync_state {
            e.sync_state = sync_state;
        }
        if let Some(last_synced_at) = self.payload.last_synced_at {
            e.last_synced_at = Some(last_synced_at);
        }
        if let Some(source_device) = &self.payload.source_device {
            e.source_device = Some(source_device.clone());
        }
        e.updated = ctx.sys.get_timestamp_millis();

        ctx.repos
            .events
            .save(&e)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::create_event::CreateEventUseCase;
    use tempo_infra::setup_inmemory_context;

    async fn created_event(ctx: &TempoContext, user: &User) -> CalendarEvent {
        let mut usecase = CreateEventUseCase {
            user: user.clone(),
            payload: EventPayload {
                title: "Standup".into(),
                date: "2025-01-10".into(),
                start_time: Some("09:00".into()),
                sync_id: Some("evt_1".into()),
                ..Default::default()
            },
        };
        usecase.execute(ctx).await.unwrap()
    }

    #[actix_web::test]
    async fn replaces_the_mutable_fields() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();
        let event = created_event(&ctx, &user).await;

        let mut usecase = UpdateEventUseCase {
            user: user.clone(),
            event_id: event.id.clone(),
            payload: EventPayload {
                title: "Standup (moved)".into(),
                date: "2025-01-11".into(),
                ..Default::default()
            },
        };
        let updated = usecase.execute(&ctx).await.unwrap();

        assert_eq!(updated.title, "Standup (moved)");
        assert_eq!(updated.date, "2025-01-11");
        // Fields absent from the payload are cleared, not kept
        assert_eq!(updated.start_time, None);
        assert_eq!(updated.sync_id, event.sync_id);
    }

    #[actix_web::test]
    async fn cross_user_update_answers_not_found() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        let intruder = User::new("other".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();
        ctx.repos.users.insert(&intruder).await.unwrap();
        let event = created_event(&ctx, &user).await;

        let mut usecase = UpdateEventUseCase {
            user: intruder,
            event_id: event.id.clone(),
            payload: EventPayload {
                title: "hijacked".into(),
                date: "2025-01-10".into(),
                ..Default::default()
            },
        };
        let res = usecase.execute(&ctx).await;
        assert_eq!(res.unwrap_err(), UseCaseError::NotFound(event.id.clone()));

        let unchanged = ctx.repos.events.find(&event.id).await.unwrap();
        assert_eq!(unchanged.title, "Standup");
    }
}
