use crate::error::TempoError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use tempo_api_structs::delete_event::*;
use tempo_domain::{CalendarEvent, User, ID};
use tempo_infra::TempoContext;

pub async fn delete_event_controller(
    http_req: actix_web::HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let user = protect_route(&http_req, &ctx).await?;

    let usecase = DeleteEventUseCase {
        user,
        event_id: path_params.event_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Ok().json(APIResponse::new(event)))
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct DeleteEventUseCase {
    pub user: User,
    pub event_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    StorageError,
}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(event_id) => {
                Self::NotFound(format!("The event with id: {}, was not found.", event_id))
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteEventUseCase {
    type Response = CalendarEvent;

    type Error = UseCaseError;

    const NAME: &'static str = "DeleteEvent";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        let mut e = match ctx.repos.events.find(&self.event_id).await {
            Some(e) if e.owner_user_id == self.user.id && !e.is_tombstone() => e,
            _ => return Err(UseCaseError::NotFound(self.event_id.clone())),
        };

        // Soft delete: the record stays visible to change feed reads until
        // the purge job removes it
        e.deleted_at = Some(ctx.sys.get_timestamp_millis());

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
    use tempo_api_structs::dtos::EventPayload;
    use tempo_infra::setup_inmemory_context;

    #[actix_web::test]
    async fn tombstones_instead_of_removing() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();

        let mut create = CreateEventUseCase {
            user: user.clone(),
            payload: EventPayload {
                title: "Standup".into(),
                date: "2025-01-10".into(),
                sync_id: Some("evt_1".into()),
                ..Default::default()
            },
        };
        let event = create.execute(&ctx).await.unwrap();

        let mut usecase = DeleteEventUseCase {
            user: user.clone(),
            event_id: event.id.clone(),
        };
        let deleted = usecase.execute(&ctx).await.unwrap();
        assert!(deleted.deleted_at.is_some());

        // Invisible to normal reads
        assert!(ctx.repos.events.find_by_user(&user.id).await.is_empty());
        // Still visible to change feed reads that ask for tombstones
        let changes = ctx.repos.events.find_changes_since(&user.id, 0, true).await;
        assert_eq!(changes.len(), 1);
        assert!(changes[0].deleted_at.is_some());
        // A second delete answers NotFound, the tombstone is never re-deleted
        let mut retry = DeleteEventUseCase {
            user,
            event_id: event.id.clone(),
        };
        assert_eq!(
            retry.execute(&ctx).await.unwrap_err(),
            UseCaseError::NotFound(event.id)
        );
    }
}
