use crate::error::TempoError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use tempo_api_structs::get_events::*;
use tempo_domain::{CalendarEvent, ID};
use tempo_infra::TempoContext;

pub async fn get_events_controller(
    http_req: actix_web::HttpRequest,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let user = protect_route(&http_req, &ctx).await?;

    let usecase = GetEventsUseCase { user_id: user.id };

    execute(usecase, &ctx)
        .await
        .map(|events| HttpResponse::Ok().json(APIResponse::new(events)))
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct GetEventsUseCase {
    pub user_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {}
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetEventsUseCase {
    type Response = Vec<CalendarEvent>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetEvents";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        Ok(ctx.repos.events.find_by_user(&self.user_id).await)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::create_event::CreateEventUseCase;
    use tempo_api_structs::dtos::EventPayload;
    use tempo_domain::User;
    use tempo_infra::setup_inmemory_context;

    #[actix_web::test]
    async fn lists_only_live_events_for_the_user() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        let other = User::new("other".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();
        ctx.repos.users.insert(&other).await.unwrap();

        for (owner, sync_id) in [(&user, "evt_1"), (&user, "evt_2"), (&other, "evt_3")] {
            let mut usecase = CreateEventUseCase {
                user: owner.clone(),
                payload: EventPayload {
                    title: "Standup".into(),
                    date: "2025-01-10".into(),
                    sync_id: Some(sync_id.into()),
                    ..Default::default()
                },
            };
            usecase.execute(&ctx).await.unwrap();
        }

        // Tombstone one of the user's events
        let mut tombstoned = ctx
            .repos
            .events
            .find_by_sync_id(&user.id, "evt_2")
            .await
            .unwrap();
        tombstoned.deleted_at = Some(100);
        ctx.repos.events.save(&tombstoned).await.unwrap();

        let mut usecase = GetEventsUseCase {
            user_id: user.id.clone(),
        };
        let events = usecase.execute(&ctx).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sync_id, "evt_1");
    }
}
