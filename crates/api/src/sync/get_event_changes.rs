use crate::error::TempoError;
use crate::shared::{
    auth::protect_sync_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use tempo_api_structs::dtos::CalendarEventDTO;
use tempo_api_structs::get_event_changes::*;
use tempo_domain::{CalendarEvent, ID};
use tempo_infra::TempoContext;

/// Serves both the provider-agnostic and the apple-specific changes route;
/// the feed itself is identical, only the auth scheme differs.
pub async fn get_event_changes_controller(
    http_req: actix_web::HttpRequest,
    query_params: web::Query<QueryParams>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let (user, _device) = protect_sync_route(&http_req, &ctx).await?;

    let usecase = GetEventChangesUseCase {
        user_id: user.id,
        since: query_params.since.unwrap_or(0),
        include_deleted: query_params.include_deleted(),
    };

    execute(usecase, &ctx)
        .await
        .map(|events| {
            HttpResponse::Ok().json(APIResponse {
                events: events.into_iter().map(CalendarEventDTO::new).collect(),
            })
        })
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct GetEventChangesUseCase {
    pub user_id: ID,
    /// Cursor: the change watermark of the last record the caller has seen
    pub since: i64,
    pub include_deleted: bool,
}

#[derive(Debug)]
pub enum UseCaseError {}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {}
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetEventChangesUseCase {
    type Response = Vec<CalendarEvent>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetEventChanges";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        Ok(ctx
            .repos
            .events
            .find_changes_since(&self.user_id, self.since, self.include_deleted)
            .await)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempo_domain::User;
    use tempo_infra::setup_inmemory_context;

    fn event(user: &User, sync_id: &str, updated: i64, deleted_at: Option<i64>) -> CalendarEvent {
        CalendarEvent {
            owner_user_id: user.id.clone(),
            sync_id: sync_id.into(),
            title: sync_id.into(),
            date: "2025-01-10".into(),
            updated,
            deleted_at,
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn cursor_filters_and_orders_the_feed() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();

        ctx.repos
            .events
            .insert(&event(&user, "evt_old", 100, None))
            .await
            .unwrap();
        ctx.repos
            .events
            .insert(&event(&user, "evt_new", 300, None))
            .await
            .unwrap();
        // Updated at 150 but tombstoned at 250: the deletion moves the cursor
        ctx.repos
            .events
            .insert(&event(&user, "evt_deleted", 150, Some(250)))
            .await
            .unwrap();

        let mut usecase = GetEventChangesUseCase {
            user_id: user.id.clone(),
            since: 200,
            include_deleted: true,
        };
        let changes = usecase.execute(&ctx).await.unwrap();
        let ids: Vec<&str> = changes.iter().map(|e| e.sync_id.as_str()).collect();
        assert_eq!(ids, vec!["evt_deleted", "evt_new"]);

        // Resuming from the last returned watermark yields nothing new
        let mut resumed = GetEventChangesUseCase {
            user_id: user.id.clone(),
            since: changes.last().unwrap().change_cursor(),
            include_deleted: true,
        };
        assert!(resumed.execute(&ctx).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn tombstones_hidden_unless_requested() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();

        ctx.repos
            .events
            .insert(&event(&user, "evt_deleted", 150, Some(250)))
            .await
            .unwrap();

        let mut usecase = GetEventChangesUseCase {
            user_id: user.id.clone(),
            since: 0,
            include_deleted: false,
        };
        assert!(usecase.execute(&ctx).await.unwrap().is_empty());

        let mut with_deleted = GetEventChangesUseCase {
            user_id: user.id.clone(),
            since: 0,
            include_deleted: true,
        };
        let changes = with_deleted.execute(&ctx).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].deleted_at.is_some());
    }
}
