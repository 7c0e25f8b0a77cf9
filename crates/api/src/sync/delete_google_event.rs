use crate::error::TempoError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use tempo_api_structs::delete_google_event::*;
use tempo_domain::{CalendarProvider, User};
use tempo_infra::google_calendar::GoogleCalendarProvider;
use tempo_infra::TempoContext;
use tracing::warn;

const PRIMARY_CALENDAR: &str = "primary";

pub async fn delete_google_event_controller(
    http_req: actix_web::HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let user = protect_route(&http_req, &ctx).await?;

    let body = body.0;
    let usecase = DeleteGoogleEventUseCase {
        user,
        google_event_id: body.google_event_id,
        tmr_event_id: body.tmr_event_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|_| HttpResponse::Ok().json(APIResponse { ok: true }))
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct DeleteGoogleEventUseCase {
    pub user: User,
    pub google_event_id: Option<String>,
    pub tmr_event_id: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    MissingEventReference,
    StorageError,
}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::MissingEventReference => Self::BadClientData(
                "Either `googleEventId` or `tmrEventId` must be provided".into(),
            ),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteGoogleEventUseCase {
    type Response = ();

    type Error = UseCaseError;

    const NAME: &'static str = "DeleteGoogleEvent";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        if self.google_event_id.is_none() && self.tmr_event_id.is_none() {
            return Err(UseCaseError::MissingEventReference);
        }

        // Resolve the canonical record from whichever reference was given
        let mut canonical = None;
        if let Some(tmr_id) = &self.tmr_event_id {
            canonical = ctx.repos.events.find_by_sync_id(&self.user.id, tmr_id).await;
        }
        if canonical.is_none() {
            if let Some(google_id) = &self.google_event_id {
                if let Some(mapping) = ctx
                    .repos
                    .event_sync_mappings
                    .find_by_external(&self.user.id, CalendarProvider::Google, google_id)
                    .await
                {
                    canonical = ctx.repos.events.find(&mapping.event_id).await;
                }
            }
        }

        let google_event_id = self
            .google_event_id
            .clone()
            .or_else(|| canonical.as_ref().and_then(|e| e.external_id.clone()));
        let calendar_id = canonical
            .as_ref()
            .and_then(|e| e.external_calendar_id.clone())
            .unwrap_or_else(|| PRIMARY_CALENDAR.to_string());

        // The provider-side delete is best effort. A failure here never
        // fails the local operation; the orphan is cleaned up by the next
        // pull's deletion propagation.
        if let Some(google_event_id) = google_event_id {
            match GoogleCalendarProvider::new(&mut self.user, ctx).await {
                Ok(provider) => {
                    if provider
                        .delete_event(calendar_id, google_event_id.clone())
                        .await
                        .is_err()
                    {
                        warn!(
                            "Google delete failed for google event id: {}",
                            google_event_id
                        );
                    }
                }
                Err(_) => warn!("No google access token available for provider delete"),
            }
        }

        if let Some(mut e) = canonical {
            if !e.is_tombstone() {
                e.deleted_at = Some(ctx.sys.get_timestamp_millis());
                ctx.repos
                    .events
                    .save(&e)
                    .await
                    .map_err(|_| UseCaseError::StorageError)?;
            }
            ctx.repos
                .event_sync_mappings
                .delete_by_event(&e.id)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
        }

        Ok(())
    }
}
