use crate::error::TempoError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use tempo_api_structs::dtos::{GoogleSyncEventDTO, GoogleSyncResultDTO};
use tempo_api_structs::sync_google_events::*;
use tempo_domain::{CalendarEvent, CalendarProvider, EventSyncMapping, SyncState, User};
use tempo_infra::google_calendar::{GoogleCalendarEventAttributes, GoogleCalendarProvider};
use tempo_infra::TempoContext;
use tracing::warn;

const PRIMARY_CALENDAR: &str = "primary";

pub async fn sync_google_events_controller(
    http_req: actix_web::HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let user = protect_route(&http_req, &ctx).await?;

    let usecase = SyncGoogleEventsUseCase {
        user,
        events: body.0.events,
    };

    execute(usecase, &ctx)
        .await
        .map(|report| {
            HttpResponse::Ok().json(APIResponse {
                synced_count: report.synced_count,
                results: report.results,
            })
        })
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct GoogleSyncReport {
    pub results: Vec<GoogleSyncResultDTO>,
    pub synced_count: usize,
}

#[derive(Debug)]
pub struct SyncGoogleEventsUseCase {
    pub user: User,
    pub events: Vec<GoogleSyncEventDTO>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    GoogleNotConnected,
    StorageError,
}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::GoogleNotConnected => {
                Self::BadClientData("The user has not connected a google account".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

/// An event needs a provider push when it was never pushed, or when it was
/// edited after the last recorded provider sync.
pub fn needs_push(e: &CalendarEvent) -> bool {
    if e.sync_state != SyncState::Linked || e.external_id.is_none() {
        return true;
    }
    match e.last_synced_at {
        Some(last_synced_at) => e.updated > last_synced_at,
        None => true,
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SyncGoogleEventsUseCase {
    type Response = GoogleSyncReport;

    type Error = UseCaseError;

    const NAME: &'static str = "SyncGoogleEvents";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        let provider = GoogleCalendarProvider::new(&mut self.user, ctx)
            .await
            .map_err(|_| UseCaseError::GoogleNotConnected)?;

        let mut results = Vec::with_capacity(self.events.len());
        let mut synced_count = 0;

        for item in &self.events {
            // The client id doubles as the sync id bridging token, so a
            // record created by a lost-response retry is found here instead
            // of being pushed twice
            let canonical = ctx
                .repos
                .events
                .find_by_sync_id(&self.user.id, &item.tmr_id)
                .await;

            let mut e = match canonical {
                Some(e) if e.is_tombstone() => {
                    results.push(GoogleSyncResultDTO {
                        tmr_id: item.tmr_id.clone(),
                        action: "skipped_deleted".into(),
                        google_id: e.external_id.clone(),
                    });
                    continue;
                }
                Some(e) => e,
                None => {
                    let now = ctx.sys.get_timestamp_millis();
                    let e = CalendarEvent {
                        id: Default::default(),
                        owner_user_id: self.user.id.clone(),
                        sync_id: item.tmr_id.clone(),
                        title: item.title.clone(),
                        date: item.date.clone(),
                        start_time: item.start_time.clone(),
                        end_time: item.end_time.clone(),
                        description: item.description.clone(),
                        color: item.color.clone(),
                        reminder_minutes: None,
                        reminder_at: None,
                        provider: None,
                        external_id: None,
                        external_calendar_id: None,
                        sync_state: SyncState::Unlinked,
                        last_synced_at: None,
                        external_updated_at: None,
                        source_device: None,
                        created: now,
                        updated: item.last_modified.unwrap_or(now),
                        deleted_at: None,
                    };
                    ctx.repos
                        .events
                        .insert(&e)
                        .await
                        .map_err(|_| UseCaseError::StorageError)?;
                    e
                }
            };

            if !needs_push(&e) {
                results.push(GoogleSyncResultDTO {
                    tmr_id: item.tmr_id.clone(),
                    action: "skipped".into(),
                    google_id: e.external_id.clone(),
                });
                continue;
            }

            let calendar_id = e
                .external_calendar_id
                .clone()
                .unwrap_or_else(|| PRIMARY_CALENDAR.to_string());
            let attributes = GoogleCalendarEventAttributes::from(&e);

            let pushed = match &e.external_id {
                Some(google_id) => provider
                    .update_event(calendar_id.clone(), google_id.clone(), attributes)
                    .await
                    .map(|res| (res, "updated")),
                None => provider
                    .create_event(calendar_id.clone(), attributes)
                    .await
                    .map(|res| (res, "created")),
            };

            let (google_event, action) = match pushed {
                Ok(res) => res,
                Err(_) => {
                    // Transient provider failure: the item is retried on the
                    // next cycle and local state stays untouched
                    warn!(
                        "Google push failed for event with sync id: {}, will retry next cycle",
                        e.sync_id
                    );
                    results.push(GoogleSyncResultDTO {
                        tmr_id: item.tmr_id.clone(),
                        action: "failed".into(),
                        google_id: e.external_id.clone(),
                    });
                    continue;
                }
            };

            let now = ctx.sys.get_timestamp_millis();
            e.provider = Some(CalendarProvider::Google);
            e.external_id = Some(google_event.id.clone());
            e.external_calendar_id = Some(calendar_id.clone());
            e.sync_state = SyncState::Linked;
            e.last_synced_at = Some(now);
            e.external_updated_at = google_event.updated_millis();
            ctx.repos
                .events
                .save(&e)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
            ctx.repos
                .event_sync_mappings
                .upsert(&EventSyncMapping {
                    event_id: e.id.clone(),
                    user_id: self.user.id.clone(),
                    provider: CalendarProvider::Google,
                    external_id: google_event.id.clone(),
                    external_calendar_id: calendar_id,
                    last_synced_at: now,
                })
                .await
                .map_err(|_| UseCaseError::StorageError)?;

            synced_count += 1;
            results.push(GoogleSyncResultDTO {
                tmr_id: item.tmr_id.clone(),
                action: action.into(),
                google_id: Some(google_event.id),
            });
        }

        Ok(GoogleSyncReport {
            results,
            synced_count,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempo_infra::setup_inmemory_context;

    fn linked_event(updated: i64, last_synced_at: Option<i64>) -> CalendarEvent {
        CalendarEvent {
            sync_id: "evt_1".into(),
            title: "Standup".into(),
            date: "2025-01-10".into(),
            external_id: Some("gid_1".into()),
            sync_state: SyncState::Linked,
            updated,
            last_synced_at,
            ..Default::default()
        }
    }

    #[test]
    fn unsynced_or_edited_events_need_a_push() {
        assert!(!needs_push(&linked_event(100, Some(200))));
        assert!(!needs_push(&linked_event(200, Some(200))));
        // Edited after the last provider sync
        assert!(needs_push(&linked_event(300, Some(200))));
        // Never pushed
        assert!(needs_push(&linked_event(100, None)));
        let mut unlinked = linked_event(100, Some(200));
        unlinked.external_id = None;
        assert!(needs_push(&unlinked));
    }

    #[actix_web::test]
    async fn rejects_user_without_google_integration() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();

        let mut usecase = SyncGoogleEventsUseCase {
            user,
            events: vec![],
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::GoogleNotConnected
        );
    }
}
