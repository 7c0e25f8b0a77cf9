use super::fallback::claim_fallback;
use crate::error::TempoError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use tempo_api_structs::dtos::CalendarEventDTO;
use tempo_api_structs::fetch_google_events::*;
use tempo_domain::providers::google::GoogleCalendarAccessRole;
use tempo_domain::{CalendarEvent, CalendarProvider, EventSyncMapping, SyncState, User, ID};
use tempo_infra::google_calendar::{GoogleCalendarEvent, GoogleCalendarProvider};
use tempo_infra::TempoContext;
use tracing::warn;

const DEFAULT_DAYS_BACK: i64 = 30;
const DEFAULT_DAYS_FORWARD: i64 = 60;
const DAY_MILLIS: i64 = 1000 * 60 * 60 * 24;

pub async fn fetch_google_events_controller(
    http_req: actix_web::HttpRequest,
    query_params: web::Query<QueryParams>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let user = protect_route(&http_req, &ctx).await?;

    let usecase = FetchGoogleEventsUseCase {
        user,
        days_back: query_params.days_back.unwrap_or(DEFAULT_DAYS_BACK).max(0),
        days_forward: query_params
            .days_forward
            .unwrap_or(DEFAULT_DAYS_FORWARD)
            .max(0),
    };

    execute(usecase, &ctx)
        .await
        .map(|report| {
            HttpResponse::Ok().json(APIResponse {
                ok: report.ok,
                events: report.events.into_iter().map(CalendarEventDTO::new).collect(),
            })
        })
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct FetchReport {
    /// False when any provider call failed. Canonical state is never
    /// corrupted by a partial pull; the failed part is retried next cycle.
    pub ok: bool,
    pub events: Vec<CalendarEvent>,
}

#[derive(Debug)]
pub struct FetchGoogleEventsUseCase {
    pub user: User,
    pub days_back: i64,
    pub days_forward: i64,
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

fn date_string(ts: i64) -> String {
    Utc.timestamp_millis_opt(ts)
        .single()
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d")
        .to_string()
}

/// Inclusive calendar-day window `(first_day, last_day)` around `now`.
/// ISO dates compare lexicographically, so the bounds double as string
/// comparison bounds.
fn window_dates(now: i64, days_back: i64, days_forward: i64) -> (String, String) {
    (
        date_string(now - days_back * DAY_MILLIS),
        date_string(now + days_forward * DAY_MILLIS),
    )
}

fn apply_google_event(e: &mut CalendarEvent, g: &GoogleCalendarEvent, calendar_id: &str, now: i64) {
    e.title = g.summary.clone();
    if let Some(date) = g.start.date_part() {
        e.date = date;
    }
    e.start_time = g.start.time_part();
    e.end_time = g.end.as_ref().and_then(|end| end.time_part());
    e.description = g.description.clone();
    e.color = g.color_hex();
    e.provider = Some(CalendarProvider::Google);
    e.external_id = Some(g.id.clone());
    e.external_calendar_id = Some(calendar_id.to_string());
    e.sync_state = SyncState::Linked;
    e.last_synced_at = Some(now);
    e.external_updated_at = g.updated_millis();
    e.updated = now;
}

#[async_trait::async_trait(?Send)]
impl UseCase for FetchGoogleEventsUseCase {
    type Response = FetchReport;

    type Error = UseCaseError;

    const NAME: &'static str = "FetchGoogleEvents";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        let provider = GoogleCalendarProvider::new(&mut self.user, ctx)
            .await
            .map_err(|_| UseCaseError::GoogleNotConnected)?;

        let now = ctx.sys.get_timestamp_millis();
        let time_min = now - self.days_back * DAY_MILLIS;
        let time_max = now + self.days_forward * DAY_MILLIS;
        let (date_min, date_max) = window_dates(now, self.days_back, self.days_forward);

        let mut ok = true;
        // Calendars whose event list was pulled completely. Deletions are
        // only propagated for these; a partial pull must never look like a
        // mass deletion.
        let mut pulled_calendars: HashSet<String> = HashSet::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        let calendars = match provider.list(GoogleCalendarAccessRole::Writer).await {
            Ok(res) => res.items,
            Err(_) => {
                warn!("Google calendar list failed, pull skipped for this cycle");
                return Ok(FetchReport {
                    ok: false,
                    events: ctx.repos.events.find_by_user(&self.user.id).await,
                });
            }
        };

        for calendar in &calendars {
            let listed = match provider
                .list_events(calendar.id.clone(), time_min, time_max)
                .await
            {
                Ok(res) => res.items,
                Err(_) => {
                    ok = false;
                    continue;
                }
            };
            pulled_calendars.insert(calendar.id.clone());

            // Fallback candidates are claimed as they match, so two pulls
            // with identical title, day and start time in one batch can
            // never link to the same local record
            let mut locals = ctx.repos.events.find_by_user(&self.user.id).await;
            for g in &listed {
                if g.is_cancelled() {
                    continue;
                }
                seen.insert((calendar.id.clone(), g.id.clone()));

                let existing = ctx
                    .repos
                    .events
                    .find_by_external_id(
                        &self.user.id,
                        CalendarProvider::Google,
                        &g.id,
                        &calendar.id,
                    )
                    .await;

                let mut e = match existing {
                    Some(e) => {
                        if e.supersedes(g.updated_millis()) || e.is_tombstone() {
                            continue;
                        }
                        e
                    }
                    None => {
                        // No id link yet: try the best-effort duplicate
                        // heuristic before creating a fresh record
                        let matched = claim_fallback(
                            &mut locals,
                            &g.summary,
                            &g.start.date_part().unwrap_or_default(),
                            g.start.time_part().as_deref(),
                        );
                        match matched {
                            Some(local) => local,
                            None => CalendarEvent {
                                id: Default::default(),
                                owner_user_id: self.user.id.clone(),
                                sync_id: ID::default().as_string(),
                                created: now,
                                ..Default::default()
                            },
                        }
                    }
                };

                let is_new = ctx.repos.events.find(&e.id).await.is_none();
                apply_google_event(&mut e, g, &calendar.id, now);
                let stored = if is_new {
                    ctx.repos.events.insert(&e).await
                } else {
                    ctx.repos.events.save(&e).await
                };
                stored.map_err(|_| UseCaseError::StorageError)?;

                ctx.repos
                    .event_sync_mappings
                    .upsert(&EventSyncMapping {
                        event_id: e.id.clone(),
                        user_id: self.user.id.clone(),
                        provider: CalendarProvider::Google,
                        external_id: g.id.clone(),
                        external_calendar_id: calendar.id.clone(),
                        last_synced_at: now,
                    })
                    .await
                    .map_err(|_| UseCaseError::StorageError)?;
            }
        }

        // Upstream deletions: a linked event inside the pulled window whose
        // google id no longer appears has been removed on the provider side.
        // Local copies with unsynced edits are kept.
        for mut e in ctx.repos.events.find_by_user(&self.user.id).await {
            if e.provider != Some(CalendarProvider::Google) {
                continue;
            }
            let (google_id, calendar_id) = match (&e.external_id, &e.external_calendar_id) {
                (Some(google_id), Some(calendar_id)) => (google_id.clone(), calendar_id.clone()),
                _ => continue,
            };
            if !pulled_calendars.contains(&calendar_id) {
                continue;
            }
            if e.date < date_min || e.date > date_max {
                continue;
            }
            if seen.contains(&(calendar_id, google_id)) {
                continue;
            }
            let has_unsynced_edits = match e.last_synced_at {
                Some(last_synced_at) => e.updated > last_synced_at,
                None => true,
            };
            if has_unsynced_edits {
                continue;
            }
            e.deleted_at = Some(now);
            ctx.repos
                .events
                .save(&e)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
        }

        Ok(FetchReport {
            ok,
            events: ctx.repos.events.find_by_user(&self.user.id).await,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn window_bounds_are_iso_days() {
        // 2025-01-10T12:00:00Z
        let now = 1736510400000;
        let (min, max) = window_dates(now, 2, 3);
        assert_eq!(min, "2025-01-08");
        assert_eq!(max, "2025-01-13");
        assert!("2025-01-10" > min.as_str() && "2025-01-10" < max.as_str());
    }

    #[test]
    fn google_fields_map_onto_the_canonical_record() {
        use tempo_infra::google_calendar::GoogleCalendarEvent;

        let g: GoogleCalendarEvent = serde_json::from_value(serde_json::json!({
            "id": "gid_1",
            "summary": "Standup",
            "colorId": "1",
            "start": { "dateTime": "2025-01-10T09:00:00Z" },
            "end": { "dateTime": "2025-01-10T09:30:00Z" },
            "updated": "2025-01-09T08:00:00Z"
        }))
        .unwrap();

        let mut e = CalendarEvent::default();
        apply_google_event(&mut e, &g, "cal_1", 5000);

        assert_eq!(e.title, "Standup");
        assert_eq!(e.date, "2025-01-10");
        assert_eq!(e.start_time, Some("09:00".into()));
        assert_eq!(e.end_time, Some("09:30".into()));
        assert_eq!(e.color, Some("#a4bdfc".into()));
        assert_eq!(e.external_id, Some("gid_1".into()));
        assert_eq!(e.sync_state, SyncState::Linked);
        assert_eq!(e.last_synced_at, Some(5000));
        assert!(e.external_updated_at.is_some());
    }
}
