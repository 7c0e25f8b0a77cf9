use crate::error::TempoError;
use crate::shared::{
    auth::protect_sync_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use tempo_api_structs::dtos::AppleSyncResultDTO;
use tempo_api_structs::upsert_apple_events::*;
use tempo_domain::providers::apple::AppleCalendarItem;
use tempo_domain::{CalendarEvent, CalendarProvider, EventSyncMapping, SyncState, User, ID};
use tempo_infra::TempoContext;

pub async fn upsert_apple_events_controller(
    http_req: actix_web::HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let (user, device) = protect_sync_route(&http_req, &ctx).await?;

    let body = body.0;
    let source_device = body
        .source_device
        .or_else(|| device.map(|d| d.label));
    let usecase = UpsertAppleEventsUseCase {
        user,
        source_device,
        items: body.events,
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
pub struct AppleSyncReport {
    pub results: Vec<AppleSyncResultDTO>,
    /// Items that created, overwrote or tombstoned a canonical record.
    /// Stale and unknown items are excluded.
    pub synced_count: usize,
}

#[derive(Debug)]
pub struct UpsertAppleEventsUseCase {
    pub user: User,
    pub source_device: Option<String>,
    pub items: Vec<AppleCalendarItem>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

impl UpsertAppleEventsUseCase {
    async fn upsert_mapping(
        &self,
        ctx: &TempoContext,
        event_id: &ID,
        item: &AppleCalendarItem,
        synced_at: i64,
    ) -> Result<(), UseCaseError> {
        ctx.repos
            .event_sync_mappings
            .upsert(&EventSyncMapping {
                event_id: event_id.clone(),
                user_id: self.user.id.clone(),
                provider: CalendarProvider::Apple,
                external_id: item.external_id.clone(),
                external_calendar_id: item.external_calendar_id.clone(),
                last_synced_at: synced_at,
            })
            .await
            .map_err(|_| UseCaseError::StorageError)
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for UpsertAppleEventsUseCase {
    type Response = AppleSyncReport;

    type Error = UseCaseError;

    const NAME: &'static str = "UpsertAppleEvents";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        let mut results = Vec::with_capacity(self.items.len());
        let mut synced_count = 0;

        for item in &self.items {
            let now = ctx.sys.get_timestamp_millis();
            let existing = ctx
                .repos
                .events
                .find_by_external_id(
                    &self.user.id,
                    CalendarProvider::Apple,
                    &item.external_id,
                    &item.external_calendar_id,
                )
                .await;

            let action = match existing {
                Some(e) if e.supersedes(item.external_updated_at) => {
                    // An already resolved conflict, not a failure: the
                    // canonical record is newer, the stale write is dropped
                    // and the batch still succeeds
                    "skipped_stale"
                }
                Some(mut e) if item.deleted => {
                    e.deleted_at = Some(now);
                    e.external_updated_at = item.external_updated_at;
                    e.last_synced_at = Some(item.last_synced_at.unwrap_or(now));
                    ctx.repos
                        .events
                        .save(&e)
                        .await
                        .map_err(|_| UseCaseError::StorageError)?;
                    self.upsert_mapping(ctx, &e.id, item, now).await?;
                    synced_count += 1;
                    "deleted"
                }
                Some(mut e) => {
                    e.title = item.title.clone();
                    e.date = item.date.clone();
                    e.start_time = item.start_time.clone();
                    e.end_time = item.end_time.clone();
                    e.description = item.description.clone();
                    e.color = item.color.clone();
                    e.provider = Some(CalendarProvider::Apple);
                    e.sync_state = item.sync_state.unwrap_or(SyncState::Linked);
                    e.last_synced_at = Some(item.last_synced_at.unwrap_or(now));
                    e.external_updated_at = item.external_updated_at;
                    e.source_device = self.source_device.clone();
                    e.updated = now;
                    ctx.repos
                        .events
                        .save(&e)
                        .await
                        .map_err(|_| UseCaseError::StorageError)?;
                    self.upsert_mapping(ctx, &e.id, item, now).await?;
                    synced_count += 1;
                    "updated"
                }
                None if item.deleted => {
                    // A deletion for a record we never held carries nothing
                    // to tombstone
                    "skipped_missing"
                }
                None => {
                    let e = CalendarEvent {
                        id: Default::default(),
                        owner_user_id: self.user.id.clone(),
                        sync_id: ID::default().as_string(),
                        title: item.title.clone(),
                        date: item.date.clone(),
                        start_time: item.start_time.clone(),
                        end_time: item.end_time.clone(),
                        description: item.description.clone(),
                        color: item.color.clone(),
                        reminder_minutes: None,
                        reminder_at: None,
                        provider: Some(CalendarProvider::Apple),
                        external_id: Some(item.external_id.clone()),
                        external_calendar_id: Some(item.external_calendar_id.clone()),
                        sync_state: item.sync_state.unwrap_or(SyncState::Linked),
                        last_synced_at: Some(item.last_synced_at.unwrap_or(now)),
                        external_updated_at: item.external_updated_at,
                        source_device: self.source_device.clone(),
                        created: now,
                        updated: now,
                        deleted_at: None,
                    };
                    ctx.repos
                        .events
                        .insert(&e)
                        .await
                        .map_err(|_| UseCaseError::StorageError)?;
                    self.upsert_mapping(ctx, &e.id, item, now).await?;
                    synced_count += 1;
                    "created"
                }
            };

            results.push(AppleSyncResultDTO {
                external_id: item.external_id.clone(),
                action: action.to_string(),
            });
        }

        Ok(AppleSyncReport {
            results,
            synced_count,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempo_infra::setup_inmemory_context;

    fn item(external_id: &str, title: &str, external_updated_at: Option<i64>) -> AppleCalendarItem {
        AppleCalendarItem {
            external_id: external_id.into(),
            external_calendar_id: "cal_1".into(),
            title: title.into(),
            date: "2025-01-10".into(),
            start_time: Some("09:00".into()),
            end_time: None,
            description: None,
            color: None,
            sync_state: None,
            last_synced_at: None,
            external_updated_at,
            deleted: false,
        }
    }

    async fn run(
        ctx: &TempoContext,
        user: &User,
        items: Vec<AppleCalendarItem>,
    ) -> AppleSyncReport {
        let mut usecase = UpsertAppleEventsUseCase {
            user: user.clone(),
            source_device: Some("macbook".into()),
            items,
        };
        usecase.execute(ctx).await.unwrap()
    }

    #[actix_web::test]
    async fn creates_canonical_records_with_provenance() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();

        let report = run(&ctx, &user, vec![item("ext_1", "Standup", Some(100))]).await;
        assert_eq!(report.synced_count, 1);
        assert_eq!(report.results[0].action, "created");

        let events = ctx.repos.events.find_by_user(&user.id).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].provider, Some(CalendarProvider::Apple));
        assert_eq!(events[0].external_id, Some("ext_1".into()));
        assert_eq!(events[0].source_device, Some("macbook".into()));

        let mapping = ctx
            .repos
            .event_sync_mappings
            .find_by_external(&user.id, CalendarProvider::Apple, "ext_1")
            .await
            .unwrap();
        assert_eq!(mapping.event_id, events[0].id);
    }

    #[actix_web::test]
    async fn stale_write_is_dropped_silently() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();

        run(&ctx, &user, vec![item("ext_1", "Standup", Some(100))]).await;
        let canonical = &ctx.repos.events.find_by_user(&user.id).await[0];
        let canonical_ts = canonical.canonical_ts();

        // An upsert carrying an older external timestamp and a different
        // title leaves the canonical title unchanged, and the batch as a
        // whole still succeeds
        let report = run(
            &ctx,
            &user,
            vec![item("ext_1", "Standup (stale)", Some(canonical_ts - 1))],
        )
        .await;
        assert_eq!(report.results[0].action, "skipped_stale");
        assert_eq!(report.synced_count, 0);

        let events = ctx.repos.events.find_by_user(&user.id).await;
        assert_eq!(events[0].title, "Standup");
    }

    #[actix_web::test]
    async fn newer_write_overwrites_the_canonical_record() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();

        run(&ctx, &user, vec![item("ext_1", "Standup", Some(100))]).await;
        let canonical_ts = ctx.repos.events.find_by_user(&user.id).await[0].canonical_ts();

        let report = run(
            &ctx,
            &user,
            vec![item("ext_1", "Standup (moved)", Some(canonical_ts + 1000))],
        )
        .await;
        assert_eq!(report.results[0].action, "updated");

        let events = ctx.repos.events.find_by_user(&user.id).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Standup (moved)");
    }

    #[actix_web::test]
    async fn deleted_flag_tombstones_the_record() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();

        run(&ctx, &user, vec![item("ext_1", "Standup", Some(100))]).await;
        let canonical = ctx.repos.events.find_by_user(&user.id).await[0].clone();

        let mut deletion = item("ext_1", "Standup", Some(canonical.canonical_ts() + 1000));
        deletion.deleted = true;
        let report = run(&ctx, &user, vec![deletion]).await;
        assert_eq!(report.results[0].action, "deleted");

        // Tombstone, not a hard delete
        assert!(ctx.repos.events.find_by_user(&user.id).await.is_empty());
        let stored = ctx.repos.events.find(&canonical.id).await.unwrap();
        assert!(stored.deleted_at.is_some());
    }

    #[actix_web::test]
    async fn deletion_for_unknown_record_is_ignored() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();

        let mut deletion = item("ext_unknown", "Standup", Some(100));
        deletion.deleted = true;
        let report = run(&ctx, &user, vec![deletion]).await;
        assert_eq!(report.results[0].action, "skipped_missing");
        assert_eq!(report.synced_count, 0);
    }
}
