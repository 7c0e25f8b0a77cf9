use crate::shared::usecase::UseCase;
use tempo_infra::TempoContext;

/// Hard deletes tombstones once every provider mapping has observed the
/// deletion and a retention window has passed, so change feeds do not
/// accumulate dead records forever.
#[derive(Debug)]
pub struct PurgeTombstonesUseCase {}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for PurgeTombstonesUseCase {
    type Response = usize;

    type Error = UseCaseError;

    const NAME: &'static str = "PurgeTombstones";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let cutoff = now - ctx.config.tombstone_retention;
        let tombstones = ctx.repos.events.find_tombstones_before(cutoff).await;

        let mut purged = 0;
        for tombstone in tombstones {
            let deleted_at = match tombstone.deleted_at {
                Some(ts) => ts,
                None => continue,
            };
            let mappings = ctx
                .repos
                .event_sync_mappings
                .find_by_event(&tombstone.id)
                .await
                .map_err(|_| UseCaseError::StorageError)?;

            // Every provider copy must have synced past the deletion before
            // the canonical record may disappear from the change feed
            let all_confirmed = mappings.iter().all(|m| m.last_synced_at >= deleted_at);
            if !all_confirmed {
                continue;
            }

            ctx.repos
                .event_sync_mappings
                .delete_by_event(&tombstone.id)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
            ctx.repos.events.delete(&tombstone.id).await;
            purged += 1;
        }

        Ok(purged)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use tempo_domain::{CalendarEvent, CalendarProvider, EventSyncMapping, User};
    use tempo_infra::{setup_inmemory_context, FrozenSys};

    fn tombstone(user: &User, sync_id: &str, deleted_at: i64) -> CalendarEvent {
        CalendarEvent {
            owner_user_id: user.id.clone(),
            sync_id: sync_id.into(),
            title: "Standup".into(),
            date: "2025-01-10".into(),
            created: 0,
            updated: deleted_at,
            deleted_at: Some(deleted_at),
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn purges_only_confirmed_and_aged_tombstones() {
        let mut ctx = setup_inmemory_context();
        ctx.sys = Arc::new(FrozenSys::at(1_700_000_000_000));
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();

        let now = ctx.sys.get_timestamp_millis();
        let old = now - ctx.config.tombstone_retention - 1000;

        // Aged tombstone, mapping has synced past the deletion: purged
        let confirmed = tombstone(&user, "evt_confirmed", old);
        ctx.repos.events.insert(&confirmed).await.unwrap();
        ctx.repos
            .event_sync_mappings
            .upsert(&EventSyncMapping {
                event_id: confirmed.id.clone(),
                user_id: user.id.clone(),
                provider: CalendarProvider::Apple,
                external_id: "ext_1".into(),
                external_calendar_id: "cal_1".into(),
                last_synced_at: old + 500,
            })
            .await
            .unwrap();

        // Aged tombstone, mapping has not observed the deletion: kept
        let unconfirmed = tombstone(&user, "evt_unconfirmed", old);
        ctx.repos.events.insert(&unconfirmed).await.unwrap();
        ctx.repos
            .event_sync_mappings
            .upsert(&EventSyncMapping {
                event_id: unconfirmed.id.clone(),
                user_id: user.id.clone(),
                provider: CalendarProvider::Apple,
                external_id: "ext_2".into(),
                external_calendar_id: "cal_1".into(),
                last_synced_at: old - 500,
            })
            .await
            .unwrap();

        // Recent tombstone without mappings: kept by the retention window
        let recent = tombstone(&user, "evt_recent", now - 1000);
        ctx.repos.events.insert(&recent).await.unwrap();

        let mut usecase = PurgeTombstonesUseCase {};
        let purged = usecase.execute(&ctx).await.unwrap();
        assert_eq!(purged, 1);

        assert!(ctx.repos.events.find(&confirmed.id).await.is_none());
        assert!(ctx.repos.events.find(&unconfirmed.id).await.is_some());
        assert!(ctx.repos.events.find(&recent.id).await.is_some());
        assert!(ctx
            .repos
            .event_sync_mappings
            .find_by_event(&confirmed.id)
            .await
            .unwrap()
            .is_empty());
    }
}
