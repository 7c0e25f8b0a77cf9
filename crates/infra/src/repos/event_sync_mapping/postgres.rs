use super::IEventSyncMappingRepo;
use crate::repos::shared::repo::DeleteResult;
use sqlx::{types::Uuid, FromRow, PgPool};
use tempo_domain::{CalendarProvider, EventSyncMapping, ID};
use tracing::error;

pub struct PostgresEventSyncMappingRepo {
    pool: PgPool,
}

impl PostgresEventSyncMappingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SyncMappingRaw {
    event_uid: Uuid,
    user_uid: Uuid,
    provider: String,
    external_id: String,
    external_calendar_id: String,
    last_synced_at: i64,
}

impl From<SyncMappingRaw> for EventSyncMapping {
    fn from(m: SyncMappingRaw) -> Self {
        Self {
            event_id: m.event_uid.into(),
            user_id: m.user_uid.into(),
            provider: m.provider.into(),
            external_id: m.external_id,
            external_calendar_id: m.external_calendar_id,
            last_synced_at: m.last_synced_at,
        }
    }
}

#[async_trait::async_trait]
impl IEventSyncMappingRepo for PostgresEventSyncMappingRepo {
    async fn upsert(&self, m: &EventSyncMapping) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO event_sync_mappings(
                event_uid,
                user_uid,
                provider,
                external_id,
                external_calendar_id,
                last_synced_at
            )
            VALUES($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_uid, provider, external_id)
            DO UPDATE SET
                event_uid = EXCLUDED.event_uid,
                external_calendar_id = EXCLUDED.external_calendar_id,
                last_synced_at = EXCLUDED.last_synced_at
            "#,
        )
        .bind(m.event_id.inner_ref())
        .bind(m.user_id.inner_ref())
        .bind(m.provider.as_str())
        .bind(&m.external_id)
        .bind(&m.external_calendar_id)
        .bind(m.last_synced_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to upsert event sync mapping: {:?}", e);
            e
        })?;

        Ok(())
    }

    async fn find_by_external(
        &self,
        user_id: &ID,
        provider: CalendarProvider,
        external_id: &str,
    ) -> Option<EventSyncMapping> {
        sqlx::query_as::<_, SyncMappingRaw>(
            r#"
            SELECT * FROM event_sync_mappings AS m
            WHERE m.user_uid = $1 AND m.provider = $2 AND m.external_id = $3
            "#,
        )
        .bind(user_id.inner_ref())
        .bind(provider.as_str())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|m| m.into())
    }

    async fn find_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<EventSyncMapping>> {
        let mappings = sqlx::query_as::<_, SyncMappingRaw>(
            r#"
            SELECT * FROM event_sync_mappings AS m
            WHERE m.event_uid = $1
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;

        Ok(mappings.into_iter().map(|m| m.into()).collect())
    }

    async fn delete_by_event(&self, event_id: &ID) -> anyhow::Result<DeleteResult> {
        let res = sqlx::query(
            r#"
            DELETE FROM event_sync_mappings AS m
            WHERE m.event_uid = $1
            "#,
        )
        .bind(event_id.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(DeleteResult {
            deleted_count: res.rows_affected() as i64,
        })
    }
}
