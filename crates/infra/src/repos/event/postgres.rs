use super::IEventRepo;
use sqlx::{types::Uuid, FromRow, PgPool};
use tempo_domain::{CalendarEvent, CalendarProvider, ID};

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRaw {
    event_uid: Uuid,
    owner_user_uid: Uuid,
    sync_id: String,
    title: String,
    date: String,
    start_time: Option<String>,
    end_time: Option<String>,
    description: Option<String>,
    color: Option<String>,
    reminder_minutes: Option<i64>,
    reminder_at: Option<i64>,
    provider: Option<String>,
    external_id: Option<String>,
    external_calendar_id: Option<String>,
    sync_state: String,
    last_synced_at: Option<i64>,
    external_updated_at: Option<i64>,
    source_device: Option<String>,
    created: i64,
    updated: i64,
    deleted_at: Option<i64>,
}

impl From<EventRaw> for CalendarEvent {
    fn from(e: EventRaw) -> Self {
        Self {
            id: e.event_uid.into(),
            owner_user_id: e.owner_user_uid.into(),
            sync_id: e.sync_id,
            title: e.title,
            date: e.date,
            start_time: e.start_time,
            end_time: e.end_time,
            description: e.description,
            color: e.color,
            reminder_minutes: e.reminder_minutes,
            reminder_at: e.reminder_at,
            provider: e.provider.map(CalendarProvider::from),
            external_id: e.external_id,
            external_calendar_id: e.external_calendar_id,
            sync_state: e.sync_state.into(),
            last_synced_at: e.last_synced_at,
            external_updated_at: e.external_updated_at,
            source_device: e.source_device,
            created: e.created,
            updated: e.updated,
            deleted_at: e.deleted_at,
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for PostgresEventRepo {
    async fn insert(&self, e: &CalendarEvent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO calendar_events(
                event_uid,
                owner_user_uid,
                sync_id,
                title,
                date,
                start_time,
                end_time,
                description,
                color,
                reminder_minutes,
                reminder_at,
                provider,
                external_id,
                external_calendar_id,
                sync_state,
                last_synced_at,
                external_updated_at,
                source_device,
                created,
                updated,
                deleted_at
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
            "#,
        )
        .bind(e.id.inner_ref())
        .bind(e.owner_user_id.inner_ref())
        .bind(&e.sync_id)
        .bind(&e.title)
        .bind(&e.date)
        .bind(&e.start_time)
        .bind(&e.end_time)
        .bind(&e.description)
        .bind(&e.color)
        .bind(e.reminder_minutes)
        .bind(e.reminder_at)
        .bind(e.provider.map(String::from))
        .bind(&e.external_id)
        .bind(&e.external_calendar_id)
        .bind(String::from(e.sync_state))
        .bind(e.last_synced_at)
        .bind(e.external_updated_at)
        .bind(&e.source_device)
        .bind(e.created)
        .bind(e.updated)
        .bind(e.deleted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, e: &CalendarEvent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE calendar_events SET
                title = $2,
                date = $3,
                start_time = $4,
                end_time = $5,
                description = $6,
                color = $7,
                reminder_minutes = $8,
                reminder_at = $9,
                provider = $10,
                external_id = $11,
                external_calendar_id = $12,
                sync_state = $13,
                last_synced_at = $14,
                external_updated_at = $15,
                source_device = $16,
                updated = $17,
                deleted_at = $18
            WHERE event_uid = $1
            "#,
        )
        .bind(e.id.inner_ref())
        .bind(&e.title)
        .bind(&e.date)
        .bind(&e.start_time)
        .bind(&e.end_time)
        .bind(&e.description)
        .bind(&e.color)
        .bind(e.reminder_minutes)
        .bind(e.reminder_at)
        .bind(e.provider.map(String::from))
        .bind(&e.external_id)
        .bind(&e.external_calendar_id)
        .bind(String::from(e.sync_state))
        .bind(e.last_synced_at)
        .bind(e.external_updated_at)
        .bind(&e.source_device)
        .bind(e.updated)
        .bind(e.deleted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, event_id: &ID) -> Option<CalendarEvent> {
        sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM calendar_events AS e
            WHERE e.event_uid = $1
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|e| e.into())
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<CalendarEvent> {
        sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM calendar_events AS e
            WHERE e.owner_user_uid = $1 AND e.deleted_at IS NULL
            "#,
        )
        .bind(user_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|e| e.into())
        .collect()
    }

    async fn find_by_sync_id(&self, user_id: &ID, sync_id: &str) -> Option<CalendarEvent> {
        sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM calendar_events AS e
            WHERE e.owner_user_uid = $1 AND e.sync_id = $2
            "#,
        )
        .bind(user_id.inner_ref())
        .bind(sync_id)
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|e| e.into())
    }

    async fn find_by_external_id(
        &self,
        user_id: &ID,
        provider: CalendarProvider,
        external_id: &str,
        external_calendar_id: &str,
    ) -> Option<CalendarEvent> {
        sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM calendar_events AS e
            WHERE e.owner_user_uid = $1 AND e.provider = $2
                AND e.external_id = $3 AND e.external_calendar_id = $4
            "#,
        )
        .bind(user_id.inner_ref())
        .bind(provider.as_str())
        .bind(external_id)
        .bind(external_calendar_id)
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|e| e.into())
    }

    async fn find_changes_since(
        &self,
        user_id: &ID,
        since: i64,
        include_deleted: bool,
    ) -> Vec<CalendarEvent> {
        sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM calendar_events AS e
            WHERE e.owner_user_uid = $1
                AND GREATEST(e.updated, COALESCE(e.deleted_at, 0)) > $2
                AND ($3 OR e.deleted_at IS NULL)
            ORDER BY GREATEST(e.updated, COALESCE(e.deleted_at, 0)) ASC
            "#,
        )
        .bind(user_id.inner_ref())
        .bind(since)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|e| e.into())
        .collect()
    }

    async fn find_tombstones_before(&self, before: i64) -> Vec<CalendarEvent> {
        sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM calendar_events AS e
            WHERE e.deleted_at IS NOT NULL AND e.deleted_at < $1
            "#,
        )
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|e| e.into())
        .collect()
    }

    async fn delete(&self, event_id: &ID) -> Option<CalendarEvent> {
        sqlx::query_as::<_, EventRaw>(
            r#"
            DELETE FROM calendar_events AS e
            WHERE e.event_uid = $1
            RETURNING *
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|e| e.into())
    }
}
