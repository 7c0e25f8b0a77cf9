use super::IReminderRepo;
use sqlx::{types::Uuid, FromRow, PgPool};
use tempo_domain::{Reminder, ReminderTarget, ID};
use tracing::error;

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    reminder_uid: Uuid,
    subscription_uid: Option<Uuid>,
    user_uid: Option<Uuid>,
    title: String,
    body: String,
    deliver_at: i64,
    delivered_at: Option<i64>,
    created: i64,
}

impl From<ReminderRaw> for Reminder {
    fn from(r: ReminderRaw) -> Self {
        // The db CHECK constraint guarantees exactly one of the two targets
        let target = match (r.subscription_uid, r.user_uid) {
            (Some(subscription_uid), _) => ReminderTarget::Subscription(subscription_uid.into()),
            (None, Some(user_uid)) => ReminderTarget::User(user_uid.into()),
            (None, None) => unreachable!("reminder row without a target"),
        };
        Self {
            id: r.reminder_uid.into(),
            target,
            title: r.title,
            body: r.body,
            deliver_at: r.deliver_at,
            delivered_at: r.delivered_at,
            created: r.created,
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        let (subscription_uid, user_uid) = match &reminder.target {
            ReminderTarget::Subscription(id) => (Some(*id.inner_ref()), None),
            ReminderTarget::User(id) => (None, Some(*id.inner_ref())),
        };
        sqlx::query(
            r#"
            INSERT INTO reminders(
                reminder_uid,
                subscription_uid,
                user_uid,
                title,
                body,
                deliver_at,
                delivered_at,
                created
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reminder.id.inner_ref())
        .bind(subscription_uid)
        .bind(user_uid)
        .bind(&reminder.title)
        .bind(&reminder.body)
        .bind(reminder.deliver_at)
        .bind(reminder.delivered_at)
        .bind(reminder.created)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to insert reminder: {:?}", e);
            e
        })?;

        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.reminder_uid = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|r| r.into())
    }

    async fn find_due(&self, now: i64) -> Vec<Reminder> {
        sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.delivered_at IS NULL AND r.deliver_at <= $1
            ORDER BY r.deliver_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|r| r.into())
        .collect()
    }

    async fn mark_delivered(&self, reminder_id: &ID, delivered_at: i64) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminders SET delivered_at = $2
            WHERE reminder_uid = $1 AND delivered_at IS NULL
            "#,
        )
        .bind(reminder_id.inner_ref())
        .bind(delivered_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
