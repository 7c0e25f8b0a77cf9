use super::ISubscriptionRepo;
use sqlx::{types::Uuid, FromRow, PgPool};
use tempo_domain::{Subscription, ID};
use tracing::error;

pub struct PostgresSubscriptionRepo {
    pool: PgPool,
}

impl PostgresSubscriptionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SubscriptionRaw {
    subscription_uid: Uuid,
    user_uid: Option<Uuid>,
    device_id: Option<String>,
    endpoint: String,
    keys: serde_json::Value,
    failure_count: i64,
    created: i64,
}

impl From<SubscriptionRaw> for Subscription {
    fn from(s: SubscriptionRaw) -> Self {
        Self {
            id: s.subscription_uid.into(),
            user_id: s.user_uid.map(|uid| uid.into()),
            device_id: s.device_id,
            endpoint: s.endpoint,
            keys: s.keys,
            failure_count: s.failure_count,
            created: s.created,
        }
    }
}

#[async_trait::async_trait]
impl ISubscriptionRepo for PostgresSubscriptionRepo {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions(
                subscription_uid,
                user_uid,
                device_id,
                endpoint,
                keys,
                failure_count,
                created
            )
            VALUES($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(subscription.id.inner_ref())
        .bind(subscription.user_id.as_ref().map(|id| *id.inner_ref()))
        .bind(&subscription.device_id)
        .bind(&subscription.endpoint)
        .bind(&subscription.keys)
        .bind(subscription.failure_count)
        .bind(subscription.created)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to insert subscription: {:?}", e);
            e
        })?;

        Ok(())
    }

    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions SET
                user_uid = $2,
                device_id = $3,
                endpoint = $4,
                keys = $5,
                failure_count = $6
            WHERE subscription_uid = $1
            "#,
        )
        .bind(subscription.id.inner_ref())
        .bind(subscription.user_id.as_ref().map(|id| *id.inner_ref()))
        .bind(&subscription.device_id)
        .bind(&subscription.endpoint)
        .bind(&subscription.keys)
        .bind(subscription.failure_count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, subscription_id: &ID) -> Option<Subscription> {
        sqlx::query_as::<_, SubscriptionRaw>(
            r#"
            SELECT * FROM subscriptions AS s
            WHERE s.subscription_uid = $1
            "#,
        )
        .bind(subscription_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|s| s.into())
    }

    async fn find_by_endpoint(&self, endpoint: &str) -> Option<Subscription> {
        sqlx::query_as::<_, SubscriptionRaw>(
            r#"
            SELECT * FROM subscriptions AS s
            WHERE s.endpoint = $1
            "#,
        )
        .bind(endpoint)
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|s| s.into())
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<Subscription> {
        sqlx::query_as::<_, SubscriptionRaw>(
            r#"
            SELECT * FROM subscriptions AS s
            WHERE s.user_uid = $1
            "#,
        )
        .bind(user_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.into())
        .collect()
    }

    async fn delete(&self, subscription_id: &ID) -> Option<Subscription> {
        sqlx::query_as::<_, SubscriptionRaw>(
            r#"
            DELETE FROM subscriptions AS s
            WHERE s.subscription_uid = $1
            RETURNING *
            "#,
        )
        .bind(subscription_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|s| s.into())
    }

    async fn delete_by_endpoint(&self, endpoint: &str) -> Option<Subscription> {
        sqlx::query_as::<_, SubscriptionRaw>(
            r#"
            DELETE FROM subscriptions AS s
            WHERE s.endpoint = $1
            RETURNING *
            "#,
        )
        .bind(endpoint)
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|s| s.into())
    }
}
