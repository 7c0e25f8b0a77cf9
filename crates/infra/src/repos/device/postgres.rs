use super::IDeviceRepo;
use sqlx::{types::Uuid, FromRow, PgPool};
use tempo_domain::Device;
use tracing::error;

pub struct PostgresDeviceRepo {
    pool: PgPool,
}

impl PostgresDeviceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DeviceRaw {
    device_uid: Uuid,
    user_uid: Uuid,
    label: String,
    token: String,
    created: i64,
}

impl From<DeviceRaw> for Device {
    fn from(d: DeviceRaw) -> Self {
        Self {
            id: d.device_uid.into(),
            user_id: d.user_uid.into(),
            label: d.label,
            token: d.token,
            created: d.created,
        }
    }
}

#[async_trait::async_trait]
impl IDeviceRepo for PostgresDeviceRepo {
    async fn insert(&self, device: &Device) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO devices(device_uid, user_uid, label, token, created)
            VALUES($1, $2, $3, $4, $5)
            "#,
        )
        .bind(device.id.inner_ref())
        .bind(device.user_id.inner_ref())
        .bind(&device.label)
        .bind(&device.token)
        .bind(device.created)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to insert device: {:?}", e);
            e
        })?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Option<Device> {
        sqlx::query_as::<_, DeviceRaw>(
            r#"
            SELECT * FROM devices AS d
            WHERE d.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|d| d.into())
    }
}
