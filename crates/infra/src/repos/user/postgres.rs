use super::IUserRepo;
use sqlx::{types::Uuid, FromRow, PgPool};
use tempo_domain::{User, UserGoogleIntegration, ID};
use tracing::error;

pub struct PostgresUserRepo {
    pool: PgPool,
}

impl PostgresUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRaw {
    user_uid: Uuid,
    api_token: String,
    google_integration: Option<serde_json::Value>,
    created: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleIntegrationRaw {
    access_token: String,
    access_token_expires_ts: i64,
    refresh_token: String,
}

impl From<UserRaw> for User {
    fn from(u: UserRaw) -> Self {
        let google = u
            .google_integration
            .and_then(|raw| serde_json::from_value::<GoogleIntegrationRaw>(raw).ok())
            .map(|raw| UserGoogleIntegration {
                access_token: raw.access_token,
                access_token_expires_ts: raw.access_token_expires_ts,
                refresh_token: raw.refresh_token,
            });
        Self {
            id: u.user_uid.into(),
            api_token: u.api_token,
            google,
            created: u.created,
        }
    }
}

fn google_integration_json(user: &User) -> Option<serde_json::Value> {
    user.google.as_ref().map(|google| {
        serde_json::json!({
            "accessToken": google.access_token,
            "accessTokenExpiresTs": google.access_token_expires_ts,
            "refreshToken": google.refresh_token,
        })
    })
}

#[async_trait::async_trait]
impl IUserRepo for PostgresUserRepo {
    async fn insert(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users(user_uid, api_token, google_integration, created)
            VALUES($1, $2, $3, $4)
            "#,
        )
        .bind(user.id.inner_ref())
        .bind(&user.api_token)
        .bind(google_integration_json(user))
        .bind(user.created)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to insert user: {:?}", e);
            e
        })?;

        Ok(())
    }

    async fn save(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                api_token = $2,
                google_integration = $3
            WHERE user_uid = $1
            "#,
        )
        .bind(user.id.inner_ref())
        .bind(&user.api_token)
        .bind(google_integration_json(user))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, user_id: &ID) -> Option<User> {
        sqlx::query_as::<_, UserRaw>(
            r#"
            SELECT * FROM users AS u
            WHERE u.user_uid = $1
            "#,
        )
        .bind(user_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|u| u.into())
    }

    async fn find_by_token(&self, api_token: &str) -> Option<User> {
        sqlx::query_as::<_, UserRaw>(
            r#"
            SELECT * FROM users AS u
            WHERE u.api_token = $1
            "#,
        )
        .bind(api_token)
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|u| u.into())
    }
}
