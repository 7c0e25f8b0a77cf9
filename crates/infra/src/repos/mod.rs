mod device;
mod event;
mod event_sync_mapping;
mod reminder;
mod shared;
mod subscription;
mod user;

use device::{IDeviceRepo, InMemoryDeviceRepo, PostgresDeviceRepo};
use event::{IEventRepo, InMemoryEventRepo, PostgresEventRepo};
use event_sync_mapping::{
    IEventSyncMappingRepo, InMemoryEventSyncMappingRepo, PostgresEventSyncMappingRepo,
};
use reminder::{IReminderRepo, InMemoryReminderRepo, PostgresReminderRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use subscription::ISubscriptionRepo;
use subscription::{InMemorySubscriptionRepo, PostgresSubscriptionRepo};
use user::{IUserRepo, InMemoryUserRepo, PostgresUserRepo};

pub use shared::repo::DeleteResult;

#[derive(Clone)]
pub struct Repos {
    pub events: Arc<dyn IEventRepo>,
    pub event_sync_mappings: Arc<dyn IEventSyncMappingRepo>,
    pub reminders: Arc<dyn IReminderRepo>,
    pub subscriptions: Arc<dyn ISubscriptionRepo>,
    pub devices: Arc<dyn IDeviceRepo>,
    pub users: Arc<dyn IUserRepo>,
}

impl Repos {
    pub async fn create_postgres(
        connection_string: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;

        Ok(Self {
            events: Arc::new(PostgresEventRepo::new(pool.clone())),
            event_sync_mappings: Arc::new(PostgresEventSyncMappingRepo::new(pool.clone())),
            reminders: Arc::new(PostgresReminderRepo::new(pool.clone())),
            subscriptions: Arc::new(PostgresSubscriptionRepo::new(pool.clone())),
            devices: Arc::new(PostgresDeviceRepo::new(pool.clone())),
            users: Arc::new(PostgresUserRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            events: Arc::new(InMemoryEventRepo::new()),
            event_sync_mappings: Arc::new(InMemoryEventSyncMappingRepo::new()),
            reminders: Arc::new(InMemoryReminderRepo::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepo::new()),
            devices: Arc::new(InMemoryDeviceRepo::new()),
            users: Arc::new(InMemoryUserRepo::new()),
        }
    }
}
