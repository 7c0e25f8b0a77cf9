mod inmemory;
mod postgres;

pub use inmemory::InMemoryDeviceRepo;
pub use postgres::PostgresDeviceRepo;
use tempo_domain::Device;

#[async_trait::async_trait]
pub trait IDeviceRepo: Send + Sync {
    async fn insert(&self, device: &Device) -> anyhow::Result<()>;
    async fn find_by_token(&self, token: &str) -> Option<Device>;
}
