mod inmemory;
mod postgres;

pub use inmemory::InMemorySubscriptionRepo;
pub use postgres::PostgresSubscriptionRepo;
use tempo_domain::{Subscription, ID};

#[async_trait::async_trait]
pub trait ISubscriptionRepo: Send + Sync {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()>;
    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()>;
    async fn find(&self, subscription_id: &ID) -> Option<Subscription>;
    /// The endpoint value is the dedup key for the registry
    async fn find_by_endpoint(&self, endpoint: &str) -> Option<Subscription>;
    async fn find_by_user(&self, user_id: &ID) -> Vec<Subscription>;
    /// Hard delete. Subscriptions are never soft deleted.
    async fn delete(&self, subscription_id: &ID) -> Option<Subscription>;
    async fn delete_by_endpoint(&self, endpoint: &str) -> Option<Subscription>;
}
