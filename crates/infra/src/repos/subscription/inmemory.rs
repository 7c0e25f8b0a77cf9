use super::ISubscriptionRepo;
use crate::repos::shared::inmemory_repo::*;
use tempo_domain::{Subscription, ID};

pub struct InMemorySubscriptionRepo {
    subscriptions: std::sync::Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self {
            subscriptions: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl ISubscriptionRepo for InMemorySubscriptionRepo {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()> {
        insert(subscription, &self.subscriptions);
        Ok(())
    }

    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()> {
        save(subscription, &self.subscriptions);
        Ok(())
    }

    async fn find(&self, subscription_id: &ID) -> Option<Subscription> {
        find(subscription_id, &self.subscriptions)
    }

    async fn find_by_endpoint(&self, endpoint: &str) -> Option<Subscription> {
        find_by(&self.subscriptions, |s| s.endpoint == endpoint)
            .into_iter()
            .next()
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<Subscription> {
        find_by(&self.subscriptions, |s| s.user_id.as_ref() == Some(user_id))
    }

    async fn delete(&self, subscription_id: &ID) -> Option<Subscription> {
        delete(subscription_id, &self.subscriptions)
    }

    async fn delete_by_endpoint(&self, endpoint: &str) -> Option<Subscription> {
        find_and_delete_by(&self.subscriptions, |s| s.endpoint == endpoint)
            .into_iter()
            .next()
    }
}
