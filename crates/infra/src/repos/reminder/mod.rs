mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderRepo;
pub use postgres::PostgresReminderRepo;
use tempo_domain::{Reminder, ID};

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()>;
    async fn find(&self, reminder_id: &ID) -> Option<Reminder>;
    /// All reminders with `delivered_at IS NULL AND deliver_at <= now`
    async fn find_due(&self, now: i64) -> Vec<Reminder>;
    /// Marks the unset -> delivered transition. A reminder is marked exactly
    /// once and never re-armed.
    async fn mark_delivered(&self, reminder_id: &ID, delivered_at: i64) -> anyhow::Result<()>;
}
