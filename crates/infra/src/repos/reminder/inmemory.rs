use super::IReminderRepo;
use crate::repos::shared::inmemory_repo::*;
use tempo_domain::{Reminder, ID};

pub struct InMemoryReminderRepo {
    reminders: std::sync::Mutex<Vec<Reminder>>,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        insert(reminder, &self.reminders);
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        find(reminder_id, &self.reminders)
    }

    async fn find_due(&self, now: i64) -> Vec<Reminder> {
        find_by(&self.reminders, |r| r.is_due(now))
    }

    async fn mark_delivered(&self, reminder_id: &ID, delivered_at: i64) -> anyhow::Result<()> {
        update_many(
            &self.reminders,
            |r| r.id == *reminder_id && r.delivered_at.is_none(),
            |r| r.delivered_at = Some(delivered_at),
        );
        Ok(())
    }
}
