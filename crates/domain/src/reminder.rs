use crate::shared::entity::{Entity, ID};

/// Who a `Reminder` is delivered to. The two modes are mutually exclusive:
/// a device-scoped reminder targets exactly one `Subscription`, while a
/// user-scoped reminder broadcasts to every subscription the user owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderTarget {
    Subscription(ID),
    User(ID),
}

/// A scheduled push notification job. Created once and transitioned
/// unset -> delivered exactly once; a `Reminder` is never re-armed.
/// Delivery failures are absorbed at the subscription level and never
/// reflected back onto this record.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ID,
    pub target: ReminderTarget,
    pub title: String,
    pub body: String,
    /// The timestamp (epoch millis) at which the notification is due
    pub deliver_at: i64,
    /// Null until the scheduler has attempted delivery to every target
    pub delivered_at: Option<i64>,
    pub created: i64,
}

impl Entity for Reminder {
    fn id(&self) -> &ID {
        &self.id
    }
}

impl Reminder {
    pub fn is_due(&self, now: i64) -> bool {
        self.delivered_at.is_none() && self.deliver_at <= now
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn due_only_while_undelivered() {
        let mut reminder = Reminder {
            id: Default::default(),
            target: ReminderTarget::User(Default::default()),
            title: "Standup".into(),
            body: "in 10 minutes".into(),
            deliver_at: 1000,
            delivered_at: None,
            created: 0,
        };
        assert!(!reminder.is_due(999));
        assert!(reminder.is_due(1000));
        reminder.delivered_at = Some(1000);
        assert!(!reminder.is_due(2000));
    }
}
