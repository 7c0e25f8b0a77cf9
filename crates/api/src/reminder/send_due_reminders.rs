use crate::shared::usecase::UseCase;
use tempo_domain::{Reminder, ReminderTarget, Subscription};
use tempo_infra::{PushOutcome, PushPayload, TempoContext};
use tracing::{info, warn};

/// One scheduler tick: finds due reminders, fans each out to its targeted
/// subscriptions, classifies every delivery outcome and marks the reminder
/// delivered exactly once. Per-subscription failures never reach the
/// reminder row.
#[derive(Debug)]
pub struct SendDueRemindersUseCase {}

#[derive(Debug, Default, PartialEq)]
pub struct DeliveryReport {
    pub reminders_processed: usize,
    pub delivery_attempts: usize,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

impl SendDueRemindersUseCase {
    /// Infallible by design: a bookkeeping failure on one subscription must
    /// not abort the tick, or the remaining targets would be skipped and the
    /// already-attempted ones re-pushed next tick.
    async fn deliver(&self, ctx: &TempoContext, reminder: &Reminder, mut subscription: Subscription) {
        let payload = PushPayload {
            title: reminder.title.clone(),
            body: reminder.body.clone(),
        };
        match ctx.push.send(&subscription, &payload).await {
            PushOutcome::Delivered => {
                if subscription.failure_count != 0 {
                    subscription.failure_count = 0;
                    if let Err(e) = ctx.repos.subscriptions.save(&subscription).await {
                        warn!(
                            "Unable to reset failure count for subscription {}: {:?}",
                            subscription.id, e
                        );
                    }
                }
            }
            PushOutcome::Gone => {
                // The endpoint is permanently gone, remove it immediately
                ctx.repos.subscriptions.delete(&subscription.id).await;
            }
            PushOutcome::Failed => {
                subscription.failure_count += 1;
                if subscription.failure_count >= ctx.config.subscription_failure_threshold {
                    info!(
                        "Pruning subscription {} after {} consecutive delivery failures",
                        subscription.id, subscription.failure_count
                    );
                    ctx.repos.subscriptions.delete(&subscription.id).await;
                } else if let Err(e) = ctx.repos.subscriptions.save(&subscription).await {
                    warn!(
                        "Unable to persist failure count for subscription {}: {:?}",
                        subscription.id, e
                    );
                }
            }
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendDueRemindersUseCase {
    type Response = DeliveryReport;

    type Error = UseCaseError;

    const NAME: &'static str = "SendDueReminders";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let due = ctx.repos.reminders.find_due(now).await;

        let mut report = DeliveryReport::default();
        for reminder in due {
            let targets = match &reminder.target {
                // Broadcast: one reminder fans out to every registered
                // subscription the user owns
                ReminderTarget::User(user_id) => {
                    ctx.repos.subscriptions.find_by_user(user_id).await
                }
                ReminderTarget::Subscription(subscription_id) => ctx
                    .repos
                    .subscriptions
                    .find(subscription_id)
                    .await
                    .into_iter()
                    .collect(),
            };

            for subscription in targets {
                report.delivery_attempts += 1;
                self.deliver(ctx, &reminder, subscription).await;
            }

            // Fire and forget from the reminder's perspective: marked once
            // every target was attempted, regardless of per-target success,
            // and never retried
            ctx.repos
                .reminders
                .mark_delivered(&reminder.id, ctx.sys.get_timestamp_millis())
                .await
                .map_err(|_| UseCaseError::StorageError)?;
            report.reminders_processed += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use tempo_domain::ID;
    use tempo_infra::{setup_inmemory_context, ISubscriptionRepo, StubPushSender};

    struct TestContext {
        ctx: TempoContext,
        push: StubPushSender,
    }

    fn setup() -> TestContext {
        let mut ctx = setup_inmemory_context();
        let push = StubPushSender::new();
        ctx.push = Arc::new(push.clone());
        TestContext { ctx, push }
    }

    fn subscription(user_id: Option<ID>, endpoint: &str) -> Subscription {
        Subscription {
            id: Default::default(),
            user_id,
            device_id: None,
            endpoint: endpoint.into(),
            keys: serde_json::json!({}),
            failure_count: 0,
            created: 0,
        }
    }

    fn reminder(target: ReminderTarget, deliver_at: i64) -> Reminder {
        Reminder {
            id: Default::default(),
            target,
            title: "Standup".into(),
            body: "in 10 minutes".into(),
            deliver_at,
            delivered_at: None,
            created: 0,
        }
    }

    #[actix_web::test]
    async fn broadcast_reminder_attempts_every_user_subscription() {
        let TestContext { ctx, push } = setup();
        let user_id = ID::default();
        for endpoint in ["https://push.example.com/a", "https://push.example.com/b"] {
            ctx.repos
                .subscriptions
                .insert(&subscription(Some(user_id.clone()), endpoint))
                .await
                .unwrap();
        }
        let r = reminder(ReminderTarget::User(user_id), 0);
        ctx.repos.reminders.insert(&r).await.unwrap();

        let mut usecase = SendDueRemindersUseCase {};
        let report = usecase.execute(&ctx).await.unwrap();

        assert_eq!(report.reminders_processed, 1);
        assert_eq!(report.delivery_attempts, 2);
        assert_eq!(push.attempts().len(), 2);
        // Exactly one delivered_at write
        let stored = ctx.repos.reminders.find(&r.id).await.unwrap();
        assert!(stored.delivered_at.is_some());

        // A second tick attempts nothing further
        let mut second = SendDueRemindersUseCase {};
        let report = second.execute(&ctx).await.unwrap();
        assert_eq!(report, DeliveryReport::default());
        assert_eq!(push.attempts().len(), 2);
    }

    #[actix_web::test]
    async fn device_scoped_reminder_attempts_exactly_one_subscription() {
        let TestContext { ctx, push } = setup();
        let user_id = ID::default();
        let targeted = subscription(Some(user_id.clone()), "https://push.example.com/a");
        ctx.repos.subscriptions.insert(&targeted).await.unwrap();
        ctx.repos
            .subscriptions
            .insert(&subscription(
                Some(user_id.clone()),
                "https://push.example.com/b",
            ))
            .await
            .unwrap();

        ctx.repos
            .reminders
            .insert(&reminder(ReminderTarget::Subscription(targeted.id), 0))
            .await
            .unwrap();

        let mut usecase = SendDueRemindersUseCase {};
        let report = usecase.execute(&ctx).await.unwrap();
        assert_eq!(report.delivery_attempts, 1);
        assert_eq!(
            push.attempts(),
            vec![("https://push.example.com/a".to_string(), "Standup".to_string())]
        );
    }

    #[actix_web::test]
    async fn gone_endpoint_is_removed_immediately() {
        let TestContext { ctx, push } = setup();
        let user_id = ID::default();
        let sub = subscription(Some(user_id.clone()), "https://push.example.com/gone");
        ctx.repos.subscriptions.insert(&sub).await.unwrap();
        push.script("https://push.example.com/gone", vec![PushOutcome::Gone]);

        ctx.repos
            .reminders
            .insert(&reminder(ReminderTarget::User(user_id.clone()), 0))
            .await
            .unwrap();

        let mut usecase = SendDueRemindersUseCase {};
        usecase.execute(&ctx).await.unwrap();

        assert!(ctx.repos.subscriptions.find(&sub.id).await.is_none());

        // The next due reminder makes no further attempts at it
        ctx.repos
            .reminders
            .insert(&reminder(ReminderTarget::User(user_id), 0))
            .await
            .unwrap();
        let mut second = SendDueRemindersUseCase {};
        let report = second.execute(&ctx).await.unwrap();
        assert_eq!(report.delivery_attempts, 0);
        assert_eq!(push.attempts().len(), 1);
    }

    #[actix_web::test]
    async fn transient_failures_accumulate_across_ticks_until_pruned() {
        let TestContext { ctx, push } = setup();
        let user_id = ID::default();
        let sub = subscription(Some(user_id.clone()), "https://push.example.com/flaky");
        ctx.repos.subscriptions.insert(&sub).await.unwrap();
        push.script(
            "https://push.example.com/flaky",
            vec![PushOutcome::Failed, PushOutcome::Failed, PushOutcome::Failed],
        );

        // One failure per tick: the persisted counter carries across ticks
        for tick in 1..=3 {
            ctx.repos
                .reminders
                .insert(&reminder(ReminderTarget::User(user_id.clone()), 0))
                .await
                .unwrap();
            let mut usecase = SendDueRemindersUseCase {};
            usecase.execute(&ctx).await.unwrap();

            let stored = ctx.repos.subscriptions.find(&sub.id).await;
            if tick < 3 {
                assert_eq!(stored.unwrap().failure_count, tick);
            } else {
                assert!(stored.is_none());
            }
        }
    }

    #[actix_web::test]
    async fn successful_delivery_resets_the_failure_count() {
        let TestContext { ctx, push } = setup();
        let user_id = ID::default();
        let mut sub = subscription(Some(user_id.clone()), "https://push.example.com/ok");
        sub.failure_count = 2;
        ctx.repos.subscriptions.insert(&sub).await.unwrap();
        let _ = push;

        ctx.repos
            .reminders
            .insert(&reminder(ReminderTarget::User(user_id), 0))
            .await
            .unwrap();
        let mut usecase = SendDueRemindersUseCase {};
        usecase.execute(&ctx).await.unwrap();

        let stored = ctx.repos.subscriptions.find(&sub.id).await.unwrap();
        assert_eq!(stored.failure_count, 0);
    }

    /// Delegates everything but fails every `save`
    struct FlakySaveSubscriptionRepo {
        inner: Arc<dyn ISubscriptionRepo>,
    }

    #[async_trait::async_trait]
    impl ISubscriptionRepo for FlakySaveSubscriptionRepo {
        async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()> {
            self.inner.insert(subscription).await
        }
        async fn save(&self, _subscription: &Subscription) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }
        async fn find(&self, subscription_id: &ID) -> Option<Subscription> {
            self.inner.find(subscription_id).await
        }
        async fn find_by_endpoint(&self, endpoint: &str) -> Option<Subscription> {
            self.inner.find_by_endpoint(endpoint).await
        }
        async fn find_by_user(&self, user_id: &ID) -> Vec<Subscription> {
            self.inner.find_by_user(user_id).await
        }
        async fn delete(&self, subscription_id: &ID) -> Option<Subscription> {
            self.inner.delete(subscription_id).await
        }
        async fn delete_by_endpoint(&self, endpoint: &str) -> Option<Subscription> {
            self.inner.delete_by_endpoint(endpoint).await
        }
    }

    #[actix_web::test]
    async fn failure_count_save_error_does_not_abort_the_tick() {
        let TestContext { mut ctx, push } = setup();
        let user_id = ID::default();
        ctx.repos
            .subscriptions
            .insert(&subscription(
                Some(user_id.clone()),
                "https://push.example.com/flaky",
            ))
            .await
            .unwrap();
        ctx.repos
            .subscriptions
            .insert(&subscription(
                Some(user_id.clone()),
                "https://push.example.com/ok",
            ))
            .await
            .unwrap();
        push.script("https://push.example.com/flaky", vec![PushOutcome::Failed]);
        ctx.repos.subscriptions = Arc::new(FlakySaveSubscriptionRepo {
            inner: ctx.repos.subscriptions.clone(),
        });

        let r = reminder(ReminderTarget::User(user_id), 0);
        ctx.repos.reminders.insert(&r).await.unwrap();

        let mut usecase = SendDueRemindersUseCase {};
        let report = usecase.execute(&ctx).await.unwrap();

        // Both targets were attempted and the reminder still completed
        assert_eq!(report.delivery_attempts, 2);
        assert_eq!(report.reminders_processed, 1);
        assert_eq!(push.attempts().len(), 2);
        let stored = ctx.repos.reminders.find(&r.id).await.unwrap();
        assert!(stored.delivered_at.is_some());
    }

    #[actix_web::test]
    async fn future_reminders_are_left_alone() {
        let TestContext { ctx, push } = setup();
        let user_id = ID::default();
        ctx.repos
            .subscriptions
            .insert(&subscription(
                Some(user_id.clone()),
                "https://push.example.com/a",
            ))
            .await
            .unwrap();
        let far_future = ctx.sys.get_timestamp_millis() + 1000 * 60 * 60;
        let r = reminder(ReminderTarget::User(user_id), far_future);
        ctx.repos.reminders.insert(&r).await.unwrap();

        let mut usecase = SendDueRemindersUseCase {};
        let report = usecase.execute(&ctx).await.unwrap();
        assert_eq!(report, DeliveryReport::default());
        assert!(push.attempts().is_empty());
        assert!(ctx
            .repos
            .reminders
            .find(&r.id)
            .await
            .unwrap()
            .delivered_at
            .is_none());
    }
}
