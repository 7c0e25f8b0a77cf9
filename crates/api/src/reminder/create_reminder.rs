use crate::error::TempoError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use tempo_api_structs::create_reminder::*;
use tempo_domain::{Reminder, ReminderTarget, ID};
use tempo_infra::TempoContext;

pub async fn create_reminder_controller(
    http_req: actix_web::HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    protect_route(&http_req, &ctx).await?;

    let body = body.0;
    let usecase = CreateReminderUseCase {
        subscription_id: body.subscription_id,
        user_id: body.user_id,
        title: body.title,
        body: body.body,
        deliver_at: body.deliver_at,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| {
            HttpResponse::Created().json(APIResponse {
                reminder_id: reminder.id,
            })
        })
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct CreateReminderUseCase {
    pub subscription_id: Option<ID>,
    pub user_id: Option<ID>,
    pub title: String,
    pub body: String,
    pub deliver_at: Option<i64>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    MissingDeliverAt,
    AmbiguousTarget,
    SubscriptionNotFound(ID),
    StorageError,
}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::MissingDeliverAt => {
                Self::BadClientData("The required field `deliverAt` is missing".into())
            }
            UseCaseError::AmbiguousTarget => Self::BadClientData(
                "Exactly one of `subscriptionId` and `userId` must be provided".into(),
            ),
            UseCaseError::SubscriptionNotFound(id) => Self::NotFound(format!(
                "The subscription with id: {}, was not found.",
                id
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateReminder";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        let deliver_at = self.deliver_at.ok_or(UseCaseError::MissingDeliverAt)?;

        // Device-scoped and broadcast targeting are mutually exclusive
        let target = match (&self.subscription_id, &self.user_id) {
            (Some(subscription_id), None) => {
                if ctx
                    .repos
                    .subscriptions
                    .find(subscription_id)
                    .await
                    .is_none()
                {
                    return Err(UseCaseError::SubscriptionNotFound(subscription_id.clone()));
                }
                ReminderTarget::Subscription(subscription_id.clone())
            }
            (None, Some(user_id)) => ReminderTarget::User(user_id.clone()),
            _ => return Err(UseCaseError::AmbiguousTarget),
        };

        let reminder = Reminder {
            id: Default::default(),
            target,
            title: self.title.clone(),
            body: self.body.clone(),
            deliver_at,
            delivered_at: None,
            created: ctx.sys.get_timestamp_millis(),
        };

        ctx.repos
            .reminders
            .insert(&reminder)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(reminder)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempo_domain::Subscription;
    use tempo_infra::setup_inmemory_context;

    #[actix_web::test]
    async fn rejects_missing_deliver_at() {
        let ctx = setup_inmemory_context();
        let mut usecase = CreateReminderUseCase {
            subscription_id: None,
            user_id: Some(Default::default()),
            title: "Standup".into(),
            body: "in 10 minutes".into(),
            deliver_at: None,
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::MissingDeliverAt
        );
    }

    #[actix_web::test]
    async fn rejects_both_and_neither_target() {
        let ctx = setup_inmemory_context();
        for (subscription_id, user_id) in [
            (None, None),
            (Some(ID::default()), Some(ID::default())),
        ] {
            let mut usecase = CreateReminderUseCase {
                subscription_id,
                user_id,
                title: "Standup".into(),
                body: "in 10 minutes".into(),
                deliver_at: Some(1000),
            };
            assert_eq!(
                usecase.execute(&ctx).await.unwrap_err(),
                UseCaseError::AmbiguousTarget
            );
        }
    }

    #[actix_web::test]
    async fn creates_a_device_scoped_reminder() {
        let ctx = setup_inmemory_context();
        let subscription = Subscription {
            id: Default::default(),
            user_id: None,
            device_id: Some("device_1".into()),
            endpoint: "https://push.example.com/sub_1".into(),
            keys: serde_json::json!({}),
            failure_count: 0,
            created: 0,
        };
        ctx.repos.subscriptions.insert(&subscription).await.unwrap();

        let mut usecase = CreateReminderUseCase {
            subscription_id: Some(subscription.id.clone()),
            user_id: None,
            title: "Standup".into(),
            body: "in 10 minutes".into(),
            deliver_at: Some(1000),
        };
        let reminder = usecase.execute(&ctx).await.unwrap();
        assert_eq!(
            reminder.target,
            ReminderTarget::Subscription(subscription.id)
        );
        assert!(reminder.delivered_at.is_none());
    }

    #[actix_web::test]
    async fn unknown_subscription_answers_not_found() {
        let ctx = setup_inmemory_context();
        let missing = ID::default();
        let mut usecase = CreateReminderUseCase {
            subscription_id: Some(missing.clone()),
            user_id: None,
            title: "Standup".into(),
            body: "in 10 minutes".into(),
            deliver_at: Some(1000),
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::SubscriptionNotFound(missing)
        );
    }
}
