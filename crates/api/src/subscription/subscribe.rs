use crate::error::TempoError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use tempo_api_structs::subscribe::*;
use tempo_domain::{Subscription, ID};
use tempo_infra::TempoContext;

/// Subscriptions may be anonymous (device-scoped), so this route takes its
/// scope from the body instead of an auth guard.
pub async fn subscribe_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let body = body.0;
    let usecase = SubscribeUseCase {
        endpoint: body.subscription.endpoint,
        keys: body.subscription.keys,
        device_id: body.device_id,
        user_id: body.user_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|subscription| HttpResponse::Created().json(APIResponse {
            id: subscription.id,
        }))
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct SubscribeUseCase {
    pub endpoint: String,
    pub keys: serde_json::Value,
    pub device_id: Option<String>,
    pub user_id: Option<ID>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    MissingEndpoint,
    StorageError,
}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::MissingEndpoint => {
                Self::BadClientData("The subscription `endpoint` is missing".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SubscribeUseCase {
    type Response = Subscription;

    type Error = UseCaseError;

    const NAME: &'static str = "Subscribe";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        if self.endpoint.is_empty() {
            return Err(UseCaseError::MissingEndpoint);
        }

        // The endpoint is the dedup key: re-registering refreshes the
        // existing row instead of creating a second one
        if let Some(mut existing) = ctx
            .repos
            .subscriptions
            .find_by_endpoint(&self.endpoint)
            .await
        {
            existing.keys = self.keys.clone();
            if self.user_id.is_some() {
                existing.user_id = self.user_id.clone();
            }
            if self.device_id.is_some() {
                existing.device_id = self.device_id.clone();
            }
            ctx.repos
                .subscriptions
                .save(&existing)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
            return Ok(existing);
        }

        let subscription = Subscription {
            id: Default::default(),
            user_id: self.user_id.clone(),
            device_id: self.device_id.clone(),
            endpoint: self.endpoint.clone(),
            keys: self.keys.clone(),
            failure_count: 0,
            created: ctx.sys.get_timestamp_millis(),
        };

        ctx.repos
            .subscriptions
            .insert(&subscription)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(subscription)
    }
}
