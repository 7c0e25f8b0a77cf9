use crate::error::TempoError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use tempo_api_structs::unsubscribe::*;
use tempo_domain::ID;
use tempo_infra::TempoContext;

pub async fn unsubscribe_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let body = body.0;
    let usecase = UnsubscribeUseCase {
        id: body.id,
        endpoint: body.endpoint,
    };

    execute(usecase, &ctx)
        .await
        .map(|_| HttpResponse::Ok().json(APIResponse { ok: true }))
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct UnsubscribeUseCase {
    pub id: Option<ID>,
    pub endpoint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    MissingReference,
}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::MissingReference => {
                Self::BadClientData("Either `id` or `endpoint` must be provided".into())
            }
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for UnsubscribeUseCase {
    type Response = ();

    type Error = UseCaseError;

    const NAME: &'static str = "Unsubscribe";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        // "Already gone" counts as success, unsubscribing is idempotent
        match (&self.id, &self.endpoint) {
            (Some(id), _) => {
                ctx.repos.subscriptions.delete(id).await;
            }
            (None, Some(endpoint)) => {
                ctx.repos.subscriptions.delete_by_endpoint(endpoint).await;
            }
            (None, None) => return Err(UseCaseError::MissingReference),
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::subscription::subscribe::SubscribeUseCase;
    use tempo_infra::setup_inmemory_context;

    #[actix_web::test]
    async fn removes_by_id_or_endpoint_and_is_idempotent() {
        let ctx = setup_inmemory_context();
        let mut subscribe = SubscribeUseCase {
            endpoint: "https://push.example.com/sub_1".into(),
            keys: serde_json::json!({}),
            device_id: None,
            user_id: None,
        };
        let subscription = subscribe.execute(&ctx).await.unwrap();

        let mut usecase = UnsubscribeUseCase {
            id: Some(subscription.id.clone()),
            endpoint: None,
        };
        usecase.execute(&ctx).await.unwrap();
        assert!(ctx.repos.subscriptions.find(&subscription.id).await.is_none());

        // Unsubscribing something already gone still succeeds
        let mut again = UnsubscribeUseCase {
            id: None,
            endpoint: Some("https://push.example.com/sub_1".into()),
        };
        assert!(again.execute(&ctx).await.is_ok());
    }

    #[actix_web::test]
    async fn requires_a_reference() {
        let ctx = setup_inmemory_context();
        let mut usecase = UnsubscribeUseCase {
            id: None,
            endpoint: None,
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::MissingReference
        );
    }
}
