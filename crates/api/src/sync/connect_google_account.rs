use crate::error::TempoError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use tempo_api_structs::connect_google_account::*;
use tempo_domain::{User, UserGoogleIntegration};
use tempo_infra::google_calendar::auth_provider::{exchange_code_token, CodeTokenRequest};
use tempo_infra::TempoContext;

pub async fn connect_google_account_controller(
    http_req: actix_web::HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let user = protect_route(&http_req, &ctx).await?;

    let body = body.0;
    let usecase = ConnectGoogleAccountUseCase {
        user,
        code: body.code,
        redirect_uri: body.redirect_uri,
    };

    execute(usecase, &ctx)
        .await
        .map(|_| HttpResponse::Ok().json(APIResponse { ok: true }))
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct ConnectGoogleAccountUseCase {
    pub user: User,
    pub code: String,
    pub redirect_uri: String,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    IntegrationNotConfigured,
    OAuthExchangeFailed,
    StorageError,
}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::IntegrationNotConfigured => Self::BadClientData(
                "The google calendar integration is not configured on this server".into(),
            ),
            UseCaseError::OAuthExchangeFailed => {
                Self::Unauthorized("Failed to exchange the given oauth code".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for ConnectGoogleAccountUseCase {
    type Response = ();

    type Error = UseCaseError;

    const NAME: &'static str = "ConnectGoogleAccount";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        let settings = ctx
            .config
            .google
            .as_ref()
            .ok_or(UseCaseError::IntegrationNotConfigured)?;

        let tokens = exchange_code_token(CodeTokenRequest {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            code: self.code.clone(),
            redirect_uri: self.redirect_uri.clone(),
        })
        .await
        .map_err(|_| UseCaseError::OAuthExchangeFailed)?;

        let now = ctx.sys.get_timestamp_millis();
        self.user.google = Some(UserGoogleIntegration {
            access_token: tokens.access_token,
            access_token_expires_ts: now + tokens.expires_in * 1000,
            refresh_token: tokens.refresh_token,
        });

        ctx.repos
            .users
            .save(&self.user)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(())
    }
}
