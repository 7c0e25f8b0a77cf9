use crate::error::TempoError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use tempo_api_structs::register_device::*;
use tempo_domain::{Device, User};
use tempo_infra::TempoContext;
use tempo_utils::create_random_secret;

const DEVICE_TOKEN_LEN: usize = 64;

pub async fn register_device_controller(
    http_req: actix_web::HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<TempoContext>,
) -> Result<HttpResponse, TempoError> {
    let user = protect_route(&http_req, &ctx).await?;

    let usecase = RegisterDeviceUseCase {
        user,
        label: body.0.label,
    };

    execute(usecase, &ctx)
        .await
        .map(|device| {
            HttpResponse::Created().json(APIResponse {
                device_token: device.token,
            })
        })
        .map_err(TempoError::from)
}

#[derive(Debug)]
pub struct RegisterDeviceUseCase {
    pub user: User,
    pub label: String,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    MissingField(&'static str),
    StorageError,
}

impl From<UseCaseError> for TempoError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::MissingField(field) => {
                Self::BadClientData(format!("The required field `{}` is missing", field))
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for RegisterDeviceUseCase {
    type Response = Device;

    type Error = UseCaseError;

    const NAME: &'static str = "RegisterDevice";

    async fn execute(&mut self, ctx: &TempoContext) -> Result<Self::Response, Self::Error> {
        if self.label.is_empty() {
            return Err(UseCaseError::MissingField("label"));
        }

        let device = Device {
            id: Default::default(),
            user_id: self.user.id.clone(),
            label: self.label.clone(),
            token: create_random_secret(DEVICE_TOKEN_LEN),
            created: ctx.sys.get_timestamp_millis(),
        };

        ctx.repos
            .devices
            .insert(&device)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(device)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempo_infra::setup_inmemory_context;

    #[actix_web::test]
    async fn issues_a_long_lived_device_token() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);
        ctx.repos.users.insert(&user).await.unwrap();

        let mut usecase = RegisterDeviceUseCase {
            user: user.clone(),
            label: "macbook".into(),
        };
        let device = usecase.execute(&ctx).await.unwrap();

        assert_eq!(device.token.len(), DEVICE_TOKEN_LEN);
        let found = ctx.repos.devices.find_by_token(&device.token).await.unwrap();
        assert_eq!(found.user_id, user.id);
        assert_eq!(found.label, "macbook");
    }

    #[actix_web::test]
    async fn rejects_empty_label() {
        let ctx = setup_inmemory_context();
        let user = User::new("secret".into(), 0);

        let mut usecase = RegisterDeviceUseCase {
            user,
            label: "".into(),
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::MissingField("label")
        );
    }
}
