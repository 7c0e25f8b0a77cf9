use crate::error::TempoError;
use actix_web::HttpRequest;
use tempo_domain::{Device, User};
use tempo_infra::TempoContext;

fn auth_header(http_req: &HttpRequest) -> Result<&str, TempoError> {
    let header = http_req
        .headers()
        .get("authorization")
        .ok_or_else(|| TempoError::Unauthorized("Missing Authorization header".into()))?;
    header
        .to_str()
        .map_err(|_| TempoError::Unauthorized("Malformed Authorization header".into()))
}

fn scheme_token<'a>(header: &'a str, scheme: &str) -> Option<&'a str> {
    let mut parts = header.splitn(2, ' ');
    let found_scheme = parts.next()?;
    let token = parts.next()?.trim();
    if found_scheme.eq_ignore_ascii_case(scheme) && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Resolves `Authorization: Bearer <token>` to the account it belongs to.
pub async fn protect_route(http_req: &HttpRequest, ctx: &TempoContext) -> Result<User, TempoError> {
    let header = auth_header(http_req)?;
    let token = scheme_token(header, "Bearer").ok_or_else(|| {
        TempoError::Unauthorized("Expected header on the form `Authorization: Bearer <token>`".into())
    })?;
    ctx.repos
        .users
        .find_by_token(token)
        .await
        .ok_or_else(|| TempoError::Unauthorized("Invalid api token".into()))
}

/// Resolves `Authorization: Device <deviceToken>` to the registered device.
/// Used by non-interactive sync agents that hold no session.
pub async fn protect_device_route(
    http_req: &HttpRequest,
    ctx: &TempoContext,
) -> Result<Device, TempoError> {
    let header = auth_header(http_req)?;
    let token = scheme_token(header, "Device").ok_or_else(|| {
        TempoError::Unauthorized(
            "Expected header on the form `Authorization: Device <deviceToken>`".into(),
        )
    })?;
    ctx.repos
        .devices
        .find_by_token(token)
        .await
        .ok_or_else(|| TempoError::Unauthorized("Invalid device token".into()))
}

/// Sync endpoints accept both auth schemes. A device token is resolved to the
/// user that registered the device, together with the device itself.
pub async fn protect_sync_route(
    http_req: &HttpRequest,
    ctx: &TempoContext,
) -> Result<(User, Option<Device>), TempoError> {
    let header = auth_header(http_req)?;
    if let Some(token) = scheme_token(header, "Bearer") {
        let user = ctx
            .repos
            .users
            .find_by_token(token)
            .await
            .ok_or_else(|| TempoError::Unauthorized("Invalid api token".into()))?;
        return Ok((user, None));
    }
    if let Some(token) = scheme_token(header, "Device") {
        let device = ctx
            .repos
            .devices
            .find_by_token(token)
            .await
            .ok_or_else(|| TempoError::Unauthorized("Invalid device token".into()))?;
        let user = ctx
            .repos
            .users
            .find(&device.user_id)
            .await
            .ok_or_else(|| TempoError::Unauthorized("Device owner no longer exists".into()))?;
        return Ok((user, Some(device)));
    }
    Err(TempoError::Unauthorized(
        "Expected header on the form `Authorization: Bearer <token>` or `Authorization: Device <deviceToken>`".into(),
    ))
}
