use crate::TempoContext;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tempo_domain::{User, UserGoogleIntegration, ID};
use tracing::warn;

// https://developers.google.com/identity/protocols/oauth2/web-server#httprest_3

const TOKEN_REFETCH_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v4/token";
const CODE_TOKEN_EXCHANGE_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const REQUIRED_OAUTH_SCOPES: [&str; 1] = ["https://www.googleapis.com/auth/calendar"];

struct RefreshTokenRequest {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct RefreshTokenResponse {
    access_token: String,
    // Access token expiry specified in seconds
    expires_in: i64,
}

async fn refresh_access_token(req: RefreshTokenRequest) -> Result<RefreshTokenResponse, ()> {
    let params = [
        ("client_id", req.client_id.as_str()),
        ("client_secret", req.client_secret.as_str()),
        ("refresh_token", req.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];
    let client = reqwest::Client::new();
    let res = client
        .post(TOKEN_REFETCH_ENDPOINT)
        .form(&params)
        .send()
        .await
        .map_err(|_| ())?;

    res.json::<RefreshTokenResponse>().await.map_err(|_| ())
}

// Google api actually returns snake case response
pub struct CodeTokenRequest {
    pub client_id: String,
    pub client_secret: String,
    pub code: String,
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeTokenResponse {
    pub access_token: String,
    pub scope: String,
    pub expires_in: i64,
    pub refresh_token: String,
}

pub async fn exchange_code_token(req: CodeTokenRequest) -> Result<CodeTokenResponse, ()> {
    let params = [
        ("client_id", req.client_id.as_str()),
        ("client_secret", req.client_secret.as_str()),
        ("redirect_uri", req.redirect_uri.as_str()),
        ("code", req.code.as_str()),
        ("grant_type", "authorization_code"),
    ];
    let client = reqwest::Client::new();
    let res = client
        .post(CODE_TOKEN_EXCHANGE_ENDPOINT)
        .form(&params)
        .send()
        .await
        .map_err(|_| ())?;

    let res = res.json::<CodeTokenResponse>().await.map_err(|_| ())?;

    let scopes = res.scope.split(' ').collect::<Vec<_>>();
    for required_scope in REQUIRED_OAUTH_SCOPES.iter() {
        if !scopes.contains(required_scope) {
            return Err(());
        }
    }

    Ok(res)
}

// A second concurrent refresh with an already consumed refresh token fails
// upstream, so refreshes for the same user take a per-user async mutex.
fn refresh_lock(user_id: &ID) -> Arc<tokio::sync::Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>> = OnceLock::new();
    let locks = LOCKS.get_or_init(Default::default);
    let mut locks = locks.lock().unwrap_or_else(|e| e.into_inner());
    locks.entry(user_id.as_string()).or_default().clone()
}

fn valid_access_token(integration: &UserGoogleIntegration, now: i64) -> Option<String> {
    let one_minute_in_millis = 1000 * 60;
    if now + one_minute_in_millis <= integration.access_token_expires_ts {
        // Current access token is still valid for at least one minute
        return Some(integration.access_token.clone());
    }
    None
}

pub async fn get_access_token(user: &mut User, ctx: &TempoContext) -> Option<String> {
    // Check if user has connected to google
    user.google.as_ref()?;

    let now = ctx.sys.get_timestamp_millis();
    if let Some(token) = user.google.as_ref().and_then(|i| valid_access_token(i, now)) {
        return Some(token);
    }
    // Access token has or will expire soon, now renew it

    let lock = refresh_lock(&user.id);
    let _guard = lock.lock().await;

    // Another request may have finished the refresh while we waited for the
    // lock, so re-read the stored tokens first.
    if let Some(fresh) = ctx.repos.users.find(&user.id).await {
        user.google = fresh.google;
    }
    let integration = match &mut user.google {
        Some(integration) => integration,
        None => return None,
    };
    let now = ctx.sys.get_timestamp_millis();
    if let Some(token) = valid_access_token(integration, now) {
        return Some(token);
    }

    let google_settings = match &ctx.config.google {
        Some(settings) => settings,
        None => return None,
    };

    let refresh_token_req = RefreshTokenRequest {
        client_id: google_settings.client_id.clone(),
        client_secret: google_settings.client_secret.clone(),
        refresh_token: integration.refresh_token.clone(),
    };
    match refresh_access_token(refresh_token_req).await {
        Ok(tokens) => {
            integration.access_token = tokens.access_token;
            let now = ctx.sys.get_timestamp_millis();
            let expires_in_millis = tokens.expires_in * 1000;
            integration.access_token_expires_ts = now + expires_in_millis;
            let access_token = integration.access_token.clone();

            // Persist the refreshed tokens before anyone uses them
            if let Err(e) = ctx.repos.users.save(user).await {
                warn!(
                    "Unable to save updated google credentials for user. Error: {:?}",
                    e
                );
            }

            Some(access_token)
        }
        Err(e) => {
            warn!("Unable to refresh access token for user. Error: {:?}", e);
            None
        }
    }
}
