use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tempo_domain::Subscription;
use tracing::error;

/// The notification content posted to a push endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: String,
    pub body: String,
}

/// How a single delivery attempt ended. `Gone` means the push provider
/// confirmed the endpoint no longer exists and the subscription must be
/// removed from the registry. `Failed` covers every transient error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    Gone,
    Failed,
}

#[async_trait::async_trait]
pub trait IPushSender: Send + Sync {
    async fn send(&self, subscription: &Subscription, payload: &PushPayload) -> PushOutcome;
}

/// Posts the payload to the subscription endpoint. Delivery past the push
/// provider's API boundary is best effort, fire and forget.
pub struct HttpPushSender {
    client: reqwest::Client,
}

impl HttpPushSender {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpPushSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IPushSender for HttpPushSender {
    async fn send(&self, subscription: &Subscription, payload: &PushPayload) -> PushOutcome {
        let res = self
            .client
            .post(&subscription.endpoint)
            .json(payload)
            .send()
            .await;
        match res {
            Ok(res) if res.status().is_success() => PushOutcome::Delivered,
            Ok(res)
                if res.status() == reqwest::StatusCode::NOT_FOUND
                    || res.status() == reqwest::StatusCode::GONE =>
            {
                PushOutcome::Gone
            }
            Ok(res) => {
                error!(
                    "Push endpoint {} answered with status: {}",
                    subscription.endpoint,
                    res.status()
                );
                PushOutcome::Failed
            }
            Err(e) => {
                error!(
                    "Unable to reach push endpoint {}: {:?}",
                    subscription.endpoint, e
                );
                PushOutcome::Failed
            }
        }
    }
}

#[derive(Default)]
struct StubPushSenderState {
    /// (endpoint, title) per attempt, in attempt order
    attempts: Vec<(String, String)>,
    /// Scripted outcomes per endpoint, consumed front to back. Endpoints
    /// without a script always deliver.
    scripted: HashMap<String, VecDeque<PushOutcome>>,
}

/// Push sender for tests: records every attempt and answers with scripted
/// outcomes instead of performing network calls.
#[derive(Clone, Default)]
pub struct StubPushSender {
    state: Arc<Mutex<StubPushSenderState>>,
}

impl StubPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, endpoint: &str, outcomes: Vec<PushOutcome>) {
        let mut state = self.state.lock().unwrap();
        state
            .scripted
            .entry(endpoint.to_string())
            .or_default()
            .extend(outcomes);
    }

    pub fn attempts(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().attempts.clone()
    }
}

#[async_trait::async_trait]
impl IPushSender for StubPushSender {
    async fn send(&self, subscription: &Subscription, payload: &PushPayload) -> PushOutcome {
        let mut state = self.state.lock().unwrap();
        state
            .attempts
            .push((subscription.endpoint.clone(), payload.title.clone()));
        state
            .scripted
            .get_mut(&subscription.endpoint)
            .and_then(|outcomes| outcomes.pop_front())
            .unwrap_or(PushOutcome::Delivered)
    }
}
