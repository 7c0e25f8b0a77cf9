use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum APIError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected status code: {0}")]
    UnexpectedStatusCode(u16),
    #[error("Malformed api response")]
    MalformedResponse,
}

pub type APIResponse<T> = Result<T, APIError>;

pub(crate) struct BaseClient {
    address: String,
    api_key: Option<String>,
    client: Client,
}

impl BaseClient {
    pub fn new(address: String) -> Self {
        Self {
            address,
            api_key: None,
            client: Client::new(),
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}/{}", self.address, path));
        if let Some(api_key) = &self.api_key {
            builder = builder.header("authorization", format!("Bearer {}", api_key));
        }
        builder
    }

    async fn handle<T: DeserializeOwned>(
        &self,
        res: Result<reqwest::Response, reqwest::Error>,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = res.map_err(|e| APIError::Network(e.to_string()))?;
        if res.status() != expected_status_code {
            return Err(APIError::UnexpectedStatusCode(res.status().as_u16()));
        }
        res.json::<T>().await.map_err(|_| APIError::MalformedResponse)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: String,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = self.request(reqwest::Method::GET, &path).send().await;
        self.handle(res, expected_status_code).await
    }

    pub async fn post<S: Serialize, T: DeserializeOwned>(
        &self,
        body: S,
        path: String,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = self
            .request(reqwest::Method::POST, &path)
            .json(&body)
            .send()
            .await;
        self.handle(res, expected_status_code).await
    }
}
