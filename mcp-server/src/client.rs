//! HTTP client for the Veridictum REST API.
//!
//! One client per tool call: the connection pool is disabled so every call
//! opens and releases its own connection. No retries.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::tools::ApiRequest;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("could not connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

impl ClientError {
    fn from_send(url: &str, err: reqwest::Error) -> Self {
        if err.is_connect() {
            ClientError::Connect {
                url: url.to_string(),
                source: err,
            }
        } else {
            ClientError::Request(err)
        }
    }
}

/// Raw HTTP outcome. Status mapping is the dispatcher's job.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

pub struct VeridictumClient {
    client: Client,
    base_url: String,
}

impl VeridictumClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send one request with `Authorization: Bearer <api_key>`.
    pub async fn send(&self, request: &ApiRequest, api_key: &str) -> Result<ApiResponse, ClientError> {
        let url = format!("{}{}", self.base_url, request.path());

        let builder = match request {
            ApiRequest::Get { query, .. } => self.client.get(&url).query(query),
            ApiRequest::Post { body, .. } => self.client.post(&url).json(body),
        };

        tracing::debug!("[CLIENT] {} {}", method_name(request), url);

        let response = builder
            .bearer_auth(api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| ClientError::from_send(&url, e))?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("[CLIENT] {} -> {}", url, status);

        Ok(ApiResponse { status, body })
    }

    /// `GET /health` with a candidate key. Used to check a key before saving it.
    pub async fn health(&self, api_key: &str) -> Result<StatusCode, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| ClientError::from_send(&url, e))?;
        Ok(response.status())
    }
}

fn method_name(request: &ApiRequest) -> &'static str {
    match request {
        ApiRequest::Get { .. } => "GET",
        ApiRequest::Post { .. } => "POST",
    }
}
