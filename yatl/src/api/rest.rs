//! reqwest-backed Api implementation
//!
//! Carries the session on a cookie store, so every request after the CSRF
//! pre-flight is authenticated the way the server expects.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{Api, ApiError, log_error};
use crate::config::Config;

/// HTTP client for the task API
pub struct RestClient {
    base_url: String,
    csrf_url: String,
    http: Client,
}

impl RestClient {
    /// Create a new client from configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        debug!(api_url = %config.api_url, "from_config: called");

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let http = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            csrf_url: config.csrf_url.clone(),
            http,
        })
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "request: called");

        let mut builder = self.http.request(method, &url);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                let err = ApiError::from(e);
                log_error(&err, path);
                return Err(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let err = ApiError::Http {
                status: status.as_u16(),
                url: url.clone(),
                body: response.json().await.ok(),
            };
            log_error(&err, path);
            return Err(err);
        }

        Self::decode(response).await
    }

    /// Decode a successful response body, tolerating empty acknowledgements
    async fn decode(response: reqwest::Response) -> Result<Value, ApiError> {
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let text = response.text().await.map_err(ApiError::from)?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Api for RestClient {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, None).await
    }

    async fn fetch_csrf_cookie(&self) -> Result<(), ApiError> {
        debug!(url = %self.csrf_url, "fetch_csrf_cookie: called");
        let response = self.http.get(&self.csrf_url).send().await.map_err(|e| {
            let err = ApiError::from(e);
            log_error(&err, "csrf");
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = ApiError::Http {
                status: status.as_u16(),
                url: self.csrf_url.clone(),
                body: None,
            };
            log_error(&err, "csrf");
            return Err(err);
        }
        Ok(())
    }
}
