//! Api trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::ApiError;

/// Transport contract for the REST surface.
///
/// Paths are relative to the configured API base URL. Bodies and responses
/// are JSON values; typed decoding happens in the callers. Implementations
/// must log failures with status/url context and propagate them, never
/// swallow them.
#[async_trait]
pub trait Api: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, ApiError>;

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError>;

    async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError>;

    async fn delete(&self, path: &str) -> Result<Value, ApiError>;

    /// Session/CSRF pre-flight against the separate cookie-issuing endpoint.
    ///
    /// Required before login and once at startup.
    async fn fetch_csrf_cookie(&self) -> Result<(), ApiError>;
}
