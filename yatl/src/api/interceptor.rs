//! Session invalidation middleware
//!
//! Wraps a transport and watches every response for a 401. The original
//! client did this with a response interceptor that reached into a global
//! auth store; here the notice travels over an injected channel and the
//! composition root decides what to do with it (see `App`).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{Api, ApiError};

/// Notice that a request was rejected with 401 outside the logout path
#[derive(Debug, Clone)]
pub struct Unauthorized {
    pub url: String,
}

/// Middleware that reports session invalidation while propagating errors.
///
/// A 401 on the logout endpoint itself is not reported: the logout call is
/// what tears the session down, reporting it would loop.
pub struct SessionGuard {
    inner: Arc<dyn Api>,
    tx: mpsc::UnboundedSender<Unauthorized>,
}

impl SessionGuard {
    /// Wrap a transport, returning the guard and the invalidation receiver
    pub fn new(inner: Arc<dyn Api>) -> (Arc<Self>, mpsc::UnboundedReceiver<Unauthorized>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { inner, tx }), rx)
    }

    fn inspect<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(ApiError::Http { status: 401, url, .. }) = &result {
            if !url.contains("/logout") {
                warn!(%url, "inspect: unauthorized response, reporting session invalidation");
                // Receiver gone means the app is shutting down; nothing to do
                let _ = self.tx.send(Unauthorized { url: url.clone() });
            } else {
                debug!(%url, "inspect: 401 on logout endpoint, not reported");
            }
        }
        result
    }
}

#[async_trait]
impl Api for SessionGuard {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        let result = self.inner.get(path).await;
        self.inspect(result)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        let result = self.inner.post(path, body).await;
        self.inspect(result)
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        let result = self.inner.patch(path, body).await;
        self.inspect(result)
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        let result = self.inner.delete(path).await;
        self.inspect(result)
    }

    async fn fetch_csrf_cookie(&self) -> Result<(), ApiError> {
        let result = self.inner.fetch_csrf_cookie().await;
        self.inspect(result)
    }
}
