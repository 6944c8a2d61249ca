//! Shared test transport

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use yatl::{Api, ApiError};

/// FIFO-scripted transport for integration tests.
///
/// Responses are consumed in order across all methods; every call is
/// recorded as `(method, path)`.
#[derive(Default)]
pub struct ScriptedApi {
    script: Mutex<VecDeque<Result<Value, ApiError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, value: Value) {
        self.script.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_http_err(&self, status: u16, url: &str) {
        self.script.lock().unwrap().push_back(Err(ApiError::Http {
            status,
            url: url.to_string(),
            body: None,
        }));
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, method: &str, path: &str) -> Result<Value, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), path.to_string()));
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ApiError::Http {
                status: 500,
                url: format!("script exhausted: {path}"),
                body: None,
            })
        })
    }
}

#[async_trait]
impl Api for ScriptedApi {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.next("GET", path)
    }

    async fn post(&self, path: &str, _body: Value) -> Result<Value, ApiError> {
        self.next("POST", path)
    }

    async fn patch(&self, path: &str, _body: Value) -> Result<Value, ApiError> {
        self.next("PATCH", path)
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.next("DELETE", path)
    }

    async fn fetch_csrf_cookie(&self) -> Result<(), ApiError> {
        self.next("GET", "/csrf-cookie").map(|_| ())
    }
}

/// Task JSON as the server reports it
pub fn task_json(id: i64, title: &str, completed: bool, order: i64) -> Value {
    serde_json::json!({ "id": id, "title": title, "completed": completed, "order": order })
}

/// Route log output through tracing when RUST_LOG asks for it
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
