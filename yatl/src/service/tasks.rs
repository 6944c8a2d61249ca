//! Task CRUD contract
//!
//! Thin wrapper over the transport that normalizes responses and keeps the
//! soft/hard failure split: local validation problems come back as
//! `CallResponse { ok: false }`, transport and HTTP failures as `Err`.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::api::{Api, ApiError, log_error};
use crate::domain::Task;

/// Outcome of a mutating call that completed without throwing
#[derive(Debug, Clone, Default)]
pub struct CallResponse {
    pub ok: bool,
    pub data: Option<Task>,
    pub message: Option<String>,
}

impl CallResponse {
    fn ok(data: Option<Task>) -> Self {
        Self {
            ok: true,
            data,
            message: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Task CRUD over the REST surface
pub struct TaskService {
    api: Arc<dyn Api>,
}

impl TaskService {
    pub fn new(api: Arc<dyn Api>) -> Self {
        Self { api }
    }

    /// Fetch the canonical task list, sorted ascending by `order`
    pub async fn fetch_all(&self) -> Result<Vec<Task>, ApiError> {
        debug!("fetch_all: called");
        let value = self.api.get("/tasks").await.map_err(|e| {
            log_error(&e, "tasks.fetch_all");
            e
        })?;

        let mut tasks: Vec<Task> = serde_json::from_value(value)?;
        tasks.sort_by_key(|t| t.order);
        Ok(tasks)
    }

    /// Create a task.
    ///
    /// An empty title short-circuits locally; no request is made.
    pub async fn create(&self, title: &str) -> Result<CallResponse, ApiError> {
        debug!(title_len = title.len(), "create: called");
        if title.is_empty() {
            return Ok(CallResponse::fail("Task title is required"));
        }

        let value = self.api.post("/tasks", json!({ "title": title })).await.map_err(|e| {
            log_error(&e, "tasks.create");
            e
        })?;

        Ok(CallResponse::ok(serde_json::from_value(value).ok()))
    }

    /// Delete a task by id
    pub async fn remove(&self, task: &Task) -> Result<CallResponse, ApiError> {
        debug!(task_id = task.id, "remove: called");
        self.api.delete(&format!("/tasks/{}", task.id)).await.map_err(|e| {
            log_error(&e, "tasks.remove");
            e
        })?;

        Ok(CallResponse::ok(None))
    }

    /// Patch a task by id with the full task payload
    pub async fn update(&self, task: &Task) -> Result<CallResponse, ApiError> {
        debug!(task_id = task.id, "update: called");
        let body = serde_json::to_value(task)?;
        let value = self
            .api
            .patch(&format!("/tasks/{}", task.id), body)
            .await
            .map_err(|e| {
                log_error(&e, "tasks.update");
                e
            })?;

        Ok(CallResponse::ok(serde_json::from_value(value).ok()))
    }
}
