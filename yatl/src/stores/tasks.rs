//! Canonical task list synchronization
//!
//! Owns the full, unfiltered task sequence as last reported by the server.
//! Every mutation goes to the service first and then resynchronizes by
//! reloading the whole list; there is no optimistic merging. The rendered
//! view is a projection of the canonical list through the filter store.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::api::ApiError;
use crate::domain::Task;
use crate::events::{StoreBus, StoreEvent};
use crate::service::TaskService;
use crate::stores::filters::FiltersStore;
use crate::stores::toast::{ToastKind, ToastStore};

/// Longest accepted task title, in characters
pub const MAX_TITLE_LEN: usize = 255;

#[derive(Default)]
struct TasksState {
    tasks: Vec<Task>,
    new_task_title: String,
}

/// Server-synchronized task state
pub struct TasksStore {
    state: Mutex<TasksState>,
    service: TaskService,
    filters: Arc<FiltersStore>,
    toasts: ToastStore,
    bus: StoreBus,
}

impl TasksStore {
    pub fn new(service: TaskService, filters: Arc<FiltersStore>, toasts: ToastStore, bus: StoreBus) -> Self {
        Self {
            state: Mutex::new(TasksState::default()),
            service,
            filters,
            toasts,
            bus,
        }
    }

    /// Replace the canonical list wholesale from the server.
    ///
    /// This is the only reconciliation mechanism: it runs after every
    /// successful or soft-failed mutation, and the last reload to complete
    /// determines the displayed state.
    pub async fn load_tasks(&self) -> Result<(), ApiError> {
        debug!("load_tasks: called");
        let tasks = self.service.fetch_all().await?;
        self.state.lock().await.tasks = tasks;
        self.bus.publish(StoreEvent::TasksRefreshed);
        Ok(())
    }

    /// The canonical (unfiltered) list
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    /// The render-facing projection of the canonical list
    pub async fn visible_tasks(&self) -> Vec<Task> {
        let tasks = self.tasks().await;
        self.filters.apply_filters(&tasks).await
    }

    pub async fn new_task_title(&self) -> String {
        self.state.lock().await.new_task_title.clone()
    }

    pub async fn set_new_task_title(&self, title: impl Into<String>) {
        self.state.lock().await.new_task_title = title.into();
    }

    /// Create a task from the buffered title.
    ///
    /// An over-long title never reaches the network: toast, clear the
    /// buffer, done. Soft failures toast and still resynchronize; a hard
    /// failure toasts and leaves the previous canonical list in place.
    pub async fn create_task(&self) {
        let title = self.new_task_title().await;
        debug!(title_len = title.len(), "create_task: called");

        if title.is_empty() {
            debug!("create_task: empty title buffer, nothing to do");
            return;
        }

        if title.chars().count() > MAX_TITLE_LEN {
            self.toasts.show("Task name is too long !", ToastKind::Error).await;
            self.state.lock().await.new_task_title.clear();
            return;
        }

        match self.service.create(&title).await {
            Ok(response) => {
                if !response.ok {
                    let message = response.message.unwrap_or_default();
                    self.toasts
                        .show(format!("Failed to create task : {message}"), ToastKind::Error)
                        .await;
                }
                self.state.lock().await.new_task_title.clear();
                if let Err(e) = self.load_tasks().await {
                    self.toasts
                        .show(format!("Error creating task: {}", e.user_message()), ToastKind::Error)
                        .await;
                }
            }
            Err(e) => {
                self.toasts
                    .show(format!("Error creating task: {}", e.user_message()), ToastKind::Error)
                    .await;
            }
        }
    }

    /// Delete a task, then resynchronize
    pub async fn delete_task(&self, task: &Task) {
        debug!(task_id = task.id, "delete_task: called");
        match self.service.remove(task).await {
            Ok(response) => {
                if !response.ok {
                    let message = response.message.unwrap_or_default();
                    self.toasts
                        .show(format!("Failed to delete task : {message}"), ToastKind::Error)
                        .await;
                }
                if let Err(e) = self.load_tasks().await {
                    self.toasts
                        .show(format!("Error deleting task: {}", e.user_message()), ToastKind::Error)
                        .await;
                }
            }
            Err(e) => {
                self.toasts
                    .show(format!("Error deleting task: {}", e.user_message()), ToastKind::Error)
                    .await;
            }
        }
    }

    /// Patch a task, rolling the title back to `original_title` when the
    /// edit cannot be persisted.
    ///
    /// On success the follow-up reload overwrites any local field mutation
    /// with server truth anyway; the rollback matters on the paths where
    /// no reload happens or the server refused the edit.
    pub async fn patch_task(&self, task: &Task, original_title: &str) {
        debug!(task_id = task.id, "patch_task: called");

        if task.title.chars().count() > MAX_TITLE_LEN {
            self.toasts.show("Task name is too long !", ToastKind::Error).await;
            self.rollback_title(task.id, original_title).await;
            return;
        }

        match self.service.update(task).await {
            Ok(response) => {
                if !response.ok {
                    self.toasts.show("Failed to update task", ToastKind::Error).await;
                    self.rollback_title(task.id, original_title).await;
                }
                if let Err(e) = self.load_tasks().await {
                    self.toasts
                        .show(format!("Error updating task: {}", e.user_message()), ToastKind::Error)
                        .await;
                    self.rollback_title(task.id, original_title).await;
                }
            }
            Err(e) => {
                self.toasts
                    .show(format!("Error updating task: {}", e.user_message()), ToastKind::Error)
                    .await;
                self.rollback_title(task.id, original_title).await;
            }
        }
    }

    /// Reassign `order = index + 1` across the canonical sequence, in place
    pub async fn update_orders_from_index(&self) {
        let mut state = self.state.lock().await;
        for (index, task) in state.tasks.iter_mut().enumerate() {
            task.order = index as i64 + 1;
        }
    }

    /// Apply a drag-reorder gesture: move the task at `from` to `to`,
    /// renumber, and persist only the moved task. The reload triggered by
    /// the patch refreshes the rest from server state.
    pub async fn move_task(&self, from: usize, to: usize) {
        debug!(from, to, "move_task: called");
        {
            let mut state = self.state.lock().await;
            if from >= state.tasks.len() || to >= state.tasks.len() {
                debug!(from, to, len = state.tasks.len(), "move_task: index out of range");
                return;
            }
            let task = state.tasks.remove(from);
            state.tasks.insert(to, task);
        }

        self.update_orders_from_index().await;

        let (moved, original_title) = {
            let state = self.state.lock().await;
            let task = state.tasks[to].clone();
            let title = task.title.clone();
            (task, title)
        };
        debug!(task_id = moved.id, new_order = moved.order, "move_task: persisting moved task");
        self.patch_task(&moved, &original_title).await;
    }

    /// Drop all local task state (used on logout)
    pub async fn reset(&self) {
        debug!("reset: called");
        let mut state = self.state.lock().await;
        state.tasks.clear();
        state.new_task_title.clear();
        self.bus.publish(StoreEvent::TasksRefreshed);
    }

    async fn rollback_title(&self, task_id: i64, original_title: &str) {
        let mut state = self.state.lock().await;
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == task_id) {
            task.title = original_title.to_string();
        }
    }
}
