//! Client-side filter state
//!
//! Owns the active filter set and derives (never owns) the filtered
//! projection of the canonical task list. The set is persisted per
//! identity so a returning user finds their filters again.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{Filter, Task};
use crate::events::{StoreBus, StoreEvent};
use crate::storage::KeyValueStorage;
use crate::stores::auth::SessionHandle;

/// Narrow `tasks` through each active filter, in filter order.
///
/// Pure: the input is never mutated and unknown filter names are ignored.
/// For the `"state"` filter an empty value set, or one naming both states,
/// means "show all".
pub fn apply_filter_set(filters: &[Filter], tasks: &[Task]) -> Vec<Task> {
    let mut tasks: Vec<Task> = tasks.to_vec();
    for filter in filters {
        match filter.filter_name.as_str() {
            "state" => {
                let values = &filter.filter_values;
                let wants_done = values.iter().any(|v| v == "done");
                let wants_todo = values.iter().any(|v| v == "todo");
                if values.is_empty() || (wants_done && wants_todo) {
                    continue;
                }
                tasks.retain(|task| (wants_done && task.completed) || (wants_todo && !task.completed));
            }
            _ => {}
        }
    }
    tasks
}

/// Active filter predicates, scoped to the authenticated identity
pub struct FiltersStore {
    filters: Mutex<Vec<Filter>>,
    storage: Arc<dyn KeyValueStorage>,
    session: SessionHandle,
    bus: StoreBus,
}

impl FiltersStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, session: SessionHandle, bus: StoreBus) -> Self {
        Self {
            filters: Mutex::new(Vec::new()),
            storage,
            session,
            bus,
        }
    }

    /// Project the canonical list through the active filter set
    pub async fn apply_filters(&self, tasks: &[Task]) -> Vec<Task> {
        let filters = self.filters.lock().await;
        apply_filter_set(&filters, tasks)
    }

    /// True iff some filter is actively narrowing (holds exactly one value)
    pub async fn is_filter_applied(&self) -> bool {
        self.filters
            .lock()
            .await
            .iter()
            .any(|f| f.filter_values.len() == 1)
    }

    /// Upsert a filter by name, persist the set, and announce the change.
    ///
    /// The composition root reacts to the announcement by reloading tasks,
    /// so the projection reflects the new filter immediately.
    pub async fn add_or_update_filter(&self, name: &str, values: Vec<String>) {
        debug!(%name, ?values, "add_or_update_filter: called");
        let snapshot = {
            let mut filters = self.filters.lock().await;
            match filters.iter_mut().find(|f| f.filter_name == name) {
                Some(existing) => existing.filter_values = values,
                None => filters.push(Filter::new(name, values)),
            }
            filters.clone()
        };

        self.persist(&snapshot).await;
        self.bus.publish(StoreEvent::FiltersChanged);
    }

    pub async fn get_filter(&self, name: &str) -> Option<Filter> {
        self.filters.lock().await.iter().find(|f| f.filter_name == name).cloned()
    }

    pub async fn set_filters(&self, filters: Vec<Filter>) {
        *self.filters.lock().await = filters;
    }

    /// Load the persisted filter set for the current identity scope,
    /// defaulting to empty.
    pub async fn set_filters_from_storage(&self) {
        let key = self.storage_key().await;
        let filters = match self.storage.get(&key).await {
            Some(value) => match serde_json::from_value(value) {
                Ok(filters) => filters,
                Err(e) => {
                    warn!(%key, error = %e, "set_filters_from_storage: unreadable filter set, starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        debug!(%key, count = filters.len(), "set_filters_from_storage: loaded");
        *self.filters.lock().await = filters;
    }

    async fn persist(&self, filters: &[Filter]) {
        let key = self.storage_key().await;
        match serde_json::to_value(filters) {
            Ok(value) => self.storage.set(&key, value).await,
            Err(e) => warn!(%key, error = %e, "persist: serialization failed"),
        }
    }

    /// Identity-scoped storage key; falls back to the guest scope when no
    /// valid session exists. Never fails.
    async fn storage_key(&self) -> String {
        match self.session.user_id().await {
            Some(id) => format!("filters_{id}"),
            None => "filters_guest".to_string(),
        }
    }
}
