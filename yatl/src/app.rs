//! Composition root
//!
//! Builds the transport, storage, and stores, and wires the cross-cutting
//! channels: session invalidation notices drain into `AuthStore::logout`,
//! and filter changes trigger a task reload. Consumers depend on the
//! injected parts, never on ambient singletons.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{Api, RestClient, SessionGuard, Unauthorized};
use crate::config::Config;
use crate::events::{StoreBus, StoreEvent};
use crate::service::TaskService;
use crate::storage::{FileStorage, KeyValueStorage};
use crate::stores::auth::{AuthStore, SessionHandle};
use crate::stores::filters::FiltersStore;
use crate::stores::tasks::TasksStore;
use crate::stores::toast::ToastStore;

/// Route-change sink. Page routing itself lives outside this crate; the
/// stores only ever ask to go somewhere.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn push(&self, route: &str);
}

/// Navigator that drops route changes (headless embeddings)
#[derive(Default)]
pub struct NoopNavigator;

#[async_trait]
impl Navigator for NoopNavigator {
    async fn push(&self, route: &str) {
        debug!(%route, "push: ignored");
    }
}

/// Navigator that records route changes, for tests and simple shells
#[derive(Default)]
pub struct RecordingNavigator {
    routes: std::sync::Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn push(&self, route: &str) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(route.to_string());
        }
    }
}

/// The wired-up client core
pub struct App {
    pub config: Config,
    pub bus: StoreBus,
    pub toasts: ToastStore,
    pub filters: Arc<FiltersStore>,
    pub tasks: Arc<TasksStore>,
    pub auth: Arc<AuthStore>,
    dispatcher: JoinHandle<()>,
}

impl App {
    /// Build the app over the real transport and file-backed storage.
    ///
    /// Must be called within a tokio runtime: the dispatcher task is
    /// spawned here.
    pub fn new(config: Config, navigator: Arc<dyn Navigator>) -> Result<Arc<Self>> {
        let rest = RestClient::from_config(&config)?;
        let storage = Arc::new(FileStorage::open(&config.storage_path));
        Ok(Self::with_parts(config, Arc::new(rest), storage, navigator))
    }

    /// Build the app with injected transport and storage
    pub fn with_parts(
        config: Config,
        transport: Arc<dyn Api>,
        storage: Arc<dyn KeyValueStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Arc<Self> {
        let bus = StoreBus::default();
        let (guarded, unauthorized_rx) = SessionGuard::new(transport);
        let api: Arc<dyn Api> = guarded;

        let toasts = ToastStore::new(bus.clone());
        let session = SessionHandle::default();
        let filters = Arc::new(FiltersStore::new(storage, session.clone(), bus.clone()));
        let tasks = Arc::new(TasksStore::new(
            TaskService::new(api.clone()),
            filters.clone(),
            toasts.clone(),
            bus.clone(),
        ));
        let auth = Arc::new(AuthStore::new(
            session,
            api,
            tasks.clone(),
            navigator,
            bus.clone(),
        ));

        let dispatcher = spawn_dispatcher(auth.clone(), tasks.clone(), bus.subscribe(), unauthorized_rx);

        Arc::new(Self {
            config,
            bus,
            toasts,
            filters,
            tasks,
            auth,
            dispatcher,
        })
    }

    /// Startup sequence: restore the session, restore persisted filters,
    /// and pull the initial task list. All best-effort; a cold backend
    /// leaves the app unauthenticated with an empty list.
    pub async fn start(&self) {
        info!("start: called");
        self.auth.init_auth().await;
        self.filters.set_filters_from_storage().await;
        if let Err(e) = self.tasks.load_tasks().await {
            warn!(error = %e, "start: initial task load failed");
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

/// React to cross-cutting signals for as long as the app lives.
///
/// A 401 outside the logout path tears the session down exactly once
/// (logout no-ops when already unauthenticated); a filter change reloads
/// the canonical list so the projection updates immediately.
fn spawn_dispatcher(
    auth: Arc<AuthStore>,
    tasks: Arc<TasksStore>,
    mut events: broadcast::Receiver<StoreEvent>,
    mut unauthorized_rx: mpsc::UnboundedReceiver<Unauthorized>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                notice = unauthorized_rx.recv() => match notice {
                    Some(notice) => {
                        warn!(url = %notice.url, "dispatcher: session invalidated");
                        auth.logout().await;
                    }
                    None => break,
                },
                event = events.recv() => match event {
                    Ok(StoreEvent::FiltersChanged) => {
                        if let Err(e) = tasks.load_tasks().await {
                            warn!(error = %e, "dispatcher: reload after filter change failed");
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "dispatcher: lagged behind store events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        debug!("dispatcher: stopped");
    })
}
