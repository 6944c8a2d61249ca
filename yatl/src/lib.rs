//! YATL - task list client core
//!
//! The state-synchronization core of a task manager client: an in-memory
//! ordered task list kept consistent with a remote source of truth,
//! client-side filtering that never corrupts the canonical order,
//! drag-reorder gestures converted into persisted order values, and a
//! session layer that can invalidate all client state on a 401.
//!
//! # Core Concepts
//!
//! - **Resync Over Merge**: every mutation is followed by a full reload of
//!   the canonical list; the last reload to complete wins
//! - **Projection, Not Mutation**: filters derive a view of the canonical
//!   list and never touch its `order` values
//! - **Injected Services**: stores are plain constructor-injected objects
//!   wired by the composition root, with events published on mutation
//! - **Boundary-Level Invalidation**: a 401 on any non-logout request
//!   tears the session down, independent of in-flight operations
//!
//! # Modules
//!
//! - [`api`] - transport trait, reqwest client, 401 middleware
//! - [`service`] - task CRUD contract over the transport
//! - [`stores`] - tasks, filters, auth, and toast state
//! - [`events`] - store event bus
//! - [`storage`] - durable key-value state
//! - [`config`] - configuration types and loading
//! - [`app`] - composition root

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod events;
pub mod service;
pub mod storage;
pub mod stores;

// Re-export commonly used types
pub use api::{Api, ApiError, RestClient, SessionGuard, Unauthorized};
pub use app::{App, Navigator, NoopNavigator, RecordingNavigator};
pub use config::Config;
pub use domain::{AuthSession, Credentials, Filter, RegisterRequest, Task, User};
pub use events::{StoreBus, StoreEvent};
pub use service::{CallResponse, TaskService};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use stores::{
    AuthStore, FiltersStore, MAX_TITLE_LEN, SHOWING_TIME, SessionHandle, TasksStore, ToastKind, ToastMessage,
    ToastStore,
};
