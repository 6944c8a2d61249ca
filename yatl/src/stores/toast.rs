//! Transient user-facing message channel

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::events::{StoreBus, StoreEvent};

/// How long a toast stays visible
pub const SHOWING_TIME: Duration = Duration::from_millis(4000);

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Error,
    Info,
}

/// The single message currently on display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub expires_at: DateTime<Utc>,
}

struct ToastState {
    current: Option<ToastMessage>,
    /// Auto-clear timer for the current message. Aborted and replaced on
    /// every `show`, so a stale timer can never clear a newer message.
    timer: Option<JoinHandle<()>>,
}

/// Holds at most one active message; new calls overwrite the previous one.
#[derive(Clone)]
pub struct ToastStore {
    state: Arc<Mutex<ToastState>>,
    bus: StoreBus,
    showing_time: Duration,
}

impl ToastStore {
    pub fn new(bus: StoreBus) -> Self {
        Self::with_showing_time(bus, SHOWING_TIME)
    }

    /// Test hook: a shorter display window
    pub fn with_showing_time(bus: StoreBus, showing_time: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(ToastState {
                current: None,
                timer: None,
            })),
            bus,
            showing_time,
        }
    }

    /// Replace the current message and restart the auto-clear timer
    pub async fn show(&self, message: impl Into<String>, kind: ToastKind) {
        let message = message.into();
        debug!(%message, ?kind, "show: called");

        let mut state = self.state.lock().await;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        state.current = Some(ToastMessage {
            message,
            kind,
            expires_at: Utc::now() + chrono::Duration::from_std(self.showing_time).unwrap_or_else(|_| chrono::Duration::zero()),
        });

        let shared = Arc::clone(&self.state);
        let bus = self.bus.clone();
        let delay = self.showing_time;
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = shared.lock().await;
            state.current = None;
            state.timer = None;
            bus.publish(StoreEvent::ToastCleared);
        }));

        self.bus.publish(StoreEvent::ToastShown);
    }

    /// Clear immediately without waiting for the timer
    pub async fn reset(&self) {
        debug!("reset: called");
        let mut state = self.state.lock().await;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if state.current.take().is_some() {
            self.bus.publish(StoreEvent::ToastCleared);
        }
    }

    /// The message currently on display, if any
    pub async fn current(&self) -> Option<ToastMessage> {
        self.state.lock().await.current.clone()
    }
}
