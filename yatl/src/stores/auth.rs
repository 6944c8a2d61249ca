//! Session lifecycle
//!
//! Owns the authentication state machine. Collaborators that only need to
//! read identity (filter scoping, UI) hold a `SessionHandle`; mutation
//! goes through `AuthStore` actions exclusively. Action methods return
//! booleans and map failures to user-facing strings on the session's
//! `error` field; they never propagate errors to callers.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::{Api, ApiError, log_error};
use crate::app::Navigator;
use crate::domain::{AuthSession, Credentials, RegisterRequest, User};
use crate::events::{StoreBus, StoreEvent};
use crate::stores::tasks::TasksStore;

/// Error shown when the CSRF pre-flight fails at startup or login
const CSRF_ERROR: &str = "Unable to secure the connection. Please try again.";

/// Shared read view of the session state
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<AuthSession>>,
}

impl SessionHandle {
    pub async fn snapshot(&self) -> AuthSession {
        self.inner.lock().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.lock().await.is_authenticated
    }

    /// Identity for storage scoping; `None` without a valid session
    pub async fn user_id(&self) -> Option<i64> {
        let session = self.inner.lock().await;
        if !session.is_authenticated {
            return None;
        }
        session.user.as_ref().map(|u| u.id)
    }

    pub(crate) async fn update<F: FnOnce(&mut AuthSession)>(&self, f: F) {
        f(&mut *self.inner.lock().await);
    }
}

/// Session actions over the auth endpoints
pub struct AuthStore {
    session: SessionHandle,
    api: Arc<dyn Api>,
    tasks: Arc<TasksStore>,
    navigator: Arc<dyn Navigator>,
    bus: StoreBus,
}

impl AuthStore {
    pub fn new(
        session: SessionHandle,
        api: Arc<dyn Api>,
        tasks: Arc<TasksStore>,
        navigator: Arc<dyn Navigator>,
        bus: StoreBus,
    ) -> Self {
        Self {
            session,
            api,
            tasks,
            navigator,
            bus,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub async fn state(&self) -> AuthSession {
        self.session.snapshot().await
    }

    /// Startup probe: secure the connection, then restore any existing
    /// session. Never propagates a failure; a broken probe just leaves the
    /// client cleanly unauthenticated.
    pub async fn init_auth(&self) -> bool {
        debug!("init_auth: called");

        if let Err(e) = self.api.fetch_csrf_cookie().await {
            log_error(&e, "csrf setup");
            self.session.update(|s| s.error = Some(CSRF_ERROR.to_string())).await;
            return false;
        }

        match self.probe_session().await {
            Ok(authenticated) => authenticated,
            Err(e) => {
                log_error(&e, "authentication check");
                self.clear_session().await;
                false
            }
        }
    }

    /// Probe `/check-auth` and update the session accordingly
    pub async fn check_auth(&self) -> Result<bool, ApiError> {
        debug!("check_auth: called");
        let response = self.api.get("/check-auth").await?;
        let authenticated = response["authenticated"] == true;

        if authenticated {
            let user = serde_json::from_value(response["user"].clone()).ok();
            self.session
                .update(|s| {
                    s.is_authenticated = true;
                    s.user = user;
                })
                .await;
        } else {
            self.clear_session().await;
        }
        self.bus.publish(StoreEvent::SessionChanged);
        Ok(authenticated)
    }

    /// Fetch `/me` into the session. No-op false when unauthenticated.
    pub async fn get_user(&self) -> bool {
        if !self.session.is_authenticated().await {
            return false;
        }

        match self.api.get("/me").await {
            Ok(response) => match serde_json::from_value::<User>(response["user"].clone()) {
                Ok(user) => {
                    self.session.update(|s| s.user = Some(user)).await;
                    true
                }
                Err(e) => {
                    warn!(error = %e, "get_user: malformed user payload");
                    self.clear_session().await;
                    false
                }
            },
            Err(e) => {
                log_error(&e, "get user");
                let message = e.user_message().to_string();
                self.session
                    .update(|s| {
                        s.error = Some(message);
                        s.is_authenticated = false;
                        s.user = None;
                    })
                    .await;
                false
            }
        }
    }

    /// Authenticate with email and password
    pub async fn login(&self, credentials: &Credentials) -> bool {
        debug!(email = %credentials.email, "login: called");
        self.session
            .update(|s| {
                s.loading = true;
                s.error = None;
                s.is_authenticated = false;
                s.user = None;
            })
            .await;

        if let Err(e) = self.api.fetch_csrf_cookie().await {
            log_error(&e, "csrf setup");
            self.session
                .update(|s| {
                    s.error = Some(CSRF_ERROR.to_string());
                    s.loading = false;
                })
                .await;
            return false;
        }

        let result = self
            .api
            .post("/login", serde_json::to_value(credentials).unwrap_or_default())
            .await;

        let ok = match result {
            Ok(response) => {
                let user = serde_json::from_value(response["user"].clone()).ok();
                self.session
                    .update(|s| {
                        s.is_authenticated = true;
                        s.user = user;
                    })
                    .await;
                self.bus.publish(StoreEvent::SessionChanged);
                true
            }
            Err(e) => {
                let message = e.user_message().to_string();
                self.session.update(|s| s.error = Some(message)).await;
                false
            }
        };

        self.session.update(|s| s.loading = false).await;
        ok
    }

    /// Create an account. `{success: false}` bodies are soft failures
    /// carrying the server's message.
    pub async fn register(&self, request: &RegisterRequest) -> bool {
        debug!(email = %request.email, "register: called");
        self.session
            .update(|s| {
                s.loading = true;
                s.error = None;
            })
            .await;

        let result = self
            .api
            .post("/register", serde_json::to_value(request).unwrap_or_default())
            .await;

        let ok = match result {
            Ok(response) => {
                if response["success"] == true {
                    true
                } else {
                    let message = response["message"]
                        .as_str()
                        .unwrap_or("Registration failed")
                        .to_string();
                    self.session.update(|s| s.error = Some(message)).await;
                    false
                }
            }
            Err(e) => {
                log_error(&e, "registration");
                let message = e.user_message().to_string();
                self.session.update(|s| s.error = Some(message)).await;
                false
            }
        };

        self.session.update(|s| s.loading = false).await;
        ok
    }

    /// End the session: tell the server, drop local state, go to login.
    ///
    /// Only acts when authenticated, so repeated invalidation notices
    /// collapse into a single teardown and navigation. A failed logout
    /// call leaves local state as-is.
    pub async fn logout(&self) {
        if !self.session.is_authenticated().await {
            debug!("logout: not authenticated, nothing to do");
            return;
        }

        match self.api.post("/logout", json!({})).await {
            Ok(_) => {
                self.session
                    .update(|s| {
                        s.is_authenticated = false;
                        s.user = None;
                        s.error = None;
                        s.loading = false;
                    })
                    .await;
                self.tasks.reset().await;
                self.bus.publish(StoreEvent::SessionChanged);
                self.navigator.push("/login").await;
            }
            Err(e) => {
                log_error(&e, "logout");
                let message = e.user_message().to_string();
                self.session.update(|s| s.error = Some(message)).await;
            }
        }
    }

    /// Request a password-reset email
    pub async fn forgot_password(&self, email: &str) -> bool {
        debug!("forgot_password: called");
        self.session
            .update(|s| {
                s.loading = true;
                s.error = None;
            })
            .await;

        let result = self.api.post("/forgot-password", json!({ "email": email })).await;
        let ok = match result {
            Ok(_) => true,
            Err(e) => {
                let message = e.user_message().to_string();
                self.session.update(|s| s.error = Some(message)).await;
                false
            }
        };

        self.session.update(|s| s.loading = false).await;
        ok
    }

    /// Complete a password reset from the emailed token
    pub async fn reset_password(&self, token: &str, password: &str, password_confirmation: &str) -> bool {
        debug!("reset_password: called");
        self.session
            .update(|s| {
                s.loading = true;
                s.error = None;
            })
            .await;

        let body = json!({
            "token": token,
            "password": password,
            "password_confirmation": password_confirmation,
        });
        let result = self.api.post("/reset-password", body).await;
        let ok = match result {
            Ok(_) => true,
            Err(e) => {
                let message = e.user_message().to_string();
                self.session.update(|s| s.error = Some(message)).await;
                false
            }
        };

        self.session.update(|s| s.loading = false).await;
        ok
    }

    async fn probe_session(&self) -> Result<bool, ApiError> {
        let response = self.api.get("/check-auth").await?;
        if response["authenticated"] == true {
            let me = self.api.get("/me").await?;
            let user = serde_json::from_value(me["user"].clone()).ok();
            self.session
                .update(|s| {
                    s.user = user;
                    s.is_authenticated = true;
                })
                .await;
            self.bus.publish(StoreEvent::SessionChanged);
            Ok(true)
        } else {
            self.clear_session().await;
            Ok(false)
        }
    }

    async fn clear_session(&self) {
        self.session
            .update(|s| {
                s.is_authenticated = false;
                s.user = None;
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::mock::MockApi;
    use crate::app::RecordingNavigator;
    use crate::service::TaskService;
    use crate::storage::MemoryStorage;
    use crate::stores::filters::FiltersStore;
    use crate::stores::toast::ToastStore;
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        api: Arc<MockApi>,
        auth: AuthStore,
        tasks: Arc<TasksStore>,
        navigator: Arc<RecordingNavigator>,
    }

    fn fixture() -> Fixture {
        let bus = StoreBus::default();
        let api: Arc<MockApi> = Arc::new(MockApi::new());
        let session = SessionHandle::default();
        let filters = Arc::new(FiltersStore::new(
            Arc::new(MemoryStorage::new()),
            session.clone(),
            bus.clone(),
        ));
        let toasts = ToastStore::with_showing_time(bus.clone(), Duration::from_secs(60));
        let tasks = Arc::new(TasksStore::new(
            TaskService::new(api.clone()),
            filters,
            toasts,
            bus.clone(),
        ));
        let navigator = Arc::new(RecordingNavigator::new());
        let auth = AuthStore::new(session, api.clone(), tasks.clone(), navigator.clone(), bus);
        Fixture {
            api,
            auth,
            tasks,
            navigator,
        }
    }

    fn user_json() -> serde_json::Value {
        json!({ "id": 3, "name": "Ada", "email": "ada@example.com" })
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
        }
    }

    async fn force_login(fx: &Fixture) {
        fx.api.push_ok(serde_json::Value::Null); // csrf
        fx.api.push_ok(json!({ "user": user_json() }));
        assert!(fx.auth.login(&credentials()).await);
    }

    #[tokio::test]
    async fn test_login_success_sets_session() {
        let fx = fixture();
        force_login(&fx).await;

        let state = fx.auth.state().await;
        assert!(state.is_authenticated);
        assert_eq!(state.user.as_ref().map(|u| u.id), Some(3));
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_login_failure_maps_error_and_clears_loading() {
        let fx = fixture();
        fx.api.push_ok(serde_json::Value::Null); // csrf
        fx.api.push_http_err(422, "/login");

        assert!(!fx.auth.login(&credentials()).await);
        let state = fx.auth.state().await;
        assert!(!state.is_authenticated);
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Invalid data. Please check your information."));
    }

    #[tokio::test]
    async fn test_login_csrf_failure_stops_before_credentials() {
        let fx = fixture();
        fx.api.push_err(ApiError::Transport("connection refused".to_string()));

        assert!(!fx.auth.login(&credentials()).await);
        let state = fx.auth.state().await;
        assert_eq!(state.error.as_deref(), Some(CSRF_ERROR));
        assert!(!state.loading);
        // Only the csrf attempt went out
        assert_eq!(fx.api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_register_soft_failure_carries_server_message() {
        let fx = fixture();
        fx.api.push_ok(json!({ "success": false, "message": "Email already taken" }));

        assert!(!fx.auth.register(&RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
            password_confirmation: "hunter2".to_string(),
        })
        .await);
        let state = fx.auth.state().await;
        assert_eq!(state.error.as_deref(), Some("Email already taken"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_register_success() {
        let fx = fixture();
        fx.api.push_ok(json!({ "success": true }));

        assert!(fx.auth.register(&RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
            password_confirmation: "hunter2".to_string(),
        })
        .await);
        assert_eq!(fx.auth.state().await.error, None);
    }

    #[tokio::test]
    async fn test_logout_clears_session_resets_tasks_and_navigates() {
        let fx = fixture();
        force_login(&fx).await;

        // Seed some task state to confirm the reset
        fx.api.push_ok(json!([{ "id": 1, "title": "a", "completed": false, "order": 1 }]));
        fx.tasks.load_tasks().await.unwrap();

        fx.api.push_ok(serde_json::Value::Null); // logout post
        fx.auth.logout().await;

        let state = fx.auth.state().await;
        assert!(!state.is_authenticated);
        assert_eq!(state.user, None);
        assert!(fx.tasks.tasks().await.is_empty());
        assert_eq!(fx.navigator.routes(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn test_logout_when_unauthenticated_is_a_no_op() {
        let fx = fixture();
        fx.auth.logout().await;
        assert_eq!(fx.api.call_count(), 0);
        assert!(fx.navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_failed_logout_leaves_local_state() {
        let fx = fixture();
        force_login(&fx).await;

        fx.api.push_http_err(500, "/logout");
        fx.auth.logout().await;

        let state = fx.auth.state().await;
        assert!(state.is_authenticated);
        assert_eq!(state.error.as_deref(), Some("Server error. Please try again later."));
        assert!(fx.navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_init_auth_restores_session() {
        let fx = fixture();
        fx.api.push_ok(serde_json::Value::Null); // csrf
        fx.api.push_ok(json!({ "authenticated": true }));
        fx.api.push_ok(json!({ "user": user_json() }));

        assert!(fx.auth.init_auth().await);
        let state = fx.auth.state().await;
        assert!(state.is_authenticated);
        assert_eq!(state.user.as_ref().map(|u| u.name.clone()), Some("Ada".to_string()));
    }

    #[tokio::test]
    async fn test_init_auth_csrf_failure_sets_connectivity_error() {
        let fx = fixture();
        fx.api.push_err(ApiError::Transport("dns".to_string()));

        assert!(!fx.auth.init_auth().await);
        let state = fx.auth.state().await;
        assert_eq!(state.error.as_deref(), Some(CSRF_ERROR));
        // Probe never ran
        assert_eq!(fx.api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_init_auth_probe_failure_resets_cleanly() {
        let fx = fixture();
        fx.api.push_ok(serde_json::Value::Null); // csrf
        fx.api.push_http_err(500, "/check-auth");

        assert!(!fx.auth.init_auth().await);
        let state = fx.auth.state().await;
        assert!(!state.is_authenticated);
        assert_eq!(state.user, None);
    }

    #[tokio::test]
    async fn test_check_auth_unauthenticated_clears_user() {
        let fx = fixture();
        force_login(&fx).await;

        fx.api.push_ok(json!({ "authenticated": false }));
        assert!(!fx.auth.check_auth().await.unwrap());
        let state = fx.auth.state().await;
        assert!(!state.is_authenticated);
        assert_eq!(state.user, None);
    }

    #[tokio::test]
    async fn test_get_user_requires_authentication() {
        let fx = fixture();
        assert!(!fx.auth.get_user().await);
        assert_eq!(fx.api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_get_user_failure_resets_session() {
        let fx = fixture();
        force_login(&fx).await;

        fx.api.push_http_err(500, "/me");
        assert!(!fx.auth.get_user().await);
        let state = fx.auth.state().await;
        assert!(!state.is_authenticated);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn test_forgot_and_reset_password() {
        let fx = fixture();
        fx.api.push_ok(serde_json::Value::Null);
        assert!(fx.auth.forgot_password("ada@example.com").await);

        fx.api.push_http_err(422, "/reset-password");
        assert!(!fx.auth.reset_password("token", "new", "new").await);
        let state = fx.auth.state().await;
        assert_eq!(state.error.as_deref(), Some("Invalid data. Please check your information."));
        assert!(!state.loading);
    }
}
