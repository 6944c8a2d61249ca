//! Session identity records

use serde::{Deserialize, Serialize};

/// Authenticated user identity as returned by `/me` and login responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Session state owned by the auth store.
///
/// Created unauthenticated at startup and torn back down to that state on
/// logout or on an intercepted 401.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    pub is_authenticated: bool,
    pub user: Option<User>,
    /// True only while an auth request is in flight
    pub loading: bool,
    /// User-facing message from the last failed action
    pub error: Option<String>,
}

/// Login form payload.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration form payload.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}
