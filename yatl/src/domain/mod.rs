//! Domain records shared across services and stores.

mod auth;
mod task;

pub use auth::{AuthSession, Credentials, RegisterRequest, User};
pub use task::{Filter, Task};
