//! API transport layer
//!
//! The `Api` trait is the seam between stores/services and the wire;
//! `RestClient` is the reqwest implementation and `SessionGuard` the 401
//! middleware wrapped around it.

pub mod client;
mod error;
mod interceptor;
mod rest;

pub use client::Api;
pub use error::{ApiError, log_error};
pub use interceptor::{SessionGuard, Unauthorized};
pub use rest::RestClient;
