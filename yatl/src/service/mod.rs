//! Service contracts over the transport layer.

mod tasks;

pub use tasks::{CallResponse, TaskService};
