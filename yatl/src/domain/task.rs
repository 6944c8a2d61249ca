//! Task and filter records

use serde::{Deserialize, Serialize};

/// A single task as reported by the server.
///
/// Within the canonical list, `order` values are unique and form a
/// contiguous ascending sequence starting at 1, matching array position.
/// Client-side filtering never touches `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned unique id
    pub id: i64,
    /// Display title
    pub title: String,
    /// Completion state
    pub completed: bool,
    /// 1-based position in the canonical list
    pub order: i64,
}

/// A named client-side filter and its active value tokens.
///
/// Only the `"state"` filter is interpreted today (tokens `"todo"` and
/// `"done"`); unknown names are carried but ignored when filtering.
/// Serialized field names match the persisted storage shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub filter_name: String,
    pub filter_values: Vec<String>,
}

impl Filter {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            filter_name: name.into(),
            filter_values: values,
        }
    }
}
