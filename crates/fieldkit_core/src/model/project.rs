//! Project read model.
//!
//! Projects are owned by an external collaborator; this core references
//! them by id and never mutates them.

use crate::model::field::ProjectId;
use serde::{Deserialize, Serialize};

/// External project record as seen by the custom fields core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Stable project id.
    pub id: ProjectId,
    /// Display name, opaque to this core.
    pub name: String,
    /// Optional free-form description, opaque to this core.
    pub description: Option<String>,
}
