//! Core domain logic for fieldkit per-project custom fields.
//! This crate is the single source of truth for field and value invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::field::{
    DefinitionError, FieldDefinition, FieldId, FieldType, FieldValue, FieldWithValue, ProjectId,
    ValueError, ValueId,
};
pub use model::project::Project;
pub use repo::field_repo::{FieldDefinitionRepository, RepoError, RepoResult, SqliteFieldRepository};
pub use repo::project_dir::{ProjectDirectory, SqliteProjectDirectory};
pub use repo::value_repo::{FieldValueRepository, SqliteValueRepository};
pub use service::field_service::{CreateFieldRequest, FieldPatch, FieldService, FieldServiceError};
pub use service::value_service::{
    SaveFailure, SaveSummary, ValueInput, ValueService, ValueServiceError,
};
pub use service::ErrorKind;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
