//! Value reconciliation use-case service.
//!
//! # Responsibility
//! - Validate and upsert one value per (field, project) pair.
//! - Aggregate per-item outcomes for multi-value saves.
//!
//! # Invariants
//! - Every save validates against the field's declared type first.
//! - A failing item never aborts the remaining items of a batch.

use crate::model::field::{FieldId, FieldValue, ProjectId, ValueError};
use crate::repo::field_repo::{FieldDefinitionRepository, RepoError};
use crate::repo::value_repo::FieldValueRepository;
use crate::service::ErrorKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One (field, value) pair submitted to [`ValueService::save_many`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueInput {
    pub field_id: FieldId,
    pub value: String,
}

/// Per-item failure reported by [`ValueService::save_many`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveFailure {
    pub field_id: FieldId,
    pub reason: String,
}

/// Aggregated outcome of a multi-value save.
///
/// `failed` is present only when at least one item failed, so callers can
/// tell "all succeeded" apart without inspecting lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub succeeded: Vec<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<SaveFailure>>,
}

/// Service error for value reconciliation use-cases.
#[derive(Debug)]
pub enum ValueServiceError {
    /// No field matched the (field, project) pair.
    FieldNotFound(FieldId),
    /// The raw value failed validation against the field's type.
    Value(ValueError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ValueServiceError {
    /// Maps this error onto the coarse taxonomy used by outer layers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FieldNotFound(_) => ErrorKind::NotFound,
            Self::Value(_) => ErrorKind::Validation,
            Self::Repo(RepoError::Conflict(_)) => ErrorKind::Conflict,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for ValueServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldNotFound(id) => {
                write!(f, "field {id} not found or does not belong to this project")
            }
            Self::Value(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ValueServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Value(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::FieldNotFound(_) => None,
        }
    }
}

impl From<ValueError> for ValueServiceError {
    fn from(value: ValueError) -> Self {
        Self::Value(value)
    }
}

impl From<RepoError> for ValueServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::FieldNotFound(id) => Self::FieldNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Value reconciliation service over the definition and value stores.
pub struct ValueService<F: FieldDefinitionRepository, V: FieldValueRepository> {
    fields: F,
    values: V,
}

impl<F: FieldDefinitionRepository, V: FieldValueRepository> ValueService<F, V> {
    /// Creates a service using the provided repositories.
    pub fn new(fields: F, values: V) -> Self {
        Self { fields, values }
    }

    /// Validates and stores one value, updating in place when a row for
    /// this (field, project) pair already exists.
    pub fn save_one(
        &self,
        field_id: FieldId,
        project_id: ProjectId,
        raw: &str,
    ) -> Result<FieldValue, ValueServiceError> {
        let field = self
            .fields
            .get(field_id, project_id)?
            .ok_or(ValueServiceError::FieldNotFound(field_id))?;
        field.validate_value(raw)?;

        match self.values.get(field_id, project_id)? {
            Some(mut existing) => {
                existing.value = raw.to_string();
                self.values.update(&existing)?;
                Ok(existing)
            }
            None => {
                let value = FieldValue::new(field_id, project_id, raw);
                self.values.insert(&value)?;
                Ok(value)
            }
        }
    }

    /// Saves a batch of values with partial-failure semantics.
    ///
    /// Items are processed independently in input order; each failure is
    /// recorded with the offending field id and a human-readable reason.
    pub fn save_many(&self, project_id: ProjectId, items: &[ValueInput]) -> SaveSummary {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for item in items {
            match self.save_one(item.field_id, project_id, item.value.as_str()) {
                Ok(value) => succeeded.push(value),
                Err(err) => failed.push(SaveFailure {
                    field_id: item.field_id,
                    reason: err.to_string(),
                }),
            }
        }

        SaveSummary {
            succeeded,
            failed: if failed.is_empty() { None } else { Some(failed) },
        }
    }
}
