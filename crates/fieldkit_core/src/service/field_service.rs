//! Field lifecycle use-case service.
//!
//! # Responsibility
//! - Create, update and delete field definitions for a project.
//! - Enforce name-uniqueness-per-project and the type-change cascade.
//! - Serve the ordered definitions-with-values read projection.
//!
//! # Invariants
//! - A persisted definition has options when and only when it is a select.
//! - Changing a field's type discards its stored value in the same
//!   transaction; stale values are never migrated.

use crate::model::field::{DefinitionError, FieldDefinition, FieldId, FieldType, FieldWithValue, ProjectId};
use crate::repo::field_repo::{FieldDefinitionRepository, RepoError};
use crate::repo::project_dir::ProjectDirectory;
use crate::service::ErrorKind;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Request model for defining a new custom field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFieldRequest {
    /// Display name, unique within the project.
    pub name: String,
    /// Wire tag: one of `text|number|date|select`.
    pub field_type: String,
    /// Whether a blank value is rejected on save.
    pub required: bool,
    /// Option list; meaningful only for `select`, ignored otherwise.
    pub options: Option<Vec<String>>,
    /// Display ordering.
    pub order: i64,
}

impl CreateFieldRequest {
    /// Creates a request with storage defaults (`required = false`,
    /// `order = 0`, no options).
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            required: false,
            options: None,
            order: 0,
        }
    }
}

/// Partial update for an existing field; unset attributes keep their
/// stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPatch {
    pub name: Option<String>,
    /// Wire tag: one of `text|number|date|select`.
    pub field_type: Option<String>,
    pub options: Option<Vec<String>>,
    pub required: Option<bool>,
    pub order: Option<i64>,
}

impl FieldPatch {
    /// Returns true when the patch carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.field_type.is_none()
            && self.options.is_none()
            && self.required.is_none()
            && self.order.is_none()
    }
}

/// Service error for field lifecycle use-cases.
#[derive(Debug)]
pub enum FieldServiceError {
    /// No project with this id exists in the external directory.
    ProjectNotFound(ProjectId),
    /// No field matched the (field, project) pair.
    FieldNotFound(FieldId),
    /// Another field in the project already uses this name.
    DuplicateFieldName { project_id: ProjectId, name: String },
    /// Definition metadata failed validation.
    Definition(DefinitionError),
    /// Update request carried no changes.
    EmptyUpdate,
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl FieldServiceError {
    /// Maps this error onto the coarse taxonomy used by outer layers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProjectNotFound(_) | Self::FieldNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateFieldName { .. } | Self::Definition(_) | Self::EmptyUpdate => {
                ErrorKind::Validation
            }
            Self::Repo(RepoError::Conflict(_)) => ErrorKind::Conflict,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for FieldServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::FieldNotFound(id) => {
                write!(f, "field {id} not found or does not belong to this project")
            }
            Self::DuplicateFieldName { name, .. } => {
                write!(f, "field `{name}` already exists in this project")
            }
            Self::Definition(err) => write!(f, "{err}"),
            Self::EmptyUpdate => write!(f, "no field attributes supplied for update"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FieldServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Definition(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DefinitionError> for FieldServiceError {
    fn from(value: DefinitionError) -> Self {
        Self::Definition(value)
    }
}

impl From<RepoError> for FieldServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::FieldNotFound(id) => Self::FieldNotFound(id),
            RepoError::Definition(err) => Self::Definition(err),
            other => Self::Repo(other),
        }
    }
}

/// Field lifecycle service over a project directory and definition store.
pub struct FieldService<P: ProjectDirectory, F: FieldDefinitionRepository> {
    projects: P,
    fields: F,
}

impl<P: ProjectDirectory, F: FieldDefinitionRepository> FieldService<P, F> {
    /// Creates a service using the provided collaborators.
    pub fn new(projects: P, fields: F) -> Self {
        Self { projects, fields }
    }

    /// Defines a new field for a project.
    ///
    /// # Contract
    /// - Unknown type tags and optionless selects are rejected up front.
    /// - Supplied options are dropped when the type is not `select`.
    /// - The name must not collide with a sibling field (case-sensitive).
    pub fn create(
        &self,
        project_id: ProjectId,
        request: &CreateFieldRequest,
    ) -> Result<FieldDefinition, FieldServiceError> {
        let field_type = FieldType::from_parts(&request.field_type, request.options.clone())?;
        if request.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName.into());
        }

        if !self.projects.exists(project_id)? {
            return Err(FieldServiceError::ProjectNotFound(project_id));
        }
        if self
            .fields
            .find_by_name(project_id, request.name.as_str())?
            .is_some()
        {
            return Err(FieldServiceError::DuplicateFieldName {
                project_id,
                name: request.name.clone(),
            });
        }

        let definition = FieldDefinition::new(
            project_id,
            request.name.clone(),
            field_type,
            request.required,
            request.order,
        );
        self.fields.insert(&definition)?;

        info!(
            "event=field_create module=service status=ok project_id={} field_id={} type={}",
            project_id,
            definition.id,
            definition.field_type.tag()
        );
        Ok(definition)
    }

    /// Applies a partial update to an existing field.
    ///
    /// # Contract
    /// - A type change deletes the stored value in the same transaction.
    /// - A select result without a usable option list fails rather than
    ///   persisting an optionless select.
    /// - A non-select result never keeps options, supplied or stored.
    pub fn update(
        &self,
        field_id: FieldId,
        project_id: ProjectId,
        patch: &FieldPatch,
    ) -> Result<FieldDefinition, FieldServiceError> {
        if patch.is_empty() {
            return Err(FieldServiceError::EmptyUpdate);
        }

        let current = self
            .fields
            .get(field_id, project_id)?
            .ok_or(FieldServiceError::FieldNotFound(field_id))?;

        if let Some(name) = patch.name.as_deref() {
            if name.trim().is_empty() {
                return Err(DefinitionError::EmptyName.into());
            }
            if name != current.name && self.fields.find_by_name(project_id, name)?.is_some() {
                return Err(FieldServiceError::DuplicateFieldName {
                    project_id,
                    name: name.to_string(),
                });
            }
        }

        let new_tag = match patch.field_type.as_deref() {
            Some(tag) if !FieldType::is_valid_tag(tag) => {
                return Err(DefinitionError::InvalidType(tag.to_string()).into())
            }
            Some(tag) => Some(tag),
            None => None,
        };
        let type_changing = new_tag.is_some_and(|tag| tag != current.field_type.tag());
        let resulting_tag = new_tag.unwrap_or_else(|| current.field_type.tag());

        let field_type = if resulting_tag == "select" {
            let options = match patch.options.clone() {
                Some(values) => Some(values),
                // The stored options survive only while the field stays a
                // select; a fresh select must bring its own list.
                None if !type_changing => current.field_type.options().map(<[String]>::to_vec),
                None => None,
            };
            FieldType::from_parts("select", options)?
        } else {
            FieldType::from_parts(resulting_tag, None)?
        };

        let updated = FieldDefinition {
            id: current.id,
            project_id: current.project_id,
            name: patch.name.clone().unwrap_or(current.name),
            field_type,
            required: patch.required.unwrap_or(current.required),
            order: patch.order.unwrap_or(current.order),
        };

        self.fields.update(&updated, type_changing)?;

        if type_changing {
            info!(
                "event=field_type_change module=service status=ok field_id={} from={} to={}",
                field_id,
                current.field_type.tag(),
                updated.field_type.tag()
            );
        }
        Ok(updated)
    }

    /// Deletes a field matched by both ids; stored values cascade away.
    pub fn delete(
        &self,
        field_id: FieldId,
        project_id: ProjectId,
    ) -> Result<(), FieldServiceError> {
        self.fields.delete(field_id, project_id)?;
        info!(
            "event=field_delete module=service status=ok project_id={project_id} field_id={field_id}"
        );
        Ok(())
    }

    /// Lists a project's fields with their current values, ordered by
    /// `field_order` ascending with id as the tie-breaker.
    pub fn list_with_values(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<FieldWithValue>, FieldServiceError> {
        Ok(self.fields.list_with_values(project_id)?)
    }
}
