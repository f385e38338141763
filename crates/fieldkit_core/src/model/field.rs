//! Custom field domain model.
//!
//! # Responsibility
//! - Define field definitions, stored values and the joined read projection.
//! - Validate raw values against a field's declared type.
//!
//! # Invariants
//! - `FieldType::Select` always carries the declared option list; the other
//!   variants carry nothing, so "options iff select" holds by construction.
//! - `validate_value` is a pure function of the definition and its input.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a project owned by the external project manager.
pub type ProjectId = Uuid;

/// Stable identifier of a field definition.
pub type FieldId = Uuid;

/// Stable identifier of a stored field value.
pub type ValueId = Uuid;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Declared type of a custom field.
///
/// Serialized adjacently tagged so a select field carries its `options`
/// array on the wire while every other type omits the key entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field_type", content = "options", rename_all = "snake_case")]
pub enum FieldType {
    /// Free-form text; no constraint beyond the required/blank check.
    Text,
    /// Value must parse fully as a finite number.
    Number,
    /// Value must be a real `YYYY-MM-DD` calendar date.
    Date,
    /// Value must be one of the declared options (exact string match).
    Select(Vec<String>),
}

impl FieldType {
    /// Wire tags accepted by [`FieldType::from_parts`].
    pub const TAGS: [&'static str; 4] = ["text", "number", "date", "select"];

    /// Builds a field type from a wire tag and an optional options list.
    ///
    /// Options are dropped for non-select tags even when supplied; a select
    /// tag without at least one option is rejected.
    pub fn from_parts(tag: &str, options: Option<Vec<String>>) -> Result<Self, DefinitionError> {
        match tag {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            "select" => match options {
                Some(values) if !values.is_empty() => Ok(Self::Select(values)),
                _ => Err(DefinitionError::MissingOptions),
            },
            other => Err(DefinitionError::InvalidType(other.to_string())),
        }
    }

    /// Returns the wire tag for this type.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Select(_) => "select",
        }
    }

    /// Returns true when `tag` names a known field type.
    pub fn is_valid_tag(tag: &str) -> bool {
        Self::TAGS.contains(&tag)
    }

    /// Returns the declared select options, or `None` for other types.
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::Select(values) => Some(values),
            _ => None,
        }
    }
}

/// Validation error for field definition metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// Unknown field type tag.
    InvalidType(String),
    /// Select field declared without any options.
    MissingOptions,
    /// Field name is empty or whitespace-only.
    EmptyName,
}

impl Display for DefinitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidType(tag) => write!(
                f,
                "invalid field type `{tag}`; expected one of text, number, date, select"
            ),
            Self::MissingOptions => write!(f, "select fields must declare at least one option"),
            Self::EmptyName => write!(f, "field name cannot be empty"),
        }
    }
}

impl Error for DefinitionError {}

/// Validation error for a raw value checked against a field definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Required field received an absent or blank value.
    RequiredMissing { field: String },
    /// Value does not parse as a finite number.
    InvalidNumber { field: String, value: String },
    /// Value is not a real `YYYY-MM-DD` calendar date.
    InvalidDate { field: String, value: String },
    /// Value is not one of the declared select options.
    InvalidOption {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
}

impl Display for ValueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequiredMissing { field } => write!(f, "field `{field}` is required"),
            Self::InvalidNumber { field, value } => {
                write!(f, "field `{field}` expects a number, got `{value}`")
            }
            Self::InvalidDate { field, value } => {
                write!(f, "field `{field}` expects a YYYY-MM-DD date, got `{value}`")
            }
            Self::InvalidOption {
                field,
                value,
                allowed,
            } => write!(
                f,
                "`{value}` is not a valid option for field `{field}`; allowed: {}",
                allowed.join(", ")
            ),
        }
    }
}

impl Error for ValueError {}

/// Metadata describing one custom field within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Stable field id.
    pub id: FieldId,
    /// Owning project id.
    pub project_id: ProjectId,
    /// Display name, unique within the project (case-sensitive).
    #[serde(rename = "field_name")]
    pub name: String,
    /// Declared type, with select options inline.
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether a blank value is rejected on save.
    #[serde(rename = "is_required")]
    pub required: bool,
    /// Display ordering, ascending; ties are broken by id.
    #[serde(rename = "field_order")]
    pub order: i64,
}

impl FieldDefinition {
    /// Creates a definition with a generated stable id.
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        field_type: FieldType,
        required: bool,
        order: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            name: name.into(),
            field_type,
            required,
            order,
        }
    }

    /// Checks metadata invariants prior to persistence.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        if let FieldType::Select(options) = &self.field_type {
            if options.is_empty() {
                return Err(DefinitionError::MissingOptions);
            }
        }
        Ok(())
    }

    /// Validates a raw value against this definition's declared type.
    ///
    /// Blank input (empty after trimming) is rejected only for required
    /// fields; an optional blank skips the type checks entirely. Number and
    /// date parsing tolerate surrounding whitespace; select membership is an
    /// exact match on the raw value.
    pub fn validate_value(&self, raw: &str) -> Result<(), ValueError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            if self.required {
                return Err(ValueError::RequiredMissing {
                    field: self.name.clone(),
                });
            }
            return Ok(());
        }

        match &self.field_type {
            FieldType::Text => Ok(()),
            FieldType::Number => {
                if trimmed.parse::<f64>().is_ok_and(f64::is_finite) {
                    Ok(())
                } else {
                    Err(ValueError::InvalidNumber {
                        field: self.name.clone(),
                        value: raw.to_string(),
                    })
                }
            }
            FieldType::Date => {
                if is_calendar_date(trimmed) {
                    Ok(())
                } else {
                    Err(ValueError::InvalidDate {
                        field: self.name.clone(),
                        value: raw.to_string(),
                    })
                }
            }
            FieldType::Select(options) => {
                // An empty option list places no constraint on the value;
                // the lifecycle manager never persists one.
                if options.is_empty() || options.iter().any(|option| option == raw) {
                    Ok(())
                } else {
                    Err(ValueError::InvalidOption {
                        field: self.name.clone(),
                        value: raw.to_string(),
                        allowed: options.clone(),
                    })
                }
            }
        }
    }
}

/// The single stored value for one field within one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    /// Stable value row id.
    pub id: ValueId,
    /// Owning field definition id.
    pub field_id: FieldId,
    /// Owning project id.
    pub project_id: ProjectId,
    /// Raw stored string; interpretation follows the field's declared type.
    pub value: String,
}

impl FieldValue {
    /// Creates a value row with a generated stable id.
    pub fn new(field_id: FieldId, project_id: ProjectId, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            field_id,
            project_id,
            value: value.into(),
        }
    }
}

/// Read projection joining a definition with its current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWithValue {
    /// Stable field id.
    pub id: FieldId,
    /// Display name.
    #[serde(rename = "field_name")]
    pub name: String,
    /// Declared type, with select options inline.
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether a blank value is rejected on save.
    #[serde(rename = "is_required")]
    pub required: bool,
    /// Display ordering.
    #[serde(rename = "field_order")]
    pub order: i64,
    /// Current stored value, or empty string when none exists yet.
    pub value: String,
}

fn is_calendar_date(value: &str) -> bool {
    ISO_DATE_RE.is_match(value) && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}
