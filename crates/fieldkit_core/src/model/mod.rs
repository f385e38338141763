//! Domain model for per-project custom fields.
//!
//! # Responsibility
//! - Define the canonical field, value and project records.
//! - Host the pure value validator used by the reconciliation service.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Select options live inside `FieldType::Select`; a non-select field
//!   cannot carry options at all.

pub mod field;
pub mod project;
