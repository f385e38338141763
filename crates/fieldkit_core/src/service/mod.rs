//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the field lifecycle and value
//!   reconciliation use-cases.
//! - Keep outer layers (CLI, transport adapters) decoupled from storage.

pub mod field_service;
pub mod value_service;

/// Coarse error category for callers that map failures to a transport
/// status without matching concrete variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The addressed project, field or value does not exist.
    NotFound,
    /// The request violates a validation rule or business invariant.
    Validation,
    /// A store-level unique constraint rejected the write.
    Conflict,
    /// Unexpected persistence or consistency failure.
    Internal,
}
