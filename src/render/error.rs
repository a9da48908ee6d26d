//! Error types for rendering

use thiserror::Error;

use crate::value::undefined::{describe, Operation, UndefinedReason};
use crate::value::Kind;

/// Errors that abort a render unit
///
/// Reconstruction misses never show up here: they fall back to the joined
/// text inside the concatenator.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An operation other than a definedness check reached an undefined value
    #[error("{} during {operation}", describe(.name, .reason))]
    UndefinedUse {
        name: String,
        reason: UndefinedReason,
        operation: Operation,
    },

    /// Operand kinds the operation does not support
    #[error("unsupported operand kinds for '{op}': {left}{}", .right.map(|r| format!(" and {}", r)).unwrap_or_default())]
    InvalidOperation {
        op: &'static str,
        left: Kind,
        right: Option<Kind>,
    },

    /// Call to a macro or block that was never registered
    #[error("unknown render unit '{name}'")]
    UnknownUnit { name: String },

    /// Registering a second unit under a taken name
    #[error("duplicate render unit '{name}'")]
    DuplicateUnit { name: String },

    /// Macro called with the wrong number of arguments
    #[error("render unit '{name}' takes {expected} argument(s), got {got}")]
    ArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Nested unit calls went deeper than the render allows
    #[error("render unit '{name}' nested deeper than {limit} calls")]
    RecursionLimit { name: String, limit: usize },

    /// A unit tried to suspend while rendering in blocking mode
    #[error("render unit '{name}' suspended during a blocking render")]
    Suspended { name: String },
}

impl RenderError {
    /// Create an invalid operation error
    pub fn invalid_operation(op: &'static str, left: Kind, right: Option<Kind>) -> Self {
        Self::InvalidOperation { op, left, right }
    }

    /// Create an unknown unit error
    pub fn unknown_unit(name: impl Into<String>) -> Self {
        Self::UnknownUnit { name: name.into() }
    }

    /// Name of the unresolved reference, for undefined-use failures
    pub fn undefined_name(&self) -> Option<&str> {
        match self {
            Self::UndefinedUse { name, .. } => Some(name),
            _ => None,
        }
    }
}
