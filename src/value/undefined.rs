//! Deferred-failure marker for unresolved references
//!
//! An [`Undefined`] is produced whenever a lookup misses: a variable that was
//! never provided, an attribute a value does not have, an index past the end
//! of a sequence. It is not an error by itself. Asking whether it is defined
//! is always safe; every other operation turns it into a
//! [`RenderError::UndefinedUse`] naming the reference at the point of use.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::render::RenderError;
use crate::value::Kind;

/// Why a lookup produced an undefined value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndefinedReason {
    /// The name was not bound in the render context
    Missing,
    /// The owner value has no attribute with this name
    NoAttribute { owner: Kind },
    /// The owner value has no element at this index
    NoItem { owner: Kind },
}

/// Lifecycle of one unresolved reference
///
/// Only `Unbound` has outgoing transitions. The first definedness check or
/// the first failing operation decides the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedState {
    Unbound,
    Checked,
    Failed,
}

impl UndefinedState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => UndefinedState::Checked,
            2 => UndefinedState::Failed,
            _ => UndefinedState::Unbound,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            UndefinedState::Unbound => 0,
            UndefinedState::Checked => 1,
            UndefinedState::Failed => 2,
        }
    }
}

/// The operation attempted on an undefined value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Attribute(String),
    Index,
    Arithmetic(&'static str),
    Compare,
    Stringify,
    Iterate,
    Truth,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Attribute(name) => write!(f, "attribute access '.{}'", name),
            Operation::Index => write!(f, "indexing"),
            Operation::Arithmetic(op) => write!(f, "arithmetic '{}'", op),
            Operation::Compare => write!(f, "comparison"),
            Operation::Stringify => write!(f, "conversion to text"),
            Operation::Iterate => write!(f, "iteration"),
            Operation::Truth => write!(f, "truth test"),
        }
    }
}

/// An unresolved reference
///
/// Clones share their lifecycle state, so a value copied out of the context
/// and checked elsewhere still reports `Checked` on the original.
#[derive(Debug, Clone)]
pub struct Undefined {
    name: String,
    reason: UndefinedReason,
    state: Arc<AtomicU8>,
}

impl Undefined {
    /// A name that was not bound in the render context
    pub fn missing(name: impl Into<String>) -> Self {
        Self::new(name, UndefinedReason::Missing)
    }

    /// An attribute the owner value does not have
    pub fn no_attribute(owner: Kind, name: impl Into<String>) -> Self {
        Self::new(name, UndefinedReason::NoAttribute { owner })
    }

    /// An index the owner value does not have
    pub fn no_item(owner: Kind, index: impl Into<String>) -> Self {
        Self::new(index, UndefinedReason::NoItem { owner })
    }

    fn new(name: impl Into<String>, reason: UndefinedReason) -> Self {
        Self {
            name: name.into(),
            reason,
            state: Arc::new(AtomicU8::new(UndefinedState::Unbound.as_u8())),
        }
    }

    /// The name, attribute or index that failed to resolve
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reason(&self) -> &UndefinedReason {
        &self.reason
    }

    pub fn state(&self) -> UndefinedState {
        UndefinedState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Definedness query. Never fails.
    pub fn check(&self) -> bool {
        self.settle(UndefinedState::Checked);
        false
    }

    /// Build the error for an operation attempted on this reference
    pub fn fail(&self, operation: Operation) -> RenderError {
        self.settle(UndefinedState::Failed);
        RenderError::UndefinedUse {
            name: self.name.clone(),
            reason: self.reason.clone(),
            operation,
        }
    }

    fn settle(&self, next: UndefinedState) {
        let _ = self.state.compare_exchange(
            UndefinedState::Unbound.as_u8(),
            next.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Human-readable description of the miss
    pub fn describe(&self) -> String {
        describe(&self.name, &self.reason)
    }
}

impl PartialEq for Undefined {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.reason == other.reason
    }
}

pub(crate) fn describe(name: &str, reason: &UndefinedReason) -> String {
    match reason {
        UndefinedReason::Missing => format!("'{}' is undefined", name),
        UndefinedReason::NoAttribute { owner } => {
            format!("'{}' object has no attribute '{}'", owner, name)
        }
        UndefinedReason::NoItem { owner } => {
            format!("'{}' object has no element {}", owner, name)
        }
    }
}
