//! Error types for validation faults, handle registries, and forms.

use std::any::Any;

use serde::Serialize;
use thiserror::Error;

/// A predicate misbehaved instead of returning a verdict.
///
/// Stored inside [`ValidationFailure`](crate::validation::ValidationFailure)
/// so diagnostic tooling can tell "the data is invalid" apart from
/// "the validation code itself failed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub enum RuleFault {
    /// The predicate panicked.
    #[error("predicate panicked: {0}")]
    Panic(String),

    /// A fallible predicate returned an error.
    #[error("predicate failed: {0}")]
    Error(String),
}

/// Misuse of a handle registry or of a handle whose owner is gone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A live handle is already published under this key.
    #[error("handle '{key}' is already registered")]
    AlreadyRegistered {
        /// The contested key.
        key: String,
    },

    /// No live handle is published under this key.
    #[error("handle '{key}' is not registered")]
    NotRegistered {
        /// The missing key.
        key: String,
    },

    /// The registration belongs to an older owner of the key.
    #[error("registration for '{key}' (generation {generation}) is stale")]
    Stale {
        /// The key.
        key: String,
        /// Generation carried by the stale registration.
        generation: u64,
    },

    /// The handle's owner is not mounted.
    #[error("handle '{key}' was used while its owner is not mounted")]
    Unmounted {
        /// The key of the unmounted owner.
        key: String,
    },
}

impl RegistryError {
    /// The key this error is about.
    pub fn key(&self) -> &str {
        match self {
            Self::AlreadyRegistered { key }
            | Self::NotRegistered { key }
            | Self::Stale { key, .. }
            | Self::Unmounted { key } => key,
        }
    }
}

/// Errors from imperative calls on a field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The value's kind does not fit the field's value type.
    #[error("Field '{field}' type mismatch: got {actual}")]
    TypeMismatch {
        /// The field name.
        field: String,
        /// Type name of the rejected value.
        actual: &'static str,
    },

    /// The form has no declared field with this name.
    #[error("Field '{field}' is not declared by form '{form}'")]
    Undeclared {
        /// The field name.
        field: String,
        /// The form it tried to mount into.
        form: String,
    },

    /// Lifecycle misuse.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl FieldError {
    /// Creates a new type mismatch error.
    pub fn type_mismatch(field: impl Into<String>, actual: &'static str) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            actual,
        }
    }
}

/// Errors raised while building or driving a form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// The record validator does not cover exactly the declared fields.
    #[error("validator keys do not match declared fields (missing: {missing:?}, unexpected: {unexpected:?})")]
    KeySetMismatch {
        /// Declared fields without a validator.
        missing: Vec<String>,
        /// Validator keys that are not declared fields.
        unexpected: Vec<String>,
    },

    /// A field name was declared twice.
    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    /// A submission is already in progress.
    #[error("a submission is already in progress")]
    SubmitInProgress,

    /// Handle registry misuse.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A field handle call failed.
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Extract a human-readable message from a panic payload.
///
/// Panics can carry either `&str` or `String` payloads. Anything else
/// falls back to a generic message.
pub fn extract_panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
