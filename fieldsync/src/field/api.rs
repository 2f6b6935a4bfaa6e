//! The imperative handle a mounted field publishes into its form.

use std::sync::Arc;

use crate::error::FieldError;
use crate::registry::HandleRegistry;
use crate::validation::{Meta, ValidationFailure};
use crate::value::FieldValue;

/// Imperative operations on a mounted field.
///
/// Every call on a field that is no longer mounted fails with
/// [`RegistryError::Unmounted`](crate::error::RegistryError::Unmounted)
/// and leaves all state untouched.
pub trait FieldApi<R>: Send + Sync {
    /// The field name.
    fn name(&self) -> &str;

    /// Set the value programmatically.
    ///
    /// Notifies exactly like a user edit. Fails on a kind mismatch.
    fn set_field_value(&self, value: FieldValue) -> Result<(), FieldError>;

    /// Override the displayed errors without running the field's validator.
    fn set_field_errors(&self, failures: Vec<ValidationFailure<R, Meta>>) -> Result<(), FieldError>;

    /// Request input focus.
    fn focus(&self) -> Result<(), FieldError>;

    /// Tell the field its form has been submitted at least once.
    fn mark_form_submitted(&self) -> Result<(), FieldError>;
}

/// A published field handle.
pub type FieldHandle<R> = Arc<dyn FieldApi<R>>;

/// Registry of the field handles of one form.
pub type FieldRegistry<R> = HandleRegistry<FieldHandle<R>>;
