//! Field configuration.

use std::fmt;
use std::sync::Arc;

use crate::callbacks::{ValidityChangeFn, ValueChangeFn, noop_validity_change, noop_value_change};
use crate::events::ChangeSource;
use crate::validation::{Meta, Reason, ValidationFailure, Validator};

/// Per-field configuration.
///
/// Callbacks default to no-ops and the validator defaults to
/// [`always_valid`](crate::validation::always_valid).
pub struct FieldConfig<V, R = String> {
    /// Field name; also the key in the owning form's record.
    pub name: String,

    /// Value at mount and after a plain reset.
    pub default_value: V,

    /// Rule set for this field.
    pub validator: Validator<V, R, Meta>,

    /// Fired on every value change, including programmatic ones.
    pub on_value_change: ValueChangeFn<V>,

    /// Fired when this field's own validation result changes.
    pub on_validity_change: ValidityChangeFn<R>,
}

impl<V: Default + Clone + Send + Sync + 'static, R: Reason> FieldConfig<V, R> {
    /// Create a new config with the given name and `V::default()`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_default(name, V::default())
    }
}

impl<V: Clone + Send + Sync + 'static, R: Reason> FieldConfig<V, R> {
    /// Create a new config with the given name and default value.
    pub fn with_default(name: impl Into<String>, default_value: V) -> Self {
        Self {
            name: name.into(),
            default_value,
            validator: Validator::always_valid(),
            on_value_change: noop_value_change(),
            on_validity_change: noop_validity_change(),
        }
    }

    /// Set the default value.
    pub fn default_value(mut self, value: V) -> Self {
        self.default_value = value;
        self
    }

    /// Set the validator.
    pub fn validator(mut self, validator: Validator<V, R, Meta>) -> Self {
        self.validator = validator;
        self
    }

    /// Set the value-changed callback.
    pub fn on_value_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&V, &str, ChangeSource) + Send + Sync + 'static,
    {
        self.on_value_change = Arc::new(f);
        self
    }

    /// Set the validity-changed callback.
    pub fn on_validity_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&[ValidationFailure<R, Meta>]) + Send + Sync + 'static,
    {
        self.on_validity_change = Arc::new(f);
        self
    }
}

impl<V: fmt::Debug, R> fmt::Debug for FieldConfig<V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfig")
            .field("name", &self.name)
            .field("default_value", &self.default_value)
            .finish_non_exhaustive()
    }
}
