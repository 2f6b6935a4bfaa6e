//! Form configuration.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::state::Form;
use crate::callbacks::{
    DataSubmitFn, FormChangeFn, ValidityChangeFn, noop_data_submit, noop_form_change, noop_validity_change,
};
use crate::error::FormError;
use crate::events::SubmitEvent;
use crate::validation::{CombinedValidator, Meta, Reason, ValidationFailure, Validator, compose_validators};
use crate::value::FormData;

/// When a form leaves the "submitting" state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitMode {
    /// Cleared as soon as `handle_submit` returns.
    #[default]
    Immediate,

    /// Kept until the parent calls
    /// [`FormHandle::submit_completed`](super::FormHandle::submit_completed).
    /// Further submissions are rejected meanwhile.
    AwaitCompletion,
}

/// Per-form configuration.
///
/// Built with chained setters and turned into a [`Form`] with
/// [`build`](Self::build).
///
/// # Example
///
/// ```
/// use fieldsync::prelude::*;
///
/// let zip: Validator<FieldValue> = from_rules(vec![rules::digits(5, "Zip must be 5 digits")], Meta::new());
/// let form: Form = FormConfig::new("address")
///     .combined(combine_validators([("zip", zip)]))
///     .submit_mode(SubmitMode::AwaitCompletion)
///     .build()
///     .unwrap();
///
/// assert_eq!(form.declared_fields(), ["zip"]);
/// ```
pub struct FormConfig<R = String> {
    /// Display name, used in logs and as the form handle key.
    pub name: String,

    /// Field names, in declaration order.
    pub fields: Vec<String>,

    /// Extra record-level rules, for example cross-field checks.
    pub validator: Validator<FormData, R, Meta>,

    /// Per-field record validator.
    pub combined: Option<CombinedValidator<FormData, R, Meta>>,

    /// Fired after a render that changed the form data.
    pub on_form_change: FormChangeFn,

    /// Fired on submission when the record's result changed.
    pub on_form_validity_change: ValidityChangeFn<R>,

    /// Fired on every submission attempt.
    pub on_data_submit: DataSubmitFn<R>,

    /// When the submitting state clears.
    pub submit_mode: SubmitMode,

    /// Focus the first field with failures after a submission.
    pub focus_first_invalid: bool,
}

impl<R: Reason> FormConfig<R> {
    /// Create a new config with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            validator: Validator::always_valid(),
            combined: None,
            on_form_change: noop_form_change(),
            on_form_validity_change: noop_validity_change(),
            on_data_submit: noop_data_submit(),
            submit_mode: SubmitMode::default(),
            focus_first_invalid: false,
        }
    }

    /// Declare the field names.
    ///
    /// Optional when a combined validator is given: its keys are used.
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the extra record-level validator.
    pub fn validator(mut self, validator: Validator<FormData, R, Meta>) -> Self {
        self.validator = validator;
        self
    }

    /// Set the per-field record validator.
    pub fn combined(mut self, combined: CombinedValidator<FormData, R, Meta>) -> Self {
        self.combined = Some(combined);
        self
    }

    /// Set the form-changed callback.
    pub fn on_form_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&FormData, bool) + Send + Sync + 'static,
    {
        self.on_form_change = Arc::new(f);
        self
    }

    /// Set the form-validity-changed callback.
    pub fn on_form_validity_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&[ValidationFailure<R, Meta>]) + Send + Sync + 'static,
    {
        self.on_form_validity_change = Arc::new(f);
        self
    }

    /// Set the data-submission callback.
    pub fn on_data_submit<F>(mut self, f: F) -> Self
    where
        F: Fn(&[ValidationFailure<R, Meta>], &FormData, &SubmitEvent) + Send + Sync + 'static,
    {
        self.on_data_submit = Arc::new(f);
        self
    }

    /// Set the submit mode.
    pub fn submit_mode(mut self, mode: SubmitMode) -> Self {
        self.submit_mode = mode;
        self
    }

    /// Focus the first invalid field after each submission.
    pub fn focus_first_invalid(mut self) -> Self {
        self.focus_first_invalid = true;
        self
    }

    /// Check the config and create the form.
    ///
    /// Fails on a duplicate field name, or when the combined validator's
    /// keys differ from the declared fields.
    pub fn build(mut self) -> Result<Form<R>, FormError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.fields.iter().find(|name| !seen.insert(name.as_str())) {
            log::error!("Form '{}' declares field '{}' twice", self.name, duplicate);
            return Err(FormError::DuplicateField(duplicate.clone()));
        }

        if let Some(combined) = &self.combined {
            if self.fields.is_empty() {
                self.fields = combined.keys().map(str::to_string).collect();
            } else if let Err(err) = combined.ensure_keys(&self.fields) {
                log::error!("Form '{}': {}", self.name, err);
                return Err(err);
            }
        }

        let validator = match &self.combined {
            Some(combined) => compose_validators([combined.validator(), self.validator.clone()]),
            None => self.validator.clone(),
        };

        log::debug!("Built form '{}' with fields {:?}", self.name, self.fields);
        Ok(Form::from_config(self, validator))
    }
}

impl<R> fmt::Debug for FormConfig<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormConfig")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("submit_mode", &self.submit_mode)
            .field("focus_first_invalid", &self.focus_first_invalid)
            .finish_non_exhaustive()
    }
}
