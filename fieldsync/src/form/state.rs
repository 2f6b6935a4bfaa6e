//! Form state: record ownership and submission.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use indexmap::IndexMap;

use super::config::{FormConfig, SubmitMode};
use super::handle::{FormHandle, FormRegistry};
use crate::callbacks::{DataSubmitFn, FormChangeFn, ValidityChangeFn};
use crate::error::{FormError, RegistryError};
use crate::events::SubmitEvent;
use crate::field::{FieldHandle, FieldRegistry};
use crate::registry::Registration;
use crate::validation::{CombinedValidator, Meta, Reason, ValidationFailure, Validator};
use crate::value::{FieldValue, FormData};

/// Reports a field value into a form; held weakly by mounted fields.
pub(crate) type ValueSink = Arc<dyn Fn(&str, FieldValue) + Send + Sync>;

/// Internal state for a form, shared with its [`FormHandle`].
pub(crate) struct FormInner<R> {
    /// The committed record
    pub(crate) field_values: FormData,
    /// Per-field failure groups from the last submission
    pub(crate) field_results: IndexMap<String, Vec<ValidationFailure<R, Meta>>>,
    /// Cached record validation result
    pub(crate) last_result: Vec<ValidationFailure<R, Meta>>,
    /// Summary errors set through the form handle
    pub(crate) form_errors: Vec<ValidationFailure<R, Meta>>,
    pub(crate) was_submitted: bool,
    pub(crate) is_submitting: bool,
    /// Data seen by the previous render
    pub(crate) last_rendered: Option<FormData>,
    /// Whether the form-changed callback has fired since mount
    pub(crate) change_notified: bool,
    pub(crate) mounted: bool,
    /// Bumped on every mount; the published handle carries its own
    pub(crate) epoch: u64,
    /// Handle publication, while mounted in a parent registry
    pub(crate) registration: Option<(FormRegistry<R>, Registration)>,
}

/// A form: owns the record, drives submission, and fans failures out
/// to its fields.
///
/// `Form` is a cheap-clone handle. Fields never touch the record
/// directly; a mounted field reports every value through
/// [`handle_value_change`](Self::handle_value_change).
///
/// # Example
///
/// ```
/// use fieldsync::prelude::*;
///
/// let zip: Validator<FieldValue> = from_rules(vec![rules::digits(5, "Zip must be 5 digits")], Meta::new());
/// let form: Form = FormConfig::new("address")
///     .combined(combine_validators([("zip", zip)]))
///     .build()
///     .unwrap();
///
/// let field: Field<String> = Field::new(FieldConfig::new("zip"));
/// field.mount(&form).unwrap();
/// field.handle_change("123".to_string()).unwrap();
///
/// let mut event = SubmitEvent::new();
/// let failures = form.handle_submit(&mut event).unwrap();
/// assert_eq!(failures[0].field(), Some("zip"));
/// assert!(event.is_default_prevented());
/// assert!(field.has_visible_errors());
/// ```
pub struct Form<R = String> {
    name: Arc<str>,
    declared: Arc<[String]>,
    validator: Validator<FormData, R, Meta>,
    combined: Option<CombinedValidator<FormData, R, Meta>>,
    on_form_change: FormChangeFn,
    on_form_validity_change: ValidityChangeFn<R>,
    on_data_submit: DataSubmitFn<R>,
    submit_mode: SubmitMode,
    focus_first_invalid: bool,
    fields: FieldRegistry<R>,
    inner: Arc<RwLock<FormInner<R>>>,
}

impl<R: Reason> Form<R> {
    pub(super) fn from_config(config: FormConfig<R>, validator: Validator<FormData, R, Meta>) -> Self {
        let field_values = FormData::with_fields(config.fields.iter().cloned());
        Self {
            name: Arc::from(config.name),
            declared: Arc::from(config.fields),
            validator,
            combined: config.combined,
            on_form_change: config.on_form_change,
            on_form_validity_change: config.on_form_validity_change,
            on_data_submit: config.on_data_submit,
            submit_mode: config.submit_mode,
            focus_first_invalid: config.focus_first_invalid,
            fields: FieldRegistry::new(),
            inner: Arc::new(RwLock::new(FormInner {
                field_values,
                field_results: IndexMap::new(),
                last_result: Vec::new(),
                form_errors: Vec::new(),
                was_submitted: false,
                is_submitting: false,
                last_rendered: None,
                change_notified: false,
                mounted: false,
                epoch: 0,
                registration: None,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, FormInner<R>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FormInner<R>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Read methods
    // -------------------------------------------------------------------------

    /// The form name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared field names, in declaration order.
    pub fn declared_fields(&self) -> &[String] {
        &self.declared
    }

    /// The per-field record validator, if one was configured.
    pub fn combined(&self) -> Option<&CombinedValidator<FormData, R, Meta>> {
        self.combined.as_ref()
    }

    /// Registry of the mounted fields' handles.
    pub fn fields(&self) -> &FieldRegistry<R> {
        &self.fields
    }

    /// The live handle of a mounted field.
    pub fn field(&self, name: &str) -> Option<FieldHandle<R>> {
        self.fields.get(name)
    }

    /// Snapshot of the record.
    pub fn field_values(&self) -> FormData {
        self.read().field_values.clone()
    }

    /// Per-field failure groups from the last submission.
    pub fn field_results(&self) -> IndexMap<String, Vec<ValidationFailure<R, Meta>>> {
        self.read().field_results.clone()
    }

    /// The cached record validation result.
    pub fn last_validation_result(&self) -> Vec<ValidationFailure<R, Meta>> {
        self.read().last_result.clone()
    }

    /// Summary errors set through the form handle.
    pub fn form_errors(&self) -> Vec<ValidationFailure<R, Meta>> {
        self.read().form_errors.clone()
    }

    /// Whether a submission was ever attempted.
    pub fn was_submitted(&self) -> bool {
        self.read().was_submitted
    }

    /// Whether a submission is in progress.
    pub fn is_submitting(&self) -> bool {
        self.read().is_submitting
    }

    /// Whether the form is mounted in a parent registry.
    pub fn is_mounted(&self) -> bool {
        self.read().mounted
    }

    /// Run one field's validator from the combined validator.
    ///
    /// Returns `None` without a combined validator or for unknown names.
    pub fn validate_field(&self, name: &str, value: &FieldValue) -> Option<Vec<ValidationFailure<R, Meta>>> {
        self.combined.as_ref()?.validate_field(name, value)
    }

    // -------------------------------------------------------------------------
    // Record updates
    // -------------------------------------------------------------------------

    /// Set one field's value in the record.
    ///
    /// Mounted fields report through the same path.
    pub fn handle_value_change(&self, name: &str, value: impl Into<FieldValue>) {
        record_value(&self.inner, &self.name, name, value.into());
    }

    /// A weak link mounted fields use to report values.
    pub(crate) fn value_sink(&self) -> ValueSink {
        let inner: Weak<RwLock<FormInner<R>>> = Arc::downgrade(&self.inner);
        let form_name = Arc::clone(&self.name);
        Arc::new(move |name: &str, value: FieldValue| match inner.upgrade() {
            Some(inner) => record_value(&inner, &form_name, name, value),
            None => log::warn!("Field '{}' reported a value after form '{}' was dropped", name, form_name),
        })
    }

    /// Set a mounted field's value through its handle.
    pub fn set_field_value(&self, name: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        let handle = self.fields.get(name).ok_or_else(|| {
            log::error!("Form '{}' has no mounted field '{}'", self.name, name);
            RegistryError::NotRegistered { key: name.to_string() }
        })?;
        handle.set_field_value(value.into())?;
        Ok(())
    }

    /// The render effect.
    ///
    /// Fires the form-changed callback when the record differs by value
    /// from the one seen at the previous render, or on the first render.
    /// Returns whether the callback fired.
    pub fn on_render(&self) -> bool {
        let (data, is_first) = {
            let mut inner = self.write();
            if inner.last_rendered.as_ref() == Some(&inner.field_values) {
                return false;
            }
            let data = inner.field_values.clone();
            let is_first = !inner.change_notified;
            inner.last_rendered = Some(data.clone());
            inner.change_notified = true;
            (data, is_first)
        };
        log::debug!("Form '{}' rendered changed data (first: {})", self.name, is_first);

        (self.on_form_change)(&data, is_first);
        true
    }

    // -------------------------------------------------------------------------
    // Submission
    // -------------------------------------------------------------------------

    /// Handle a submission attempt.
    ///
    /// Validates the whole record, pushes each field its own failures
    /// (an empty list for fields that are now valid), and hands the
    /// result to the data-submission callback whatever the validity.
    /// The form never blocks submission itself.
    ///
    /// Fails only when another submission is still in progress. If a
    /// validator or callback panics, the submitting state is cleared
    /// before the panic propagates.
    pub fn handle_submit(&self, event: &mut SubmitEvent) -> Result<Vec<ValidationFailure<R, Meta>>, FormError> {
        let data = {
            let mut inner = self.write();
            if inner.is_submitting {
                log::error!("Form '{}' submitted while a submission is in progress", self.name);
                return Err(FormError::SubmitInProgress);
            }
            inner.is_submitting = true;
            inner.field_values.clone()
        };
        let mut guard = SubmittingGuard {
            inner: &self.inner,
            clear: true,
        };
        log::debug!("Form '{}' submission {} started", self.name, event.id());

        let failures = self.validator.validate(&data);

        let changed = {
            let mut inner = self.write();
            let changed = inner.last_result != failures;
            if changed {
                inner.last_result = failures.clone();
            }
            inner.was_submitted = true;
            changed
        };
        if changed {
            (self.on_form_validity_change)(&failures);
        }

        let handles = self.fields.handles();
        for (name, handle) in &handles {
            if let Err(err) = handle.mark_form_submitted() {
                log::error!("Form '{}': field '{}' rejected submission: {}", self.name, name, err);
            }
        }

        let groups = group_by_field(&failures);
        let mut results = IndexMap::new();
        for (name, handle) in &handles {
            let group = groups.get(name.as_str()).cloned().unwrap_or_default();
            if let Err(err) = handle.set_field_errors(group.clone()) {
                log::error!("Form '{}': field '{}' rejected errors: {}", self.name, name, err);
            }
            results.insert(name.clone(), group);
        }
        for (name, group) in groups {
            results.entry(name).or_insert(group);
        }
        self.write().field_results = results;

        if self.focus_first_invalid {
            let first = failures
                .iter()
                .filter_map(|failure| failure.meta.field.as_deref())
                .find_map(|name| handles.iter().find(|(key, _)| key == name));
            if let Some((name, handle)) = first
                && let Err(err) = handle.focus()
            {
                log::error!("Form '{}': could not focus '{}': {}", self.name, name, err);
            }
        }

        (self.on_data_submit)(&failures, &data, event);
        event.prevent_default();

        guard.clear = self.submit_mode == SubmitMode::Immediate;
        drop(guard);
        log::debug!(
            "Form '{}' submission {} handled, {} failures",
            self.name,
            event.id(),
            failures.len()
        );

        Ok(failures)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Mount into a parent registry, publishing this form's handle
    /// under its name.
    pub fn mount(&self, registry: &FormRegistry<R>) -> Result<(), FormError> {
        let epoch = {
            let mut inner = self.write();
            if inner.mounted {
                log::error!("Form '{}' mounted twice", self.name);
                return Err(RegistryError::AlreadyRegistered {
                    key: self.name.to_string(),
                }
                .into());
            }
            inner.mounted = true;
            inner.epoch += 1;
            inner.change_notified = false;
            inner.epoch
        };

        let handle = FormHandle::new(Arc::clone(&self.name), Arc::clone(&self.inner), epoch);
        match registry.publish(self.name.to_string(), handle) {
            Ok(registration) => {
                self.write().registration = Some((registry.clone(), registration));
                log::debug!("Form '{}' mounted", self.name);
                Ok(())
            }
            Err(err) => {
                self.write().mounted = false;
                Err(err.into())
            }
        }
    }

    /// Unmount, withdrawing the published handle first.
    pub fn unmount(&self) -> Result<(), FormError> {
        let registration = {
            let inner = self.read();
            if !inner.mounted {
                log::error!("Form '{}' unmounted while not mounted", self.name);
                return Err(RegistryError::Unmounted {
                    key: self.name.to_string(),
                }
                .into());
            }
            inner.registration.clone()
        };

        let withdrawn = match &registration {
            Some((registry, registration)) => registry.withdraw(registration).map(drop),
            None => Ok(()),
        };

        {
            let mut inner = self.write();
            inner.registration = None;
            inner.mounted = false;
        }
        log::debug!("Form '{}' unmounted", self.name);

        withdrawn.map_err(FormError::from)
    }
}

/// Leaves the submitting state on drop when `clear` is set, including
/// while unwinding.
struct SubmittingGuard<'a, R> {
    inner: &'a RwLock<FormInner<R>>,
    clear: bool,
}

impl<R> Drop for SubmittingGuard<'_, R> {
    fn drop(&mut self) {
        if self.clear {
            self.inner.write().unwrap_or_else(PoisonError::into_inner).is_submitting = false;
        }
    }
}

/// The single write path into a form's record.
fn record_value<R>(inner: &RwLock<FormInner<R>>, form: &str, name: &str, value: FieldValue) {
    log::debug!("Form '{}': '{}' = {:?}", form, name, value);
    inner
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .field_values
        .set(name, value);
}

/// Group failures by the record key in their metadata, keeping order.
fn group_by_field<R: Clone>(
    failures: &[ValidationFailure<R, Meta>],
) -> IndexMap<String, Vec<ValidationFailure<R, Meta>>> {
    let mut groups: IndexMap<String, Vec<ValidationFailure<R, Meta>>> = IndexMap::new();
    for failure in failures {
        if let Some(field) = failure.meta.field.as_deref() {
            groups.entry(field.to_string()).or_default().push(failure.clone());
        }
    }
    groups
}

impl<R> Clone for Form<R> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            declared: Arc::clone(&self.declared),
            validator: self.validator.clone(),
            combined: self.combined.clone(),
            on_form_change: Arc::clone(&self.on_form_change),
            on_form_validity_change: Arc::clone(&self.on_form_validity_change),
            on_data_submit: Arc::clone(&self.on_data_submit),
            submit_mode: self.submit_mode,
            focus_first_invalid: self.focus_first_invalid,
            fields: self.fields.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> fmt::Debug for Form<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Form");
        out.field("name", &self.name)
            .field("declared", &self.declared)
            .field("fields", &self.fields);
        if let Ok(inner) = self.inner.read() {
            out.field("field_values", &inner.field_values)
                .field("was_submitted", &inner.was_submitted)
                .field("is_submitting", &inner.is_submitting);
        }
        out.finish_non_exhaustive()
    }
}
