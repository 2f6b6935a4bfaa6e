//! Field state and error visibility.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::api::{FieldApi, FieldHandle, FieldRegistry};
use super::config::FieldConfig;
use crate::callbacks::{ValidityChangeFn, ValueChangeFn};
use crate::error::{FieldError, RegistryError};
use crate::events::ChangeSource;
use crate::form::Form;
use crate::registry::Registration;
use crate::validation::{Meta, Reason, ValidationFailure, Validator};
use crate::value::{FieldValue, FormValue};

/// Touch phase of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldPhase {
    /// Not yet touched since mount or the last reset.
    #[default]
    Pristine,
    /// Changed at least once, then blurred.
    Touched,
}

/// Reports a field's value into its owning form.
type FieldSink<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

/// Internal state for a field
struct FieldInner<V, R> {
    /// Current value
    value: V,
    /// Value restored by a plain reset
    default_value: V,
    phase: FieldPhase,
    /// Whether an edit happened since mount/reset (gates touching)
    changed_since_reset: bool,
    /// Cached result of the last validator run
    last_result: Vec<ValidationFailure<R, Meta>>,
    /// Failures currently shown; may be overridden by the form
    displayed: Vec<ValidationFailure<R, Meta>>,
    /// Whether the owning form has submitted at least once
    form_submitted: bool,
    /// Focus request flag (consumed by the renderer)
    focus_requested: bool,
    mounted: bool,
    /// Bumped on every mount; handles remember the one they were published in
    epoch: u64,
    /// Link to the owning form, while mounted in one
    sink: Option<FieldSink<V>>,
    /// Handle publication, while mounted in a form
    registration: Option<(FieldRegistry<R>, Registration)>,
}

/// A form field with its own value, touch and error-visibility state.
///
/// `Field` is a cheap-clone handle: clones share state. The rendering
/// layer feeds it raw events ([`handle_change`](Self::handle_change),
/// [`handle_blur`](Self::handle_blur)) and reads back what to show
/// ([`visible_errors`](Self::visible_errors)).
///
/// Errors become visible once the field is touched (changed, then
/// blurred) or its form has been submitted. Validity callbacks fire only
/// when the validation result actually changes.
///
/// Every mutating call requires the field to be mounted; calls on an
/// unmounted field return [`RegistryError::Unmounted`] and change nothing.
///
/// # Example
///
/// ```
/// use fieldsync::prelude::*;
///
/// let zip: Field<String> = Field::new(
///     FieldConfig::new("zip").validator(from_rules(
///         vec![rules::required("Zip is required"), rules::digits(5, "Zip must be 5 digits")],
///         Meta::new(),
///     )),
/// );
///
/// zip.mount_detached().unwrap();
/// zip.handle_blur().unwrap();
/// assert!(!zip.is_touched());
///
/// zip.handle_change("123".to_string()).unwrap();
/// zip.handle_blur().unwrap();
/// assert!(zip.is_touched());
/// assert_eq!(zip.visible_errors()[0].reason, "Zip must be 5 digits");
/// ```
pub struct Field<V, R = String> {
    name: Arc<str>,
    validator: Validator<V, R, Meta>,
    on_value_change: ValueChangeFn<V>,
    on_validity_change: ValidityChangeFn<R>,
    inner: Arc<RwLock<FieldInner<V, R>>>,
}

impl<V, R> Field<V, R>
where
    V: Clone + Send + Sync + 'static,
    R: Reason,
{
    /// Create an unmounted field from its config.
    pub fn new(config: FieldConfig<V, R>) -> Self {
        Self {
            name: Arc::from(config.name),
            validator: config.validator,
            on_value_change: config.on_value_change,
            on_validity_change: config.on_validity_change,
            inner: Arc::new(RwLock::new(FieldInner {
                value: config.default_value.clone(),
                default_value: config.default_value,
                phase: FieldPhase::Pristine,
                changed_since_reset: false,
                last_result: Vec::new(),
                displayed: Vec::new(),
                form_submitted: false,
                focus_requested: false,
                mounted: false,
                epoch: 0,
                sink: None,
                registration: None,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, FieldInner<V, R>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FieldInner<V, R>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_mounted(&self) -> Result<(), RegistryError> {
        if self.read().mounted {
            Ok(())
        } else {
            log::error!("Field '{}' used while not mounted", self.name);
            Err(RegistryError::Unmounted {
                key: self.name.to_string(),
            })
        }
    }

    /// Like `ensure_mounted`, but also rejects handles from an earlier mount.
    fn ensure_epoch(&self, epoch: u64) -> Result<(), RegistryError> {
        let inner = self.read();
        if inner.mounted && inner.epoch == epoch {
            Ok(())
        } else {
            log::error!("Handle of field '{}' used after its mount ended", self.name);
            Err(RegistryError::Unmounted {
                key: self.name.to_string(),
            })
        }
    }

    // -------------------------------------------------------------------------
    // Read methods
    // -------------------------------------------------------------------------

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current value.
    pub fn value(&self) -> V {
        self.read().value.clone()
    }

    /// The touch phase.
    pub fn phase(&self) -> FieldPhase {
        self.read().phase
    }

    /// Whether the field has been touched.
    pub fn is_touched(&self) -> bool {
        self.phase() == FieldPhase::Touched
    }

    /// Whether the field is mounted.
    pub fn is_mounted(&self) -> bool {
        self.read().mounted
    }

    /// Whether errors may be shown: touched, or the form was submitted.
    pub fn errors_visible(&self) -> bool {
        let inner = self.read();
        inner.phase == FieldPhase::Touched || inner.form_submitted
    }

    /// The cached result of the last validator run.
    pub fn last_result(&self) -> Vec<ValidationFailure<R, Meta>> {
        self.read().last_result.clone()
    }

    /// Failures currently held for display, visible or not.
    pub fn displayed_errors(&self) -> Vec<ValidationFailure<R, Meta>> {
        self.read().displayed.clone()
    }

    /// Failures to render right now.
    ///
    /// Empty until errors are visible.
    pub fn visible_errors(&self) -> Vec<ValidationFailure<R, Meta>> {
        let inner = self.read();
        if inner.phase == FieldPhase::Touched || inner.form_submitted {
            inner.displayed.clone()
        } else {
            Vec::new()
        }
    }

    /// Whether any error should be rendered right now.
    pub fn has_visible_errors(&self) -> bool {
        let inner = self.read();
        (inner.phase == FieldPhase::Touched || inner.form_submitted) && !inner.displayed.is_empty()
    }

    /// Whether the field's own validator accepts the current value.
    pub fn is_valid(&self) -> bool {
        let value = self.value();
        self.validator.is_valid(&value)
    }

    /// Consume a pending focus request.
    pub fn take_focus_request(&self) -> bool {
        std::mem::take(&mut self.write().focus_requested)
    }

    // -------------------------------------------------------------------------
    // Event handling
    // -------------------------------------------------------------------------

    /// A raw value change from the user.
    ///
    /// Re-runs the validator. The value callback always fires; the
    /// validity callback fires after it, only if the result changed.
    /// Does not touch the field by itself.
    pub fn handle_change(&self, value: V) -> Result<(), FieldError> {
        self.ensure_mounted()?;
        self.apply_value(value, ChangeSource::Input);
        Ok(())
    }

    /// The field lost focus.
    ///
    /// Re-runs the validator with the same change detection as
    /// [`handle_change`](Self::handle_change), and touches the field if
    /// its value was edited since mount or the last reset.
    pub fn handle_blur(&self) -> Result<(), FieldError> {
        self.ensure_mounted()?;

        let value = self.value();
        let result = self.validator.validate(&value);

        let changed = {
            let mut inner = self.write();
            let changed = inner.last_result != result;
            if changed {
                inner.last_result = result.clone();
                inner.displayed = result.clone();
            }
            if inner.changed_since_reset && inner.phase == FieldPhase::Pristine {
                inner.phase = FieldPhase::Touched;
                log::debug!("Field '{}' touched", self.name);
            }
            changed
        };

        if changed {
            (self.on_validity_change)(&result);
        }
        Ok(())
    }

    /// Set the value programmatically.
    ///
    /// Notifies exactly like [`handle_change`](Self::handle_change).
    pub fn set_value(&self, value: V) -> Result<(), FieldError> {
        self.ensure_mounted()?;
        self.apply_value(value, ChangeSource::Programmatic);
        Ok(())
    }

    /// Override the displayed errors without running the validator.
    ///
    /// Used by the form to push record-level failures (for example
    /// "passwords do not match") down to the field. Does not fire the
    /// validity callback.
    pub fn set_errors(&self, failures: Vec<ValidationFailure<R, Meta>>) -> Result<(), FieldError> {
        self.ensure_mounted()?;
        self.write().displayed = failures;
        Ok(())
    }

    /// Request input focus.
    pub fn focus(&self) -> Result<(), FieldError> {
        self.ensure_mounted()?;
        self.write().focus_requested = true;
        Ok(())
    }

    /// Back to pristine with `default`, or the configured default.
    ///
    /// Clears the cached result and displayed errors. The value callback
    /// fires with [`ChangeSource::Reset`] so the owning form's record
    /// follows; the validity callback does not.
    pub fn reset(&self, default: Option<V>) -> Result<(), FieldError> {
        self.ensure_mounted()?;

        let (value, sink) = {
            let mut inner = self.write();
            let value = default.unwrap_or_else(|| inner.default_value.clone());
            inner.value = value.clone();
            inner.phase = FieldPhase::Pristine;
            inner.changed_since_reset = false;
            inner.last_result.clear();
            inner.displayed.clear();
            (value, inner.sink.clone())
        };
        log::debug!("Field '{}' reset", self.name);

        self.notify_value(&value, ChangeSource::Reset, sink.as_ref());
        Ok(())
    }

    /// Mount without a form: runs mount-time validation only.
    pub fn mount_detached(&self) -> Result<(), FieldError> {
        self.begin_mount(None, false)?;
        self.apply_value(self.value(), ChangeSource::Mount);
        Ok(())
    }

    /// Unmount, withdrawing the published handle first.
    pub fn unmount(&self) -> Result<(), FieldError> {
        self.ensure_mounted()?;

        let registration = self.write().registration.take();
        let withdrawn = match registration {
            Some((registry, registration)) => registry.withdraw(&registration).map(drop),
            None => Ok(()),
        };

        {
            let mut inner = self.write();
            inner.mounted = false;
            inner.sink = None;
        }
        log::debug!("Field '{}' unmounted", self.name);

        withdrawn.map_err(FieldError::from)
    }

    fn begin_mount(&self, sink: Option<FieldSink<V>>, form_submitted: bool) -> Result<u64, RegistryError> {
        let mut inner = self.write();
        if inner.mounted {
            log::error!("Field '{}' mounted twice", self.name);
            return Err(RegistryError::AlreadyRegistered {
                key: self.name.to_string(),
            });
        }
        inner.mounted = true;
        inner.epoch += 1;
        inner.sink = sink;
        inner.form_submitted |= form_submitted;
        Ok(inner.epoch)
    }

    fn apply_value(&self, value: V, source: ChangeSource) {
        let result = self.validator.validate(&value);

        let (changed, sink) = {
            let mut inner = self.write();
            inner.value = value.clone();
            if source.is_edit() {
                inner.changed_since_reset = true;
            }
            let changed = inner.last_result != result;
            if changed {
                inner.last_result = result.clone();
            }
            inner.displayed = result.clone();
            (changed, inner.sink.clone())
        };
        log::trace!(
            "Field '{}' value change ({:?}), {} failures",
            self.name,
            source,
            result.len()
        );

        self.notify_value(&value, source, sink.as_ref());
        if changed {
            (self.on_validity_change)(&result);
        }
    }

    fn notify_value(&self, value: &V, source: ChangeSource, sink: Option<&FieldSink<V>>) {
        if let Some(sink) = sink {
            sink(&self.name, value);
        }
        (self.on_value_change)(value, &self.name, source);
    }
}

impl<V, R> Field<V, R>
where
    V: FormValue,
    R: Reason,
{
    /// Mount into a form.
    ///
    /// Runs mount-time validation (reporting the initial value to the
    /// form), then publishes this field's handle under its name. Fails if
    /// the form does not declare the name, or if another field with the
    /// same name is live in the form.
    ///
    /// The published handle only works for this mount. After an unmount
    /// it stays dead, even if this field mounts again.
    pub fn mount(&self, form: &Form<R>) -> Result<(), FieldError> {
        if !form.declared_fields().iter().any(|name| **name == *self.name) {
            log::error!("Field '{}' is not declared by form '{}'", self.name, form.name());
            return Err(FieldError::Undeclared {
                field: self.name.to_string(),
                form: form.name().to_string(),
            });
        }

        let registry = form.fields().clone();
        if registry.contains(&self.name) {
            log::error!(
                "Field '{}' is already registered in form '{}'",
                self.name,
                form.name()
            );
            return Err(RegistryError::AlreadyRegistered {
                key: self.name.to_string(),
            }
            .into());
        }

        let form_sink = form.value_sink();
        let sink: FieldSink<V> = Arc::new(move |name: &str, value: &V| form_sink(name, value.to_field_value()));
        let epoch = self.begin_mount(Some(sink), form.was_submitted())?;
        self.apply_value(self.value(), ChangeSource::Mount);

        let handle: FieldHandle<R> = Arc::new(MountedField {
            field: self.clone(),
            epoch,
        });
        match registry.publish(self.name.to_string(), handle) {
            Ok(registration) => {
                self.write().registration = Some((registry, registration));
                log::debug!("Field '{}' mounted in form '{}'", self.name, form.name());
                Ok(())
            }
            Err(err) => {
                let mut inner = self.write();
                inner.mounted = false;
                inner.sink = None;
                Err(err.into())
            }
        }
    }
}

impl<V, R> FieldApi<R> for Field<V, R>
where
    V: FormValue,
    R: Reason,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn set_field_value(&self, value: FieldValue) -> Result<(), FieldError> {
        self.ensure_mounted()?;
        let actual = value.type_name();
        let value = V::from_field_value(value).ok_or_else(|| FieldError::type_mismatch(self.name.to_string(), actual))?;
        self.apply_value(value, ChangeSource::Programmatic);
        Ok(())
    }

    fn set_field_errors(&self, failures: Vec<ValidationFailure<R, Meta>>) -> Result<(), FieldError> {
        self.set_errors(failures)
    }

    fn focus(&self) -> Result<(), FieldError> {
        Field::focus(self)
    }

    fn mark_form_submitted(&self) -> Result<(), FieldError> {
        self.ensure_mounted()?;
        self.write().form_submitted = true;
        Ok(())
    }
}

/// The handle a field publishes into its form, bound to one mount.
struct MountedField<V, R> {
    field: Field<V, R>,
    epoch: u64,
}

impl<V, R> FieldApi<R> for MountedField<V, R>
where
    V: FormValue,
    R: Reason,
{
    fn name(&self) -> &str {
        &self.field.name
    }

    fn set_field_value(&self, value: FieldValue) -> Result<(), FieldError> {
        self.field.ensure_epoch(self.epoch)?;
        FieldApi::set_field_value(&self.field, value)
    }

    fn set_field_errors(&self, failures: Vec<ValidationFailure<R, Meta>>) -> Result<(), FieldError> {
        self.field.ensure_epoch(self.epoch)?;
        self.field.set_errors(failures)
    }

    fn focus(&self) -> Result<(), FieldError> {
        self.field.ensure_epoch(self.epoch)?;
        Field::focus(&self.field)
    }

    fn mark_form_submitted(&self) -> Result<(), FieldError> {
        self.field.ensure_epoch(self.epoch)?;
        FieldApi::mark_form_submitted(&self.field)
    }
}

impl<V, R> Clone for Field<V, R> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            validator: self.validator.clone(),
            on_value_change: Arc::clone(&self.on_value_change),
            on_validity_change: Arc::clone(&self.on_validity_change),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: fmt::Debug, R> fmt::Debug for Field<V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Field");
        out.field("name", &self.name);
        if let Ok(inner) = self.inner.read() {
            out.field("value", &inner.value)
                .field("phase", &inner.phase)
                .field("mounted", &inner.mounted);
        }
        out.finish_non_exhaustive()
    }
}
