//! Callback types used by fields and forms.
//!
//! Every callback slot holds a real function; unset slots hold a no-op
//! closure, so call sites never check for "no callback".

use std::sync::Arc;

use crate::events::{ChangeSource, SubmitEvent};
use crate::validation::{Meta, ValidationFailure};
use crate::value::FormData;

/// Fired on every value change: `(value, field name, source)`.
pub type ValueChangeFn<V> = Arc<dyn Fn(&V, &str, ChangeSource) + Send + Sync>;

/// Fired when a validation result differs from the previous one.
pub type ValidityChangeFn<R> = Arc<dyn Fn(&[ValidationFailure<R, Meta>]) + Send + Sync>;

/// Fired after a render that changed the form data: `(data, is_first)`.
pub type FormChangeFn = Arc<dyn Fn(&FormData, bool) + Send + Sync>;

/// Fired on every submission attempt: `(failures, data, event)`.
pub type DataSubmitFn<R> = Arc<dyn Fn(&[ValidationFailure<R, Meta>], &FormData, &SubmitEvent) + Send + Sync>;

pub(crate) fn noop_value_change<V: 'static>() -> ValueChangeFn<V> {
    Arc::new(|_: &V, _: &str, _: ChangeSource| {})
}

pub(crate) fn noop_validity_change<R: 'static>() -> ValidityChangeFn<R> {
    Arc::new(|_: &[ValidationFailure<R, Meta>]| {})
}

pub(crate) fn noop_form_change() -> FormChangeFn {
    Arc::new(|_: &FormData, _: bool| {})
}

pub(crate) fn noop_data_submit<R: 'static>() -> DataSubmitFn<R> {
    Arc::new(|_: &[ValidationFailure<R, Meta>], _: &FormData, _: &SubmitEvent| {})
}
