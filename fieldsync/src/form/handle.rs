//! The imperative handle a mounted form publishes to its parent.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::state::FormInner;
use crate::error::RegistryError;
use crate::registry::HandleRegistry;
use crate::validation::{Meta, Reason, ValidationFailure};

/// Parent-facing handle of a mounted form.
///
/// Bound to one mount of one form instance. Once that form unmounts,
/// mutating calls fail with [`RegistryError::Unmounted`] and change
/// nothing, even after the form mounts again.
pub struct FormHandle<R = String> {
    name: Arc<str>,
    inner: Arc<RwLock<FormInner<R>>>,
    epoch: u64,
}

/// Registry of form handles, read by the parent.
pub type FormRegistry<R = String> = HandleRegistry<FormHandle<R>>;

impl<R: Reason> FormHandle<R> {
    pub(super) fn new(name: Arc<str>, inner: Arc<RwLock<FormInner<R>>>, epoch: u64) -> Self {
        Self { name, inner, epoch }
    }

    fn read(&self) -> RwLockReadGuard<'_, FormInner<R>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_mounted(&self) -> Result<RwLockWriteGuard<'_, FormInner<R>>, RegistryError> {
        let inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.mounted && inner.epoch == self.epoch {
            Ok(inner)
        } else {
            log::error!("Handle of form '{}' used after unmount", self.name);
            Err(RegistryError::Unmounted {
                key: self.name.to_string(),
            })
        }
    }

    /// The form name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the form-level summary errors.
    pub fn set_form_errors(&self, failures: Vec<ValidationFailure<R, Meta>>) -> Result<(), RegistryError> {
        let mut inner = self.write_mounted()?;
        log::debug!("Form '{}' summary errors set ({})", self.name, failures.len());
        inner.form_errors = failures;
        Ok(())
    }

    /// Leave the submitting state.
    ///
    /// Needed with [`SubmitMode::AwaitCompletion`](super::SubmitMode::AwaitCompletion);
    /// harmless otherwise.
    pub fn submit_completed(&self) -> Result<(), RegistryError> {
        let mut inner = self.write_mounted()?;
        inner.is_submitting = false;
        log::debug!("Form '{}' submission completed", self.name);
        Ok(())
    }

    /// The form-level summary errors.
    pub fn form_errors(&self) -> Vec<ValidationFailure<R, Meta>> {
        self.read().form_errors.clone()
    }

    /// Whether a submission is in progress.
    pub fn is_submitting(&self) -> bool {
        self.read().is_submitting
    }

    /// Whether the form was ever submitted.
    pub fn was_submitted(&self) -> bool {
        self.read().was_submitted
    }
}

impl<R> Clone for FormHandle<R> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            inner: Arc::clone(&self.inner),
            epoch: self.epoch,
        }
    }
}

impl<R> fmt::Debug for FormHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormHandle").field("name", &self.name).finish()
    }
}
