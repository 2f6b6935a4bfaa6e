//! Validation failures and the reason bound.

use std::fmt;

use serde::Serialize;

use super::meta::{FailureMeta, Meta};
use crate::error::RuleFault;

/// One failed rule.
///
/// `error` is only set when the predicate faulted rather than returning
/// `false`; the failure still counts as invalid either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFailure<R = String, M = Meta> {
    /// Why the value failed, usually a display message.
    pub reason: R,
    /// The fault raised by the predicate, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RuleFault>,
    /// Associated data such as the record key.
    pub meta: M,
}

impl<R, M> ValidationFailure<R, M> {
    /// A plain rule failure.
    pub fn new(reason: R, meta: M) -> Self {
        Self {
            reason,
            error: None,
            meta,
        }
    }

    /// A failure caused by a faulting predicate.
    pub fn faulted(reason: R, error: RuleFault, meta: M) -> Self {
        Self {
            reason,
            error: Some(error),
            meta,
        }
    }

    /// Returns `true` if the predicate faulted.
    pub fn is_fault(&self) -> bool {
        self.error.is_some()
    }
}

impl<R, M: FailureMeta> ValidationFailure<R, M> {
    /// The record key this failure belongs to, if any.
    pub fn field(&self) -> Option<&str> {
        self.meta.field()
    }
}

impl<R: fmt::Display, M> fmt::Display for ValidationFailure<R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{} ({})", self.reason, error),
            None => write!(f, "{}", self.reason),
        }
    }
}

/// Bounds a failure reason must satisfy to flow through fields and forms.
///
/// Blanket-implemented; `String` is the usual choice.
pub trait Reason: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl<T: Clone + PartialEq + fmt::Debug + Send + Sync + 'static> Reason for T {}
