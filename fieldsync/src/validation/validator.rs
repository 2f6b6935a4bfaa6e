//! The `Validator` function type and its generic combinators.

use std::fmt;
use std::sync::Arc;

use super::failure::ValidationFailure;
use super::meta::Meta;

/// Type alias for the boxed check behind a [`Validator`].
type CheckFn<T, R, M> = dyn Fn(&T) -> Vec<ValidationFailure<R, M>> + Send + Sync;

/// A pure function from a value to its validation failures.
///
/// An empty result means valid. Failures come back in rule declaration
/// order; the first one is the "primary" failure a UI usually shows.
/// The input is only ever borrowed immutably.
///
/// Validators are cheap to clone and can be shared between fields.
///
/// # Example
///
/// ```
/// use fieldsync::validation::{from_rules, rules, Meta, Validator};
///
/// let zip: Validator<str> = from_rules(
///     vec![
///         rules::required("Zip is required"),
///         rules::digits(5, "Zip must be 5 digits"),
///     ],
///     Meta::new(),
/// );
///
/// assert_eq!(zip.validate("").len(), 2);
/// assert_eq!(zip.validate("1").len(), 1);
/// assert!(zip.validate("12345").is_empty());
/// ```
pub struct Validator<T: ?Sized, R = String, M = Meta> {
    check: Arc<CheckFn<T, R, M>>,
}

impl<T: ?Sized, R, M> Validator<T, R, M> {
    /// Wrap a check function.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&T) -> Vec<ValidationFailure<R, M>> + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
        }
    }

    /// Run the check.
    pub fn validate(&self, value: &T) -> Vec<ValidationFailure<R, M>> {
        (self.check)(value)
    }

    /// Returns `true` if the value produces no failures.
    pub fn is_valid(&self, value: &T) -> bool {
        self.validate(value).is_empty()
    }
}

impl<T: ?Sized + 'static, R: 'static, M: 'static> Validator<T, R, M> {
    /// The validator that accepts everything.
    pub fn always_valid() -> Self {
        Self::new(|_: &T| Vec::new())
    }

    /// Run `self`, then `other`, concatenating their failures.
    pub fn and(&self, other: &Self) -> Self {
        compose_validators([self.clone(), other.clone()])
    }
}

impl<T: ?Sized, R, M> Clone for Validator<T, R, M> {
    fn clone(&self) -> Self {
        Self {
            check: Arc::clone(&self.check),
        }
    }
}

impl<T: ?Sized + 'static, R: 'static, M: 'static> Default for Validator<T, R, M> {
    fn default() -> Self {
        Self::always_valid()
    }
}

impl<T: ?Sized, R, M> fmt::Debug for Validator<T, R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

/// The validator that accepts everything.
///
/// This is the default wherever a validator is optional.
pub fn always_valid<T: ?Sized + 'static, R: 'static, M: 'static>() -> Validator<T, R, M> {
    Validator::always_valid()
}

/// Run several validators over the same input and concatenate their
/// failures in the order the validators were given.
///
/// Used to layer always-on checks with caller-supplied ones.
pub fn compose_validators<T, R, M, I>(validators: I) -> Validator<T, R, M>
where
    T: ?Sized + 'static,
    R: 'static,
    M: 'static,
    I: IntoIterator<Item = Validator<T, R, M>>,
{
    let validators: Vec<_> = validators.into_iter().collect();
    Validator::new(move |value: &T| {
        validators
            .iter()
            .flat_map(|validator| validator.validate(value))
            .collect()
    })
}
