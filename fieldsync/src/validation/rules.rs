//! Predicate rules and the `from_rules` validator constructor.
//!
//! A [`Rule`] pairs a predicate with the reason reported when it fails.
//! [`from_rules`] turns an ordered list of rules into a [`Validator`]
//! that evaluates every rule (no short-circuit) in declaration order.
//!
//! The free functions in this module are ready-made rules for text-like
//! values (`str`, `String`, [`FieldValue`]).

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use email_address::EmailAddress;
use regex::Regex;

use super::failure::ValidationFailure;
use super::meta::{FailureMeta, Meta};
use super::validator::Validator;
use crate::error::{RuleFault, extract_panic_message};
use crate::value::{FieldValue, InputValue};

/// Type alias for a rule predicate. `Err` carries a fault message.
type PredicateFn<T> = dyn Fn(&T) -> Result<bool, String> + Send + Sync;

/// A predicate and the reason reported when it does not hold.
pub struct Rule<T: ?Sized, R = String, M = Meta> {
    predicate: Arc<PredicateFn<T>>,
    reason: R,
    meta: Option<M>,
}

impl<T: ?Sized, R, M> Rule<T, R, M> {
    /// A rule from an infallible predicate.
    pub fn new<F>(predicate: F, reason: R) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate: Arc<PredicateFn<T>> =
            Arc::new(move |value: &T| -> Result<bool, String> { Ok(predicate(value)) });
        Self {
            predicate,
            reason,
            meta: None,
        }
    }

    /// A rule from a predicate that may itself fail.
    ///
    /// An `Err` is reported as a faulted failure with the rule's reason.
    pub fn fallible<F, E>(predicate: F, reason: R) -> Self
    where
        F: Fn(&T) -> Result<bool, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        let predicate: Arc<PredicateFn<T>> = Arc::new(move |value: &T| -> Result<bool, String> {
            predicate(value).map_err(|e| e.to_string())
        });
        Self {
            predicate,
            reason,
            meta: None,
        }
    }

    /// Rule-specific metadata, merged over the shared metadata.
    pub fn with_meta(mut self, meta: M) -> Self {
        self.meta = Some(meta);
        self
    }

    /// The reason reported on failure.
    pub fn reason(&self) -> &R {
        &self.reason
    }

    /// Evaluate the predicate, converting panics and errors into faults.
    pub fn evaluate(&self, value: &T) -> Result<bool, RuleFault> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.predicate)(value))) {
            Ok(Ok(passed)) => Ok(passed),
            Ok(Err(message)) => Err(RuleFault::Error(message)),
            Err(payload) => Err(RuleFault::Panic(extract_panic_message(&payload))),
        }
    }
}

impl<T: ?Sized, R: Clone, M: Clone> Clone for Rule<T, R, M> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
            reason: self.reason.clone(),
            meta: self.meta.clone(),
        }
    }
}

impl<T: ?Sized, R: fmt::Debug, M: fmt::Debug> fmt::Debug for Rule<T, R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("reason", &self.reason)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// Build a validator from an ordered list of rules.
///
/// Every rule is evaluated, in order, and each one that returns `false`
/// or faults contributes one failure. Each failure's metadata is
/// `shared_meta` merged with the rule's own metadata.
pub fn from_rules<T, R, M>(rules: Vec<Rule<T, R, M>>, shared_meta: M) -> Validator<T, R, M>
where
    T: ?Sized + 'static,
    R: Clone + fmt::Debug + Send + Sync + 'static,
    M: FailureMeta,
{
    let rules: Vec<(Rule<T, R, M>, M)> = rules
        .into_iter()
        .map(|rule| {
            let meta = match &rule.meta {
                Some(own) => shared_meta.merged(own),
                None => shared_meta.clone(),
            };
            (rule, meta)
        })
        .collect();

    Validator::new(move |value: &T| {
        let failures: Vec<_> = rules
            .iter()
            .filter_map(|(rule, meta)| match rule.evaluate(value) {
                Ok(true) => None,
                Ok(false) => Some(ValidationFailure::new(rule.reason.clone(), meta.clone())),
                Err(fault) => {
                    log::warn!("Validation rule {:?} faulted: {}", rule.reason, fault);
                    Some(ValidationFailure::faulted(
                        rule.reason.clone(),
                        fault,
                        meta.clone(),
                    ))
                }
            })
            .collect();
        log::trace!("Ran {} rules, {} failed", rules.len(), failures.len());
        failures
    })
}

// =============================================================================
// Built-in rules
// =============================================================================

/// The value must not be blank.
pub fn required<T, M>(reason: impl Into<String>) -> Rule<T, String, M>
where
    T: InputValue + ?Sized + 'static,
{
    Rule::new(|v: &T| !v.is_blank(), reason.into())
}

/// At least `min` characters.
pub fn min_length<T, M>(min: usize, reason: impl Into<String>) -> Rule<T, String, M>
where
    T: InputValue + ?Sized + 'static,
{
    Rule::new(move |v: &T| v.text().chars().count() >= min, reason.into())
}

/// At most `max` characters.
pub fn max_length<T, M>(max: usize, reason: impl Into<String>) -> Rule<T, String, M>
where
    T: InputValue + ?Sized + 'static,
{
    Rule::new(move |v: &T| v.text().chars().count() <= max, reason.into())
}

/// Exactly `len` characters.
pub fn exact_length<T, M>(len: usize, reason: impl Into<String>) -> Rule<T, String, M>
where
    T: InputValue + ?Sized + 'static,
{
    Rule::new(move |v: &T| v.text().chars().count() == len, reason.into())
}

/// Exactly `count` ASCII digits and nothing else.
pub fn digits<T, M>(count: usize, reason: impl Into<String>) -> Rule<T, String, M>
where
    T: InputValue + ?Sized + 'static,
{
    Rule::new(
        move |v: &T| {
            let text = v.text();
            text.len() == count && text.bytes().all(|b| b.is_ascii_digit())
        },
        reason.into(),
    )
}

/// The value must match a regular expression.
pub fn pattern<T, M>(pattern: &str, reason: impl Into<String>) -> Result<Rule<T, String, M>, regex::Error>
where
    T: InputValue + ?Sized + 'static,
{
    let re = Regex::new(pattern)?;
    Ok(Rule::new(move |v: &T| re.is_match(&v.text()), reason.into()))
}

/// A valid email address. Empty values pass; pair with [`required`].
pub fn email<T, M>(reason: impl Into<String>) -> Rule<T, String, M>
where
    T: InputValue + ?Sized + 'static,
{
    Rule::new(
        |v: &T| {
            let text = v.text();
            text.is_empty() || EmailAddress::is_valid(&text)
        },
        reason.into(),
    )
}

/// The value must equal `expected`.
pub fn equals<T, M>(expected: impl Into<String>, reason: impl Into<String>) -> Rule<T, String, M>
where
    T: InputValue + ?Sized + 'static,
{
    let expected = expected.into();
    Rule::new(move |v: &T| v.text() == expected.as_str(), reason.into())
}

/// The value must contain `needle`.
pub fn contains<T, M>(needle: impl Into<String>, reason: impl Into<String>) -> Rule<T, String, M>
where
    T: InputValue + ?Sized + 'static,
{
    let needle = needle.into();
    Rule::new(move |v: &T| v.text().contains(needle.as_str()), reason.into())
}

/// The value must be one of `options`.
pub fn one_of<T, M, I, S>(options: I, reason: impl Into<String>) -> Rule<T, String, M>
where
    T: InputValue + ?Sized + 'static,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let options: Vec<String> = options.into_iter().map(Into::into).collect();
    Rule::new(
        move |v: &T| {
            let text = v.text();
            options.iter().any(|option| option.as_str() == text)
        },
        reason.into(),
    )
}

/// A boolean field must be `true`.
pub fn checked<M>(reason: impl Into<String>) -> Rule<FieldValue, String, M> {
    Rule::new(|v: &FieldValue| v.as_bool() == Some(true), reason.into())
}

/// A numeric field must lie in `min..=max`. Non-numeric values fail.
pub fn between<M>(min: f64, max: f64, reason: impl Into<String>) -> Rule<FieldValue, String, M> {
    Rule::new(
        move |v: &FieldValue| v.as_f64().is_some_and(|n| (min..=max).contains(&n)),
        reason.into(),
    )
}
