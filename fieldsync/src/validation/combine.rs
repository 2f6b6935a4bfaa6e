//! Record-level validation built from per-key validators.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::failure::ValidationFailure;
use super::meta::{FailureMeta, Meta};
use super::validator::{Validator, compose_validators};
use crate::error::FormError;
use crate::value::{FieldValue, FormData};

/// A flat record whose values can be looked up by key.
///
/// Absent keys are validated as `Value::default()`, the record's notion
/// of "undefined".
pub trait Record {
    /// The value type stored under each key.
    type Value: Default;

    /// The value stored under `key`, if present.
    fn get(&self, key: &str) -> Option<&Self::Value>;
}

impl Record for FormData {
    type Value = FieldValue;

    fn get(&self, key: &str) -> Option<&FieldValue> {
        FormData::get(self, key)
    }
}

impl<V: Default> Record for IndexMap<String, V> {
    type Value = V;

    fn get(&self, key: &str) -> Option<&V> {
        IndexMap::get(self, key)
    }
}

impl<V: Default> Record for HashMap<String, V> {
    type Value = V;

    fn get(&self, key: &str) -> Option<&V> {
        HashMap::get(self, key)
    }
}

impl<V: Default> Record for BTreeMap<String, V> {
    type Value = V;

    fn get(&self, key: &str) -> Option<&V> {
        BTreeMap::get(self, key)
    }
}

/// Type alias for the per-key validator map.
pub type FieldValidators<Rec, R, M> = IndexMap<String, Validator<<Rec as Record>::Value, R, M>>;

/// A record validator that still exposes its per-key pieces.
///
/// Composing the record validator with a cross-field check (see
/// [`with_cross_field`](Self::with_cross_field)) yields a plain
/// [`Validator`]; keep this value around to reach single fields.
pub struct CombinedValidator<Rec: Record, R = String, M = Meta> {
    fields: Arc<FieldValidators<Rec, R, M>>,
    validator: Validator<Rec, R, M>,
}

impl<Rec, R, M> CombinedValidator<Rec, R, M>
where
    Rec: Record + 'static,
    Rec::Value: 'static,
    R: 'static,
    M: FailureMeta,
{
    /// Validate a whole record.
    pub fn validate(&self, record: &Rec) -> Vec<ValidationFailure<R, M>> {
        self.validator.validate(record)
    }

    /// The record validator, for composing.
    pub fn validator(&self) -> Validator<Rec, R, M> {
        self.validator.clone()
    }

    /// Compose the record validator with a cross-field validator.
    ///
    /// Cross-field failures come after the per-key failures.
    pub fn with_cross_field(&self, cross: Validator<Rec, R, M>) -> Validator<Rec, R, M> {
        compose_validators([self.validator(), cross])
    }

    /// The per-key validators, in declaration order.
    pub fn fields(&self) -> &FieldValidators<Rec, R, M> {
        &self.fields
    }

    /// The validator for a single key.
    pub fn field(&self, key: &str) -> Option<&Validator<Rec::Value, R, M>> {
        self.fields.get(key)
    }

    /// Run one key's validator on a standalone value.
    ///
    /// Failures are stamped with the key the same way the record
    /// validator stamps them. Returns `None` for unknown keys.
    pub fn validate_field(&self, key: &str, value: &Rec::Value) -> Option<Vec<ValidationFailure<R, M>>> {
        self.fields
            .get(key)
            .map(|validator| stamp(key, validator.validate(value)))
    }

    /// The keys, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Check that the keys equal `declared` as a set.
    pub fn ensure_keys<S: AsRef<str>>(&self, declared: &[S]) -> Result<(), FormError> {
        let missing: Vec<String> = declared
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.fields.contains_key(*name))
            .map(str::to_string)
            .collect();
        let unexpected: Vec<String> = self
            .keys()
            .filter(|key| !declared.iter().any(|name| name.as_ref() == *key))
            .map(str::to_string)
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(FormError::KeySetMismatch {
                missing,
                unexpected,
            })
        }
    }
}

impl<Rec: Record, R, M> Clone for CombinedValidator<Rec, R, M> {
    fn clone(&self) -> Self {
        Self {
            fields: Arc::clone(&self.fields),
            validator: self.validator.clone(),
        }
    }
}

impl<Rec: Record, R, M> fmt::Debug for CombinedValidator<Rec, R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedValidator")
            .field("keys", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn stamp<R, M: FailureMeta>(key: &str, failures: Vec<ValidationFailure<R, M>>) -> Vec<ValidationFailure<R, M>> {
    failures
        .into_iter()
        .map(|failure| ValidationFailure {
            meta: failure.meta.stamp_field(key),
            ..failure
        })
        .collect()
}

/// Combine per-key validators into a record validator.
///
/// Keys run in the order given. Each failure gets `meta.field = key`
/// unless the key's validator already set a field, in which case the
/// field-level metadata wins. If a key is given twice, the later
/// validator replaces the earlier one.
///
/// # Example
///
/// ```
/// use fieldsync::validation::{combine_validators, from_rules, rules, Meta, Validator};
/// use fieldsync::{FieldValue, FormData};
///
/// let name: Validator<FieldValue> = from_rules(vec![rules::required("Name is required")], Meta::new());
/// let combined = combine_validators::<FormData, _, _, _, _>([("name", name)]);
///
/// let failures = combined.validate(&FormData::new());
/// assert_eq!(failures[0].meta.field.as_deref(), Some("name"));
/// ```
pub fn combine_validators<Rec, R, M, I, K>(validators: I) -> CombinedValidator<Rec, R, M>
where
    Rec: Record + 'static,
    Rec::Value: 'static,
    R: 'static,
    M: FailureMeta,
    I: IntoIterator<Item = (K, Validator<Rec::Value, R, M>)>,
    K: Into<String>,
{
    let mut fields: FieldValidators<Rec, R, M> = IndexMap::new();
    for (key, validator) in validators {
        let key = key.into();
        if fields.insert(key.clone(), validator).is_some() {
            log::warn!("Validator for '{}' given twice, keeping the last one", key);
        }
    }

    let fields = Arc::new(fields);
    let per_key = Arc::clone(&fields);
    let validator = Validator::new(move |record: &Rec| {
        let mut failures = Vec::new();
        for (key, validator) in per_key.iter() {
            let fallback;
            let value = match record.get(key) {
                Some(value) => value,
                None => {
                    fallback = <Rec::Value as Default>::default();
                    &fallback
                }
            };
            failures.extend(stamp(key, validator.validate(value)));
        }
        failures
    });

    CombinedValidator { fields, validator }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Rule, from_rules, rules};

    fn fails_with(reason: &'static str) -> Validator<FieldValue> {
        from_rules(
            vec![Rule::new(|_: &FieldValue| false, reason.to_string())],
            Meta::new(),
        )
    }

    #[test]
    fn only_failing_key_is_reported() {
        let va: Validator<FieldValue> = from_rules(vec![rules::equals("ok", "a bad")], Meta::new());
        let vb: Validator<FieldValue> = from_rules(vec![rules::equals("y", "b bad")], Meta::new());
        let combined = combine_validators::<FormData, _, _, _, _>([("a", va), ("b", vb)]);

        let record = FormData::new().with("a", "x").with("b", "y");
        let failures = combined.validate(&record);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field(), Some("a"));

        let va = combined.field("a").unwrap();
        let vb = combined.field("b").unwrap();
        assert_eq!(va.validate(&FieldValue::from("x")).len(), 1);
        assert!(vb.validate(&FieldValue::from("y")).is_empty());
    }

    #[test]
    fn keys_run_in_declared_order() {
        let combined =
            combine_validators::<FormData, _, _, _, _>([("z", fails_with("z")), ("a", fails_with("a"))]);
        let fields: Vec<_> = combined
            .validate(&FormData::new())
            .into_iter()
            .map(|f| f.meta.field.unwrap_or_default())
            .collect();
        assert_eq!(fields, vec!["z", "a"]);
    }

    #[test]
    fn absent_key_is_validated_as_default() {
        let required: Validator<FieldValue> = from_rules(vec![rules::required("req")], Meta::new());
        let combined = combine_validators::<FormData, _, _, _, _>([("missing", required)]);
        let failures = combined.validate(&FormData::new());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field(), Some("missing"));
    }

    #[test]
    fn field_level_meta_wins() {
        let targeted: Validator<FieldValue> = from_rules(
            vec![Rule::new(|_: &FieldValue| false, "mismatch".to_string())],
            Meta::new().with_field("confirm"),
        );
        let combined = combine_validators::<FormData, _, _, _, _>([("password", targeted)]);
        let failures = combined.validate(&FormData::new());
        assert_eq!(failures[0].field(), Some("confirm"));
    }

    #[test]
    fn validate_field_stamps_key() {
        let combined = combine_validators::<FormData, _, _, _, _>([("a", fails_with("a"))]);
        let failures = combined.validate_field("a", &FieldValue::Null).unwrap();
        assert_eq!(failures[0].field(), Some("a"));
        assert!(combined.validate_field("nope", &FieldValue::Null).is_none());
    }

    #[test]
    fn ensure_keys_reports_differences() {
        let combined =
            combine_validators::<FormData, _, _, _, _>([("a", fails_with("a")), ("b", fails_with("b"))]);
        assert!(combined.ensure_keys(&["b", "a"]).is_ok());
        assert_eq!(
            combined.ensure_keys(&["a", "c"]),
            Err(FormError::KeySetMismatch {
                missing: vec!["c".to_string()],
                unexpected: vec!["b".to_string()],
            })
        );
    }

    #[test]
    fn works_over_plain_maps() {
        let v: Validator<String> = from_rules(vec![rules::required("req")], Meta::new());
        let combined = combine_validators::<HashMap<String, String>, _, _, _, _>([("name", v)]);
        let mut record = HashMap::new();
        assert_eq!(combined.validate(&record).len(), 1);
        record.insert("name".to_string(), "Ada".to_string());
        assert!(combined.validate(&record).is_empty());
    }

    #[test]
    fn cross_field_failures_come_last() {
        let combined = combine_validators::<FormData, _, _, _, _>([("a", fails_with("a"))]);
        let cross: Validator<FormData> = Validator::new(|_: &FormData| {
            vec![ValidationFailure::new("cross".to_string(), Meta::new().with_field("b"))]
        });
        let validator = combined.with_cross_field(cross);
        let reasons: Vec<_> = validator
            .validate(&FormData::new())
            .into_iter()
            .map(|f| f.reason)
            .collect();
        assert_eq!(reasons, vec!["a", "cross"]);
    }
}
