//! Dynamic field values and the form record.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

/// A dynamic value reported by any field type.
///
/// Every field funnels its value into the owning form as a `FieldValue`,
/// so the form has one update path regardless of the field's widget.
///
/// # Type Mapping
///
/// | Field kind | Variant |
/// |------------|---------|
/// | unset / undefined | `Null` |
/// | checkbox, toggle | `Bool` |
/// | numeric input | `Number` |
/// | text, select | `Text` |
/// | multi-select | `List` |
///
/// # Example
///
/// ```
/// use fieldsync::FieldValue;
///
/// let name = FieldValue::from("Ada");
/// let agreed = FieldValue::from(true);
/// let empty = FieldValue::Null;
/// assert!(empty.is_null());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
    /// Multiple selected values.
    List(Vec<String>),
}

impl FieldValue {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns the text, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the flag, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number, if this is a numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "text",
            FieldValue::List(_) => "list",
        }
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Number(f64::from(v))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::List(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

// =============================================================================
// InputValue
// =============================================================================

/// Text view of a value, used by the built-in rules.
///
/// Conversions here are for *inspection* only; the stored value is
/// never rewritten.
pub trait InputValue {
    /// The value as text.
    fn text(&self) -> Cow<'_, str>;

    /// Whether the value counts as "not filled in".
    fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }
}

impl InputValue for str {
    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl InputValue for String {
    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl InputValue for FieldValue {
    fn text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Null => Cow::Borrowed(""),
            FieldValue::Bool(true) => Cow::Borrowed("true"),
            FieldValue::Bool(false) => Cow::Borrowed("false"),
            FieldValue::Number(n) => Cow::Owned(n.to_string()),
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            FieldValue::List(items) => Cow::Owned(items.join(",")),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Bool(b) => !b,
            FieldValue::Number(_) => false,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }
}

// =============================================================================
// FormValue
// =============================================================================

/// A field value type that can be reported into a [`FormData`] record.
///
/// `from_field_value` is strict: it returns `None` instead of coercing
/// between kinds.
pub trait FormValue: Clone + Send + Sync + 'static {
    /// Convert into the form's dynamic representation.
    fn to_field_value(&self) -> FieldValue;

    /// Convert back from the form's dynamic representation.
    fn from_field_value(value: FieldValue) -> Option<Self>;
}

impl FormValue for FieldValue {
    fn to_field_value(&self) -> FieldValue {
        self.clone()
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        Some(value)
    }
}

impl FormValue for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(s) => Some(s),
            FieldValue::Null => Some(String::new()),
            _ => None,
        }
    }
}

impl FormValue for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FormValue for f64 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Number(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        value.as_f64()
    }
}

impl FormValue for Vec<String> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::List(self.clone())
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

// =============================================================================
// FormData
// =============================================================================

/// The committed record of a form: field name to value.
///
/// Keys are unique and keep insertion order, which is the field
/// declaration order when the form declares its fields up front.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData {
    values: IndexMap<String, FieldValue>,
}

impl FormData {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record with every named field present and `Null`.
    pub fn with_fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: names
                .into_iter()
                .map(|name| (name.into(), FieldValue::Null))
                .collect(),
        }
    }

    /// Returns the value of a field, if present.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Sets a field value, keeping the field's original position.
    ///
    /// Returns the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns `true` if the field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the record and returns the underlying map.
    pub fn into_inner(self) -> IndexMap<String, FieldValue> {
        self.values
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values() {
        assert!(FieldValue::Null.is_blank());
        assert!(FieldValue::from("   ").is_blank());
        assert!(FieldValue::from(false).is_blank());
        assert!(!FieldValue::from(0.0).is_blank());
        assert!(!FieldValue::from("x").is_blank());
    }

    #[test]
    fn form_value_is_strict() {
        assert_eq!(String::from_field_value(FieldValue::from(5)), None);
        assert_eq!(String::from_field_value(FieldValue::Null), Some(String::new()));
        assert_eq!(bool::from_field_value(FieldValue::from(true)), Some(true));
    }

    #[test]
    fn form_data_keeps_declaration_order() {
        let mut data = FormData::with_fields(["b", "a"]);
        data.set("a", "1");
        data.set("c", "2");
        data.set("b", "3");
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn form_data_equality_is_by_value() {
        let a = FormData::new().with("x", "1");
        let b = FormData::new().with("x", "1");
        assert_eq!(a, b);
        assert_ne!(a, b.with("x", "2"));
    }
}
