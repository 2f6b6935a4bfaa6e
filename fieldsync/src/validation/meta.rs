//! Metadata attached to validation failures.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Metadata operations the combinators rely on.
///
/// Implement this for a custom meta type to use it with
/// [`combine_validators`](super::combine_validators) and forms.
pub trait FailureMeta: Clone + Default + PartialEq + Send + Sync + 'static {
    /// The record key that produced the failure, if known.
    fn field(&self) -> Option<&str>;

    /// Attach a record key unless one is already set.
    fn stamp_field(self, field: &str) -> Self;

    /// Merge `overrides` on top of `self`; values set in `overrides` win.
    fn merged(&self, overrides: &Self) -> Self;
}

/// Default failure metadata.
///
/// # Example
///
/// ```
/// use fieldsync::validation::Meta;
///
/// let meta = Meta::new().with_label("Zip code").with_extra("hint", "5 digits");
/// assert_eq!(meta.label.as_deref(), Some("Zip code"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Record key that produced the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Correlation id for live-validation UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Free-form extra data.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Meta {
    /// Empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record key.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set a specific correlation id.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Assign a fresh random correlation id.
    pub fn correlated(self) -> Self {
        self.with_id(Uuid::new_v4())
    }

    /// Add a free-form entry.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl FailureMeta for Meta {
    fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    fn stamp_field(mut self, field: &str) -> Self {
        if self.field.is_none() {
            self.field = Some(field.to_string());
        }
        self
    }

    fn merged(&self, overrides: &Self) -> Self {
        let mut extra = self.extra.clone();
        extra.extend(overrides.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            field: overrides.field.clone().or_else(|| self.field.clone()),
            label: overrides.label.clone().or_else(|| self.label.clone()),
            id: overrides.id.or(self.id),
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_keeps_existing_field() {
        let meta = Meta::new().with_field("confirm").stamp_field("password");
        assert_eq!(meta.field(), Some("confirm"));

        let meta = Meta::new().stamp_field("password");
        assert_eq!(meta.field(), Some("password"));
    }

    #[test]
    fn merge_prefers_overrides() {
        let shared = Meta::new()
            .with_label("Zip")
            .with_extra("a", "1")
            .with_extra("b", "1");
        let rule = Meta::new().with_extra("b", "2");

        let merged = shared.merged(&rule);
        assert_eq!(merged.label.as_deref(), Some("Zip"));
        assert_eq!(merged.extra.get("a").map(String::as_str), Some("1"));
        assert_eq!(merged.extra.get("b").map(String::as_str), Some("2"));
    }
}
