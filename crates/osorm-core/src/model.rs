//! Document model capability.
//!
//! A [`Document`] names the index it lives in and declares its fields as an
//! ordered [`FieldSet`]. Query builders receive the field set explicitly and
//! validate every clause against it; fetch paths use it as the default
//! `_source` projection.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CoreResult;

/// Ordered, duplicate-free set of declared field names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<String>,
}

impl FieldSet {
    /// Build a field set, keeping the first occurrence of each name.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for field in fields {
            set.insert(field);
        }
        set
    }

    /// Append a field name unless it is already declared.
    pub fn insert(&mut self, field: impl Into<String>) -> bool {
        let field = field.into();
        if self.contains(&field) {
            return false;
        }
        self.fields.push(field);
        true
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Field names in declaration order.
    pub fn to_vec(&self) -> Vec<String> {
        self.fields.clone()
    }
}

impl<S: Into<String>> FromIterator<S> for FieldSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// A typed record stored in one search index.
///
/// `parse` defaults to serde deserialization of the hit's `_source`; a
/// mismatch surfaces as [`CoreError::Shape`](crate::CoreError::Shape).
pub trait Document: DeserializeOwned + Send + 'static {
    /// Name of the index holding documents of this type.
    const INDEX: &'static str;

    /// Declared fields, also the default `_source` projection.
    fn default_fields() -> FieldSet;

    fn parse(raw: Value) -> CoreResult<Self> {
        Ok(serde_json::from_value(raw)?)
    }
}
