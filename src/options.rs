//! Keyword arguments for model calls.

use serde_json::{Map, Value};

/// Optional keyword arguments accepted by `execute_kw`.
///
/// Unset, zero and empty values are left out of [`Options::kwargs`] so the
/// server applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
  pub limit: u32,
  pub offset: u32,
  pub fields: Vec<String>,
  pub order: String,
  pub context: Map<String, Value>,
}

impl Options {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_limit(mut self, limit: u32) -> Self {
    self.limit = limit;
    self
  }

  pub fn set_offset(mut self, offset: u32) -> Self {
    self.offset = offset;
    self
  }

  pub fn set_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
    self.fields = fields.into_iter().map(Into::into).collect();
    self
  }

  /// Sort specification, e.g. `"name asc, id desc"`
  pub fn set_order(mut self, order: impl Into<String>) -> Self {
    self.order = order.into();
    self
  }

  pub fn set_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.context.insert(key.into(), value.into());
    self
  }

  pub fn kwargs(&self) -> Map<String, Value> {
    let mut kwargs = Map::new();
    if self.limit > 0 {
      kwargs.insert("limit".to_string(), Value::from(self.limit));
    }
    if self.offset > 0 {
      kwargs.insert("offset".to_string(), Value::from(self.offset));
    }
    if !self.fields.is_empty() {
      kwargs.insert("fields".to_string(), Value::from(self.fields.clone()));
    }
    if !self.order.is_empty() {
      kwargs.insert("order".to_string(), Value::from(self.order.clone()));
    }
    if !self.context.is_empty() {
      kwargs.insert("context".to_string(), Value::Object(self.context.clone()));
    }
    kwargs
  }
}
