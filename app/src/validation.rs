// app/src/validation.rs

//! Field-level validation helpers shared by request payloads.
//!
//! Errors are collected per field so a client sees every problem with a
//! payload at once, rendered as `{"errors": {"field": ["message", ..]}}`.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::AppError;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_string()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn has(&self, field: &str) -> bool {
    self.0.contains_key(field)
  }

  pub fn messages(&self, field: &str) -> &[String] {
    self.0.get(field).map(Vec::as_slice).unwrap_or_default()
  }

  /// First message of the first failing field (fields are ordered by name).
  pub fn first_message(&self) -> String {
    self
      .0
      .values()
      .flat_map(|messages| messages.iter())
      .next()
      .cloned()
      .unwrap_or_else(|| "The given data was invalid.".to_string())
  }

  /// `Ok(value)` when nothing was recorded, otherwise `AppError::Validation`.
  pub fn finish<T>(self, value: T) -> Result<T, AppError> {
    if self.is_empty() {
      Ok(value)
    } else {
      Err(AppError::Validation(self))
    }
  }
}

/// Trims a string and turns empty results into `None`.
pub fn normalize(value: Option<&str>) -> Option<String> {
  value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Length in characters, not bytes.
pub fn char_len(value: &str) -> usize {
  value.chars().count()
}

/// Minimal structural email check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(value: &str) -> bool {
  let mut parts = value.splitn(2, '@');
  let (Some(local), Some(domain)) = (parts.next(), parts.next()) else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && !value.chars().any(char::is_whitespace)
    && domain.split('.').count() >= 2
    && domain.split('.').all(|label| !label.is_empty())
}
