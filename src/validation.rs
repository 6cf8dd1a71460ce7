//! Field-level validation for persisted records.
//!
//! Every record is checked against its full schema when it is created and
//! every time it is read back from the store. Partial update inputs are
//! checked field by field, only for the fields they actually carry.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::Record;

/// A single rule violation on a named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// One or more rule violations, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    /// Whether any issue was reported against `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.issues.iter().map(|i| i.message.as_str()).collect();
        write!(f, "{}", messages.join(", "))
    }
}

impl std::error::Error for ValidationError {}

/// Types that can check themselves against their schema.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Collects issues while a record is being checked.
#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<FieldIssue>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn non_empty(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, message);
        }
        self
    }

    pub fn min(&mut self, field: &str, value: i64, min: i64, message: &str) -> &mut Self {
        if value < min {
            self.push(field, message);
        }
        self
    }

    pub fn max(&mut self, field: &str, value: i64, max: i64, message: &str) -> &mut Self {
        if value > max {
            self.push(field, message);
        }
        self
    }

    /// Run a check only when the optional field is present.
    pub fn optional<T>(&mut self, value: Option<&T>, check: impl FnOnce(&mut Self, &T)) -> &mut Self {
        if let Some(value) = value {
            check(self, value);
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                issues: std::mem::take(&mut self.issues),
            })
        }
    }
}

/// Decode an untrusted document body into a validated record.
///
/// Both malformed JSON shapes and rule violations come back as a
/// [`ValidationError`]; the store is never trusted to hold valid data.
pub fn decode<T>(id: &str, data: serde_json::Value) -> Result<Record<T>, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_value(data).map_err(|e| {
        ValidationError::single("document", format!("Document {} is malformed: {}", id, e))
    })?;
    value.validate()?;
    Ok(Record {
        id: id.to_string(),
        data: value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_issue_before_failing() {
        let err = Validator::new()
            .non_empty("name", " ", "Name is required")
            .min("xp", -1, 0, "XP cannot be negative")
            .max("hullIntegrity", 150, 100, "Hull integrity cannot be more than 100")
            .finish()
            .unwrap_err();

        assert_eq!(err.issues.len(), 3);
        assert!(err.has_field("hullIntegrity"));
        assert_eq!(
            err.to_string(),
            "Name is required, XP cannot be negative, Hull integrity cannot be more than 100"
        );
    }

    #[test]
    fn optional_checks_skip_absent_fields() {
        let absent: Option<&i64> = None;
        assert!(Validator::new()
            .optional(absent, |v, x| {
                v.min("credits", *x, 0, "Credits cannot be negative");
            })
            .finish()
            .is_ok());
    }
}
