//! In-place field assignments for update specifications.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::record::Record;
use crate::value::FieldValue;

/// Right-hand side of an assignment.
pub enum AssignedValue<T> {
    /// A constant.
    Value(FieldValue),
    /// Computed from the record before any assignment of the same batch
    /// is written.
    Computed(Arc<dyn Fn(&T) -> FieldValue + Send + Sync>),
}

impl<T> Clone for AssignedValue<T> {
    fn clone(&self) -> Self {
        match self {
            AssignedValue::Value(v) => AssignedValue::Value(v.clone()),
            AssignedValue::Computed(f) => AssignedValue::Computed(Arc::clone(f)),
        }
    }
}

/// `field = value`.
///
/// ```
/// use quarry_spec::Assignment;
///
/// let rename = Assignment::<()>::set("name", "renamed");
/// assert_eq!(rename.field(), "name");
/// assert_eq!(rename.to_string(), "name = \"renamed\"");
/// ```
pub struct Assignment<T> {
    field: String,
    value: AssignedValue<T>,
}

impl<T> Assignment<T> {
    pub fn set(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            value: AssignedValue::Value(value.into()),
        }
    }

    pub fn compute<F>(field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        Self {
            field: field.into(),
            value: AssignedValue::Computed(Arc::new(f)),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &AssignedValue<T> {
        &self.value
    }

    /// Resolves the right-hand side against `record`.
    pub fn resolve(&self, record: &T) -> FieldValue {
        match &self.value {
            AssignedValue::Value(v) => v.clone(),
            AssignedValue::Computed(f) => f(record),
        }
    }
}

impl<T: Record> Assignment<T> {
    pub fn apply(&self, record: &mut T) -> Result<()> {
        let value = self.resolve(record);
        record.set_field(&self.field, value)
    }
}

/// Applies a batch of assignments to one record.
///
/// Every right-hand side is resolved against the record as it was before
/// the batch, then written in declaration order to a copy. The record is
/// replaced only when every write succeeded.
pub fn apply_all<T: Record + Clone>(assignments: &[Assignment<T>], record: &mut T) -> Result<()> {
    *record = applied(assignments, record)?;
    Ok(())
}

/// The record after the batch, leaving `record` untouched.
pub(crate) fn applied<T: Record + Clone>(assignments: &[Assignment<T>], record: &T) -> Result<T> {
    let resolved: Vec<(&str, FieldValue)> = assignments
        .iter()
        .map(|a| (a.field.as_str(), a.resolve(record)))
        .collect();
    let mut copy = record.clone();
    for (field, value) in resolved {
        copy.set_field(field, value)?;
    }
    Ok(copy)
}

impl<T> Clone for Assignment<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T> fmt::Debug for Assignment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assignment")
            .field("field", &self.field)
            .field("value", &self.to_string())
            .finish()
    }
}

impl<T> fmt::Display for Assignment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            AssignedValue::Value(v) => write!(f, "{} = {}", self.field, v),
            AssignedValue::Computed(_) => write!(f, "{} = <computed>", self.field),
        }
    }
}
