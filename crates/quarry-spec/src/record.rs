//! Field access protocol between specifications and entity types.
//!
//! Specifications never touch entity structs directly. Filters, searches
//! and orderings read fields by name through [`Record::field_value`], and
//! update assignments write them back through [`Record::set_field`]. The
//! `#[derive(Record)]` macro from `quarry-macros` generates both.

use crate::error::{Result, SpecError};
use crate::value::{FieldValue, Timestamp, Value};

/// A type whose fields can be read and written by name.
///
/// # Manual Implementation
///
/// ```
/// use quarry_spec::{FieldValue, Number, Record, Result, SpecError, Value};
///
/// struct Package {
///     name: String,
///     version: u32,
/// }
///
/// impl Record for Package {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "name" => Value::String(&self.name),
///             "version" => Value::Number(Number::from(self.version)),
///             _ => Value::None,
///         }
///     }
///
///     fn set_field(&mut self, field: &str, value: FieldValue) -> Result<()> {
///         match field {
///             "name" => self.name = value.into_string(field)?,
///             "version" => self.version = value.into_number(field)?,
///             _ => return Err(SpecError::unknown_field(field)),
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Record {
    /// Returns the named field, or [`Value::None`] when the field is not
    /// exposed.
    fn field_value(&self, field: &str) -> Value<'_>;

    /// Writes the named field.
    ///
    /// The default implementation exposes no writable fields.
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<()> {
        let _ = value;
        Err(SpecError::unknown_field(field))
    }

    /// Function-pointer form of [`field_value`](Record::field_value).
    fn accessor<'a>(item: &'a Self, field: &str) -> Value<'a>
    where
        Self: Sized,
    {
        item.field_value(field)
    }
}

/// Enum types stored as stable discriminants.
///
/// Used by `#[record(Enum)]` fields. Pick explicit discriminants instead of
/// relying on declaration order.
pub trait RecordEnum: Sized {
    fn discriminant(&self) -> u32;

    fn from_discriminant(discriminant: u32) -> Option<Self>;
}

/// Date/time types stored as [`Timestamp`]s.
///
/// Used by `#[record(Timestamp)]` fields.
pub trait RecordTimestamp: Sized {
    fn to_timestamp(&self) -> Timestamp;

    fn from_timestamp(ts: Timestamp) -> Self;
}

impl RecordTimestamp for i64 {
    fn to_timestamp(&self) -> Timestamp {
        Timestamp::from_millis(*self)
    }

    fn from_timestamp(ts: Timestamp) -> Self {
        ts.as_millis()
    }
}

impl RecordTimestamp for Timestamp {
    fn to_timestamp(&self) -> Timestamp {
        *self
    }

    fn from_timestamp(ts: Timestamp) -> Self {
        ts
    }
}

/// Reads an enum field back from an assignment value.
pub fn enum_from_value<E: RecordEnum>(field: &str, value: FieldValue) -> Result<E> {
    let discriminant = value.into_enum(field)?;
    E::from_discriminant(discriminant)
        .ok_or_else(|| SpecError::type_mismatch(field, "known discriminant", "enum"))
}
