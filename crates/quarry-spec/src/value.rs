//! Runtime values read from and written to records.
//!
//! [`Value`] borrows from a record and is what filters, searches and
//! orderings compare against. [`FieldValue`] owns its data and is what
//! update assignments write back.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, SpecError};

/// Field value borrowed from a record.
///
/// ```
/// use quarry_spec::{Number, Value};
///
/// struct Package {
///     name: String,
///     version: u32,
/// }
///
/// fn accessor<'a>(pkg: &'a Package, field: &str) -> Value<'a> {
///     match field {
///         "name" => Value::String(&pkg.name),
///         "version" => Value::Number(Number::from(pkg.version)),
///         _ => Value::None,
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    String(&'a str),
    Number(Number),
    /// Milliseconds since the Unix epoch.
    Timestamp(Timestamp),
    /// Enum discriminant.
    Enum(u32),
    Bool(bool),
    /// Field absent, null, or not exposed.
    None,
}

impl<'a> Value<'a> {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Timestamp(_) => "timestamp",
            Value::Enum(_) => "enum",
            Value::Bool(_) => "bool",
            Value::None => "none",
        }
    }

    /// Copies this value into an owned [`FieldValue`].
    pub fn to_owned_value(&self) -> FieldValue {
        match self {
            Value::String(s) => FieldValue::String((*s).to_string()),
            Value::Number(n) => FieldValue::Number(*n),
            Value::Timestamp(t) => FieldValue::Timestamp(*t),
            Value::Enum(d) => FieldValue::Enum(*d),
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::None => FieldValue::Null,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Timestamp(t) => write!(f, "@{}", t.as_millis()),
            Value::Enum(d) => write!(f, "#{d}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::None => f.write_str("null"),
        }
    }
}

/// Numeric value that keeps the precision of its source type.
///
/// Mixed comparisons (signed against unsigned, integer against float)
/// fall back to `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers. Returns `None` when either side is NaN.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::I64(a), Number::U64(b)) => Some(compare_signed_unsigned(a, b)),
            (Number::U64(a), Number::I64(b)) => Some(compare_signed_unsigned(b, a).reverse()),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

fn compare_signed_unsigned(signed: i64, unsigned: u64) -> Ordering {
    match u64::try_from(signed) {
        Ok(s) => s.cmp(&unsigned),
        Err(_) => Ordering::Less,
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{n}"),
            Number::U64(n) => write!(f, "{n}"),
            Number::F64(n) => write!(f, "{n}"),
        }
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Number {
                fn from(n: $source) -> Self {
                    Number::$variant(n as $target)
                }
            }
        )+
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

/// Conversion from a [`Number`] back into a concrete numeric field type.
///
/// Integer conversions fail when the value is out of range or has a
/// fractional part.
pub trait FromNumber: Sized {
    fn from_number(n: Number) -> Option<Self>;
}

macro_rules! from_number_int {
    ($($target:ty),+) => {
        $(
            impl FromNumber for $target {
                fn from_number(n: Number) -> Option<Self> {
                    match n {
                        Number::I64(v) => <$target>::try_from(v).ok(),
                        Number::U64(v) => <$target>::try_from(v).ok(),
                        Number::F64(v) if v.fract() == 0.0 && v.is_finite() => {
                            <$target>::try_from(v as i128).ok()
                        }
                        Number::F64(_) => None,
                    }
                }
            }
        )+
    };
}

from_number_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromNumber for f64 {
    fn from_number(n: Number) -> Option<Self> {
        Some(n.to_f64())
    }
}

impl FromNumber for f32 {
    fn from_number(n: Number) -> Option<Self> {
        Some(n.to_f64() as f32)
    }
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Saturates at the ends of the millisecond range.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1000))
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }
}

/// Owned value written by update assignments.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Number(Number),
    Timestamp(Timestamp),
    Enum(u32),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// Borrows this value as a [`Value`].
    pub fn as_value(&self) -> Value<'_> {
        match self {
            FieldValue::String(s) => Value::String(s),
            FieldValue::Number(n) => Value::Number(*n),
            FieldValue::Timestamp(t) => Value::Timestamp(*t),
            FieldValue::Enum(d) => Value::Enum(*d),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Null => Value::None,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.as_value().kind()
    }

    /// Extracts a string for `field`, or fails with a type mismatch.
    pub fn into_string(self, field: &str) -> Result<String> {
        match self {
            FieldValue::String(s) => Ok(s),
            other => Err(SpecError::type_mismatch(field, "string", other.kind())),
        }
    }

    /// Extracts a number for `field` converted to the field's numeric type.
    pub fn into_number<N: FromNumber>(self, field: &str) -> Result<N> {
        match self {
            FieldValue::Number(n) => N::from_number(n)
                .ok_or_else(|| SpecError::type_mismatch(field, "number in range", "number")),
            other => Err(SpecError::type_mismatch(field, "number", other.kind())),
        }
    }

    pub fn into_timestamp(self, field: &str) -> Result<Timestamp> {
        match self {
            FieldValue::Timestamp(t) => Ok(t),
            other => Err(SpecError::type_mismatch(field, "timestamp", other.kind())),
        }
    }

    pub fn into_enum(self, field: &str) -> Result<u32> {
        match self {
            FieldValue::Enum(d) => Ok(d),
            other => Err(SpecError::type_mismatch(field, "enum", other.kind())),
        }
    }

    pub fn into_bool(self, field: &str) -> Result<bool> {
        match self {
            FieldValue::Bool(b) => Ok(b),
            other => Err(SpecError::type_mismatch(field, "bool", other.kind())),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_value().fmt(f)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(t: Timestamp) -> Self {
        FieldValue::Timestamp(t)
    }
}

impl<N: Into<Number>> From<Option<N>> for FieldValue {
    fn from(n: Option<N>) -> Self {
        n.map_or(FieldValue::Null, |n| FieldValue::Number(n.into()))
    }
}

macro_rules! field_value_from_number {
    ($($source:ty),+) => {
        $(
            impl From<$source> for FieldValue {
                fn from(n: $source) -> Self {
                    FieldValue::Number(Number::from(n))
                }
            }
        )+
    };
}

field_value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_from_secs_saturates() {
        assert_eq!(Timestamp::from_secs(2).as_millis(), 2000);
        assert_eq!(Timestamp::from_secs(i64::MAX), Timestamp(i64::MAX));
        assert_eq!(Timestamp::from_secs(i64::MIN), Timestamp(i64::MIN));
    }

    #[test]
    fn mixed_sign_comparison_does_not_lose_precision() {
        let big = Number::U64(u64::MAX);
        let small = Number::I64(-1);
        assert_eq!(small.compare(big), Some(Ordering::Less));
        assert_eq!(big.compare(small), Some(Ordering::Greater));
        assert_eq!(Number::I64(7).compare(Number::U64(7)), Some(Ordering::Equal));
    }

    #[test]
    fn nan_is_incomparable() {
        assert_eq!(Number::F64(f64::NAN).compare(Number::I64(1)), None);
    }

    #[test]
    fn from_number_respects_range() {
        assert_eq!(u8::from_number(Number::I64(200)), Some(200));
        assert_eq!(u8::from_number(Number::I64(300)), None);
        assert_eq!(u8::from_number(Number::I64(-1)), None);
        assert_eq!(i32::from_number(Number::F64(3.0)), Some(3));
        assert_eq!(i32::from_number(Number::F64(3.5)), None);
    }

    #[test]
    fn field_value_extractors_report_mismatch() {
        let err = FieldValue::Bool(true).into_string("name").unwrap_err();
        assert!(matches!(
            err,
            SpecError::TypeMismatch {
                expected: "string",
                actual: "bool",
                ..
            }
        ));
        assert_eq!(
            FieldValue::from(3u8).into_number::<u32>("version").unwrap(),
            3
        );
    }

    #[test]
    fn value_round_trips_to_owned() {
        let owned = Value::String("abc").to_owned_value();
        assert_eq!(owned, FieldValue::String("abc".into()));
        assert_eq!(owned.as_value(), Value::String("abc"));
        assert_eq!(Value::None.to_owned_value(), FieldValue::Null);
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::String("a").to_string(), "\"a\"");
        assert_eq!(FieldValue::from(5i32).to_string(), "5");
        assert_eq!(FieldValue::Null.to_string(), "null");
    }
}
