//! Ordering entries and record comparison.

use std::cmp::Ordering;
use std::fmt;

use crate::record::Record;
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    #[default]
    Asc,
    Desc,
}

impl Dir {
    /// Reverses `ordering` for `Desc`.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an entry was declared with order-by or then-by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKind {
    Primary,
    Then,
}

/// A field and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub dir: Dir,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, dir: Dir) -> Self {
        OrderBy {
            field: field.into(),
            dir,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Dir::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Dir::Desc)
    }

    /// Compares two records on this entry's field.
    ///
    /// Incomparable values (kind mismatch, NaN) tie.
    pub fn compare<T: Record + ?Sized>(&self, a: &T, b: &T) -> Ordering {
        let left = a.field_value(&self.field);
        let right = b.field_value(&self.field);
        compare_values(&left, &right)
            .map(|ordering| self.dir.apply(ordering))
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.dir)
    }
}

/// A declared ordering entry of a specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderExpression {
    pub order: OrderBy,
    pub kind: OrderKind,
}

/// Compares two values of the same kind.
///
/// Missing values compare greater than present ones, so they land last in
/// ascending order. Returns `None` on kind mismatch or NaN.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.compare(*b),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Value::Enum(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::None, Value::None) => Some(Ordering::Equal),
        (Value::None, _) => Some(Ordering::Greater),
        (_, Value::None) => Some(Ordering::Less),
        _ => None,
    }
}

/// Compares two records on a list of keys, earlier keys taking precedence.
pub fn compare_by_keys<T: Record + ?Sized>(a: &T, b: &T, keys: &[OrderBy]) -> Ordering {
    keys.iter()
        .map(|key| key.compare(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Number;

    struct Row {
        name: &'static str,
        version: Option<i64>,
    }

    impl Record for Row {
        fn field_value(&self, field: &str) -> Value<'_> {
            match field {
                "name" => Value::String(self.name),
                "version" => self
                    .version
                    .map_or(Value::None, |v| Value::Number(Number::I64(v))),
                _ => Value::None,
            }
        }
    }

    #[test]
    fn direction_applies() {
        assert_eq!(Dir::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Dir::Asc.apply(Ordering::Less), Ordering::Less);
    }

    #[test]
    fn none_sorts_last() {
        assert_eq!(
            compare_values(&Value::None, &Value::Bool(true)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values(&Value::String("a"), &Value::Bool(true)),
            None
        );
    }

    #[test]
    fn keys_break_ties_in_order() {
        let a = Row {
            name: "a",
            version: Some(2),
        };
        let b = Row {
            name: "a",
            version: Some(5),
        };
        let keys = [OrderBy::asc("name"), OrderBy::desc("version")];
        assert_eq!(compare_by_keys(&a, &b, &keys), Ordering::Greater);
        assert_eq!(compare_by_keys(&a, &b, &keys[..1]), Ordering::Equal);
    }

    #[test]
    fn display() {
        assert_eq!(OrderBy::desc("version").to_string(), "version desc");
    }
}
