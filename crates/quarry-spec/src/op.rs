//! Comparison operators for filter clauses.

use std::cmp::Ordering;
use std::fmt;

/// Comparison operator of a [`Clause`](crate::Clause).
///
/// | Kind | Operators |
/// |------|-----------|
/// | any | `Eq`, `Ne` |
/// | string | `StartsWith`, `EndsWith`, `Contains`, `Like`, `Regex` |
/// | number, timestamp | `Gt`, `Gte`, `Lt`, `Lte`, `Before`, `After` |
/// | enum | `In` |
/// | bool | `Is` |
///
/// An operator applied to a value kind it does not support never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Ne,
    StartsWith,
    EndsWith,
    Contains,
    /// SQL `LIKE` pattern, case-insensitive.
    Like,
    Regex,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Alias for `Lt`.
    Before,
    /// Alias for `Gt`.
    After,
    In,
    /// Alias for `Eq`.
    Is,
}

impl Op {
    /// Maps aliases onto their canonical operator.
    pub fn normalize(self) -> Op {
        match self {
            Op::Before => Op::Lt,
            Op::After => Op::Gt,
            Op::Is => Op::Eq,
            other => other,
        }
    }

    /// Whether the operator is decided by an [`Ordering`] alone.
    pub fn is_comparison(self) -> bool {
        matches!(
            self.normalize(),
            Op::Eq | Op::Ne | Op::Gt | Op::Gte | Op::Lt | Op::Lte
        )
    }

    /// Evaluates the operator given `field.cmp(operand)`.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self.normalize() {
            Op::Eq => ordering.is_eq(),
            Op::Ne => ordering.is_ne(),
            Op::Gt => ordering.is_gt(),
            Op::Gte => ordering.is_ge(),
            Op::Lt => ordering.is_lt(),
            Op::Lte => ordering.is_le(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Ne => "ne",
            Op::StartsWith => "startswith",
            Op::EndsWith => "endswith",
            Op::Contains => "contains",
            Op::Like => "like",
            Op::Regex => "regex",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Before => "before",
            Op::After => "after",
            Op::In => "in",
            Op::Is => "is",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_normalize() {
        assert_eq!(Op::Before.normalize(), Op::Lt);
        assert_eq!(Op::After.normalize(), Op::Gt);
        assert_eq!(Op::Is.normalize(), Op::Eq);
        assert_eq!(Op::Like.normalize(), Op::Like);
    }

    #[test]
    fn ordering_evaluation() {
        assert!(Op::Gte.eval_ordering(Ordering::Equal));
        assert!(Op::Gte.eval_ordering(Ordering::Greater));
        assert!(!Op::Gt.eval_ordering(Ordering::Equal));
        assert!(Op::Before.eval_ordering(Ordering::Less));
        assert!(Op::Ne.eval_ordering(Ordering::Less));
        assert!(!Op::Contains.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn comparison_kinds() {
        assert!(Op::After.is_comparison());
        assert!(Op::Is.is_comparison());
        assert!(!Op::Like.is_comparison());
        assert!(!Op::In.is_comparison());
    }

    #[test]
    fn display() {
        assert_eq!(Op::StartsWith.to_string(), "startswith");
        assert_eq!(Op::Like.to_string(), "like");
    }
}
