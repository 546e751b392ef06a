//! Filter predicates.
//!
//! A [`Criterion`] is one entry of a specification's where-list. It is
//! either a structural [`Clause`] (field, operator, operand), which any
//! execution layer can translate, or an opaque [`Predicate`] closure that
//! only in-memory evaluation understands.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::Result;
use crate::op::Op;
use crate::record::Record;
use crate::search::LikePattern;
use crate::value::{Number, Timestamp, Value};

/// Field, operator and operand.
///
/// ```
/// use quarry_spec::{Clause, Op, Value};
///
/// let clause = Clause::new("name", Op::StartsWith, "quarry");
/// assert!(clause.matches(&Value::String("quarry-spec")));
/// assert!(!clause.matches(&Value::None));
/// ```
#[derive(Debug, Clone)]
pub struct Clause {
    pub field: String,
    pub op: Op,
    pub value: ClauseValue,
}

impl Clause {
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<ClauseValue>) -> Self {
        Clause {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// A case-insensitive SQL `LIKE` clause.
    pub fn like(field: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Clause::new(field, Op::Like, LikePattern::new(pattern)?))
    }

    /// A regular expression clause.
    pub fn regex(field: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Clause::new(field, Op::Regex, Regex::new(pattern)?))
    }

    /// Evaluates the clause against one field value.
    ///
    /// Missing fields and mismatched kinds never match, including for `Ne`.
    pub fn matches(&self, field_value: &Value<'_>) -> bool {
        match (&self.value, field_value) {
            (_, Value::None) => false,
            (ClauseValue::String(operand), Value::String(s)) => self.match_str(s, operand),
            (ClauseValue::Like(pattern), Value::String(s)) => {
                self.op == Op::Like && pattern.is_match(s)
            }
            (ClauseValue::Regex(regex), Value::String(s)) => {
                self.op == Op::Regex && regex.is_match(s)
            }
            (ClauseValue::Number(operand), Value::Number(n)) => n
                .compare(*operand)
                .is_some_and(|ordering| self.op.eval_ordering(ordering)),
            (ClauseValue::Timestamp(operand), Value::Timestamp(t)) => {
                self.op.eval_ordering(t.cmp(operand))
            }
            (ClauseValue::Enum(operand), Value::Enum(d)) => {
                matches!(self.op.normalize(), Op::Eq | Op::Ne) && self.op.eval_ordering(d.cmp(operand))
            }
            (ClauseValue::EnumSet(set), Value::Enum(d)) => self.op == Op::In && set.contains(d),
            (ClauseValue::Bool(operand), Value::Bool(b)) => {
                matches!(self.op.normalize(), Op::Eq | Op::Ne) && self.op.eval_ordering(b.cmp(operand))
            }
            _ => false,
        }
    }

    /// Reads the clause's field from `item` and evaluates it.
    pub fn is_satisfied_by<T: Record + ?Sized>(&self, item: &T) -> bool {
        self.matches(&item.field_value(&self.field))
    }

    fn match_str(&self, field: &str, operand: &str) -> bool {
        match self.op.normalize() {
            Op::StartsWith => field.starts_with(operand),
            Op::EndsWith => field.ends_with(operand),
            Op::Contains => field.contains(operand),
            op if op.is_comparison() => op.eval_ordering(field.cmp(operand)),
            _ => false,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// Owned operand stored in a clause.
#[derive(Debug, Clone)]
pub enum ClauseValue {
    String(String),
    Number(Number),
    Timestamp(Timestamp),
    Enum(u32),
    /// Operand of `In`.
    EnumSet(Vec<u32>),
    Bool(bool),
    Like(LikePattern),
    Regex(Regex),
}

impl fmt::Display for ClauseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClauseValue::String(s) => write!(f, "{s:?}"),
            ClauseValue::Number(n) => write!(f, "{n}"),
            ClauseValue::Timestamp(t) => write!(f, "@{}", t.as_millis()),
            ClauseValue::Enum(d) => write!(f, "#{d}"),
            ClauseValue::EnumSet(set) => write!(f, "{set:?}"),
            ClauseValue::Bool(b) => write!(f, "{b}"),
            ClauseValue::Like(p) => write!(f, "{p}"),
            ClauseValue::Regex(r) => write!(f, "/{}/", r.as_str()),
        }
    }
}

impl From<String> for ClauseValue {
    fn from(s: String) -> Self {
        ClauseValue::String(s)
    }
}

impl From<&str> for ClauseValue {
    fn from(s: &str) -> Self {
        ClauseValue::String(s.to_string())
    }
}

impl From<Timestamp> for ClauseValue {
    fn from(t: Timestamp) -> Self {
        ClauseValue::Timestamp(t)
    }
}

impl From<bool> for ClauseValue {
    fn from(b: bool) -> Self {
        ClauseValue::Bool(b)
    }
}

impl From<Regex> for ClauseValue {
    fn from(r: Regex) -> Self {
        ClauseValue::Regex(r)
    }
}

impl From<LikePattern> for ClauseValue {
    fn from(p: LikePattern) -> Self {
        ClauseValue::Like(p)
    }
}

impl From<Vec<u32>> for ClauseValue {
    fn from(v: Vec<u32>) -> Self {
        ClauseValue::EnumSet(v)
    }
}

impl<N: Into<Number>> From<N> for ClauseValue
where
    N: NumericOperand,
{
    fn from(n: N) -> Self {
        ClauseValue::Number(n.into())
    }
}

/// Marker for primitive numeric operands accepted by clause builders.
pub trait NumericOperand {}

macro_rules! numeric_operand {
    ($($t:ty),+) => {
        $(impl NumericOperand for $t {})+
    };
}

numeric_operand!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, Number);

/// Boxed closure predicate with a display name.
pub struct Predicate<T> {
    name: Arc<str>,
    test: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Predicate<T> {
    pub fn new<F>(name: impl Into<Arc<str>>, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            test: Arc::new(test),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn test(&self, item: &T) -> bool {
        (self.test)(item)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            test: Arc::clone(&self.test),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

/// One where-list entry.
pub enum Criterion<T> {
    Clause(Clause),
    Predicate(Predicate<T>),
}

impl<T: Record> Criterion<T> {
    pub fn is_satisfied_by(&self, item: &T) -> bool {
        match self {
            Criterion::Clause(clause) => clause.is_satisfied_by(item),
            Criterion::Predicate(predicate) => predicate.test(item),
        }
    }
}

impl<T> Clone for Criterion<T> {
    fn clone(&self) -> Self {
        match self {
            Criterion::Clause(c) => Criterion::Clause(c.clone()),
            Criterion::Predicate(p) => Criterion::Predicate(p.clone()),
        }
    }
}

impl<T> fmt::Debug for Criterion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Clause(c) => f.debug_tuple("Clause").field(c).finish(),
            Criterion::Predicate(p) => p.fmt(f),
        }
    }
}

impl<T> fmt::Display for Criterion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Clause(c) => c.fmt(f),
            Criterion::Predicate(p) => write!(f, "fn {}", p.name),
        }
    }
}

impl<T> From<Clause> for Criterion<T> {
    fn from(clause: Clause) -> Self {
        Criterion::Clause(clause)
    }
}

impl<T> From<Predicate<T>> for Criterion<T> {
    fn from(predicate: Predicate<T>) -> Self {
        Criterion::Predicate(predicate)
    }
}
