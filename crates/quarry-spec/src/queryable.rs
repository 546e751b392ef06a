//! The queryable protocol and the in-memory deferred query.
//!
//! Evaluators never touch data. They translate a specification into calls
//! on a [`Queryable`], which an execution layer implements. [`Query`] is the
//! implementation shipped with this crate: it records every call as a
//! [`QueryStep`] and runs the plan over a slice on demand.
//!
//! # Execution semantics
//!
//! ```text
//! filter / search   retain matching items, order preserved
//! order_by          stable sort, replacing earlier keys
//! then_by           adds a tie-break key (acts as order_by when unordered)
//! skip / take       drop the first n / keep the first n, applied in call order
//! hints / include   recorded only
//! ```

use std::fmt;

use crate::clause::Criterion;
use crate::error::Result;
use crate::include::IncludePath;
use crate::ordering::{compare_by_keys, OrderBy};
use crate::record::Record;
use crate::search::SearchGroup;
use crate::selector::Selector;
use crate::update::{self, Assignment};

/// A deferred query an evaluator can extend.
///
/// Execution hints and includes default to no-ops so layers without
/// change tracking or relational navigation only implement what they
/// support. `filter` and `search` are fallible so a translating layer can
/// reject criteria it cannot express, such as opaque closures.
pub trait Queryable<T>: Sized {
    /// What `project` turns the query into.
    type Projection<R>;

    fn filter(self, criterion: &Criterion<T>) -> Result<Self>;

    /// Requires at least one criterion of `group` to match.
    fn search(self, group: &SearchGroup) -> Result<Self>;

    fn include(self, _path: &IncludePath) -> Self {
        self
    }

    fn as_no_tracking(self) -> Self {
        self
    }

    fn as_split_query(self) -> Self {
        self
    }

    fn ignore_query_filters(self) -> Self {
        self
    }

    fn order_by(self, order: &OrderBy) -> Self;

    fn then_by(self, order: &OrderBy) -> Self;

    fn skip(self, count: usize) -> Self;

    fn take(self, count: usize) -> Self;

    fn update(self, assignments: &[Assignment<T>]) -> Self;

    fn project<R>(self, selector: &Selector<T, R>) -> Self::Projection<R>;
}

/// One recorded call on a [`Query`].
pub enum QueryStep<T> {
    Filter(Criterion<T>),
    Search(SearchGroup),
    Include(IncludePath),
    AsNoTracking,
    AsSplitQuery,
    IgnoreQueryFilters,
    OrderBy(OrderBy),
    ThenBy(OrderBy),
    Skip(usize),
    Take(usize),
    Update(Vec<Assignment<T>>),
}

impl<T> Clone for QueryStep<T> {
    fn clone(&self) -> Self {
        match self {
            QueryStep::Filter(c) => QueryStep::Filter(c.clone()),
            QueryStep::Search(g) => QueryStep::Search(g.clone()),
            QueryStep::Include(p) => QueryStep::Include(p.clone()),
            QueryStep::AsNoTracking => QueryStep::AsNoTracking,
            QueryStep::AsSplitQuery => QueryStep::AsSplitQuery,
            QueryStep::IgnoreQueryFilters => QueryStep::IgnoreQueryFilters,
            QueryStep::OrderBy(o) => QueryStep::OrderBy(o.clone()),
            QueryStep::ThenBy(o) => QueryStep::ThenBy(o.clone()),
            QueryStep::Skip(n) => QueryStep::Skip(*n),
            QueryStep::Take(n) => QueryStep::Take(*n),
            QueryStep::Update(a) => QueryStep::Update(a.clone()),
        }
    }
}

impl<T> fmt::Display for QueryStep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStep::Filter(c) => write!(f, "where {c}"),
            QueryStep::Search(g) => write!(f, "search {g}"),
            QueryStep::Include(p) => write!(f, "include {p}"),
            QueryStep::AsNoTracking => f.write_str("as_no_tracking"),
            QueryStep::AsSplitQuery => f.write_str("as_split_query"),
            QueryStep::IgnoreQueryFilters => f.write_str("ignore_query_filters"),
            QueryStep::OrderBy(o) => write!(f, "order_by {o}"),
            QueryStep::ThenBy(o) => write!(f, "then_by {o}"),
            QueryStep::Skip(n) => write!(f, "skip {n}"),
            QueryStep::Take(n) => write!(f, "take {n}"),
            QueryStep::Update(assignments) => {
                f.write_str("update ")?;
                for (i, a) in assignments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{a}")?;
                }
                Ok(())
            }
        }
    }
}

impl<T> fmt::Debug for QueryStep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// In-memory deferred query over `T`.
///
/// ```
/// use quarry_spec::{Criterion, Clause, Number, Op, OrderBy, Query, Queryable, Record, Value};
///
/// struct N(i64);
///
/// impl Record for N {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "n" => Value::Number(Number::I64(self.0)),
///             _ => Value::None,
///         }
///     }
/// }
///
/// let items: Vec<N> = (1..=6).map(N).collect();
/// let query = Query::new()
///     .filter(&Criterion::from(Clause::new("n", Op::Gt, 1i64)))
///     .unwrap()
///     .order_by(&OrderBy::desc("n"))
///     .skip(1)
///     .take(2);
///
/// let ns: Vec<i64> = query.load(&items).iter().map(|n| n.0).collect();
/// assert_eq!(ns, vec![5, 4]);
/// assert_eq!(query.plan(), vec!["where n gt 1", "order_by n desc", "skip 1", "take 2"]);
/// ```
pub struct Query<T> {
    steps: Vec<QueryStep<T>>,
}

impl<T> Query<T> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn steps(&self) -> &[QueryStep<T>] {
        &self.steps
    }

    /// Human-readable plan, one line per step.
    pub fn plan(&self) -> Vec<String> {
        self.steps.iter().map(ToString::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_no_tracking(&self) -> bool {
        self.has_step(|s| matches!(s, QueryStep::AsNoTracking))
    }

    pub fn is_split_query(&self) -> bool {
        self.has_step(|s| matches!(s, QueryStep::AsSplitQuery))
    }

    pub fn ignores_query_filters(&self) -> bool {
        self.has_step(|s| matches!(s, QueryStep::IgnoreQueryFilters))
    }

    pub fn is_ordered(&self) -> bool {
        self.has_step(|s| matches!(s, QueryStep::OrderBy(_) | QueryStep::ThenBy(_)))
    }

    pub fn includes(&self) -> Vec<&IncludePath> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                QueryStep::Include(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// All recorded assignments, in call order.
    pub fn assignments(&self) -> Vec<&Assignment<T>> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                QueryStep::Update(a) => Some(a.iter()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn has_step(&self, pred: impl Fn(&QueryStep<T>) -> bool) -> bool {
        self.steps.iter().any(pred)
    }

    fn push(mut self, step: QueryStep<T>) -> Self {
        self.steps.push(step);
        self
    }
}

impl<T: Record> Query<T> {
    /// Indices of the selected items, in result order.
    fn select_indices(&self, items: &[T]) -> Vec<usize> {
        let mut selected: Vec<usize> = (0..items.len()).collect();
        let mut keys: Vec<OrderBy> = Vec::new();

        let flush = |selected: &mut Vec<usize>, keys: &[OrderBy]| {
            if !keys.is_empty() {
                selected.sort_by(|&a, &b| compare_by_keys(&items[a], &items[b], keys));
            }
        };

        for step in &self.steps {
            match step {
                QueryStep::Filter(c) => selected.retain(|&i| c.is_satisfied_by(&items[i])),
                QueryStep::Search(g) => selected.retain(|&i| g.matches(&items[i])),
                QueryStep::OrderBy(o) => {
                    flush(&mut selected, &keys);
                    keys = vec![o.clone()];
                }
                QueryStep::ThenBy(o) => keys.push(o.clone()),
                QueryStep::Skip(n) => {
                    flush(&mut selected, &keys);
                    keys.clear();
                    let n = (*n).min(selected.len());
                    selected.drain(..n);
                }
                QueryStep::Take(n) => {
                    flush(&mut selected, &keys);
                    keys.clear();
                    selected.truncate(*n);
                }
                QueryStep::Include(_)
                | QueryStep::AsNoTracking
                | QueryStep::AsSplitQuery
                | QueryStep::IgnoreQueryFilters
                | QueryStep::Update(_) => {}
            }
        }
        flush(&mut selected, &keys);
        selected
    }

    /// Runs the plan, returning references in result order.
    pub fn load<'a>(&self, items: &'a [T]) -> Vec<&'a T> {
        self.select_indices(items)
            .into_iter()
            .map(|i| &items[i])
            .collect()
    }

    pub fn count(&self, items: &[T]) -> usize {
        self.select_indices(items).len()
    }

    pub fn first<'a>(&self, items: &'a [T]) -> Option<&'a T> {
        self.select_indices(items).first().map(|&i| &items[i])
    }

    /// Applies the recorded assignments to every selected item.
    ///
    /// Returns the number of updated items; zero when nothing was assigned.
    /// Updated copies are written back only after every item succeeded, so
    /// a failing assignment leaves `items` unchanged.
    pub fn execute_update(&self, items: &mut [T]) -> Result<usize>
    where
        T: Clone,
    {
        let assignments: Vec<Assignment<T>> = self.assignments().into_iter().cloned().collect();
        if assignments.is_empty() {
            return Ok(0);
        }
        let staged = self
            .select_indices(items)
            .into_iter()
            .map(|i| update::applied(&assignments, &items[i]).map(|item| (i, item)))
            .collect::<Result<Vec<(usize, T)>>>()?;
        let updated = staged.len();
        for (i, item) in staged {
            items[i] = item;
        }
        Ok(updated)
    }
}

impl<T> Queryable<T> for Query<T> {
    type Projection<R> = Projected<T, R>;

    fn filter(self, criterion: &Criterion<T>) -> Result<Self> {
        Ok(self.push(QueryStep::Filter(criterion.clone())))
    }

    fn search(self, group: &SearchGroup) -> Result<Self> {
        Ok(self.push(QueryStep::Search(group.clone())))
    }

    fn include(self, path: &IncludePath) -> Self {
        self.push(QueryStep::Include(path.clone()))
    }

    fn as_no_tracking(self) -> Self {
        self.push(QueryStep::AsNoTracking)
    }

    fn as_split_query(self) -> Self {
        self.push(QueryStep::AsSplitQuery)
    }

    fn ignore_query_filters(self) -> Self {
        self.push(QueryStep::IgnoreQueryFilters)
    }

    fn order_by(self, order: &OrderBy) -> Self {
        self.push(QueryStep::OrderBy(order.clone()))
    }

    fn then_by(self, order: &OrderBy) -> Self {
        self.push(QueryStep::ThenBy(order.clone()))
    }

    fn skip(self, count: usize) -> Self {
        self.push(QueryStep::Skip(count))
    }

    fn take(self, count: usize) -> Self {
        self.push(QueryStep::Take(count))
    }

    fn update(self, assignments: &[Assignment<T>]) -> Self {
        self.push(QueryStep::Update(assignments.to_vec()))
    }

    fn project<R>(self, selector: &Selector<T, R>) -> Projected<T, R> {
        Projected {
            query: self,
            selector: selector.clone(),
        }
    }
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            steps: self.steps.clone(),
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.steps).finish()
    }
}

/// A [`Query`] followed by a terminal projection.
pub struct Projected<T, R> {
    query: Query<T>,
    selector: Selector<T, R>,
}

impl<T, R> Projected<T, R> {
    pub fn query(&self) -> &Query<T> {
        &self.query
    }

    pub fn selector(&self) -> &Selector<T, R> {
        &self.selector
    }

    pub fn plan(&self) -> Vec<String> {
        let mut plan = self.query.plan();
        plan.push(self.selector.kind().to_string());
        plan
    }
}

impl<T: Record, R> Projected<T, R> {
    pub fn load(&self, items: &[T]) -> Vec<R> {
        self.selector.project_all(self.query.load(items))
    }
}

impl<T, R> fmt::Debug for Projected<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projected")
            .field("query", &self.query)
            .field("selector", &self.selector)
            .finish()
    }
}
