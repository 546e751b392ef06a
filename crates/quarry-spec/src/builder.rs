//! Typestate builder for specifications.
//!
//! The builder's second type parameter records which clause was appended
//! last, and each state only exposes the follow-on calls that are legal:
//!
//! ```text
//! Base ──order_by──▶ Ordered ──then_by──▶ Ordered
//!   │                   │
//!   ├──include────▶ Included ──then_include──▶ Included
//!   │
//!   └──search─────▶ Grouped ──or_search──▶ Grouped
//! ```
//!
//! Every other clause is available in every state and returns to `Base`.
//! Calling `then_by` without a preceding `order_by` does not compile:
//!
//! ```compile_fail
//! use quarry_spec::Specification;
//!
//! let _ = Specification::<()>::builder().then_by("name");
//! ```

use std::marker::PhantomData;

use crate::clause::{Clause, ClauseValue, Criterion, Predicate};
use crate::error::Result;
use crate::include::IncludePath;
use crate::op::Op;
use crate::ordering::{Dir, OrderBy, OrderKind};
use crate::search::SearchCriteria;
use crate::selector::Selector;
use crate::specification::{ProjectedSpecification, ReturnType, Specification, UpdateSpecification};
use crate::update::Assignment;
use crate::value::FieldValue;

/// A model the builder can fill in.
pub trait BuildTarget {
    type Entity;

    fn model_mut(&mut self) -> &mut Specification<Self::Entity>;
}

/// No follow-on restriction.
#[derive(Debug, Clone, Copy)]
pub struct Base;

/// Last clause was an ordering; `then_by` is available.
#[derive(Debug, Clone, Copy)]
pub struct Ordered;

/// Last clause was a search; `or_search` adds to the same group.
#[derive(Debug, Clone, Copy)]
pub struct Grouped;

/// Last clause was an include; `then_include` extends its path.
#[derive(Debug, Clone, Copy)]
pub struct Included;

/// Fluent builder over a [`BuildTarget`].
#[derive(Debug)]
pub struct SpecificationBuilder<K, S = Base> {
    target: K,
    state: PhantomData<S>,
}

impl<K: BuildTarget> SpecificationBuilder<K, Base> {
    pub fn new(target: K) -> Self {
        Self {
            target,
            state: PhantomData,
        }
    }
}

impl<K: BuildTarget, S> SpecificationBuilder<K, S> {
    fn into_state<N>(self) -> SpecificationBuilder<K, N> {
        SpecificationBuilder {
            target: self.target,
            state: PhantomData,
        }
    }

    fn with(mut self, f: impl FnOnce(&mut Specification<K::Entity>)) -> Self {
        f(self.target.model_mut());
        self
    }

    /// Adds a structural filter clause.
    pub fn filter(
        self,
        field: &str,
        op: Op,
        value: impl Into<ClauseValue>,
    ) -> SpecificationBuilder<K, Base> {
        self.filter_clause(Clause::new(field, op, value))
    }

    pub fn filter_eq(self, field: &str, value: impl Into<ClauseValue>) -> SpecificationBuilder<K, Base> {
        self.filter(field, Op::Eq, value)
    }

    pub fn filter_ne(self, field: &str, value: impl Into<ClauseValue>) -> SpecificationBuilder<K, Base> {
        self.filter(field, Op::Ne, value)
    }

    pub fn filter_clause(self, clause: Clause) -> SpecificationBuilder<K, Base> {
        self.with(|m| m.push_criterion(Criterion::Clause(clause)))
            .into_state()
    }

    /// Adds a case-insensitive SQL `LIKE` filter.
    pub fn filter_like(self, field: &str, pattern: &str) -> Result<SpecificationBuilder<K, Base>> {
        Ok(self.filter_clause(Clause::like(field, pattern)?))
    }

    /// Adds an opaque closure filter.
    ///
    /// Only in-memory execution layers can run closure filters.
    pub fn filter_by<F>(self, name: &str, f: F) -> SpecificationBuilder<K, Base>
    where
        F: Fn(&K::Entity) -> bool + Send + Sync + 'static,
    {
        let predicate = Predicate::new(name, f);
        self.with(|m| m.push_criterion(Criterion::Predicate(predicate)))
            .into_state()
    }

    pub fn order_by(self, field: &str) -> SpecificationBuilder<K, Ordered> {
        self.with(|m| m.push_order(OrderBy::new(field, Dir::Asc), OrderKind::Primary))
            .into_state()
    }

    pub fn order_by_desc(self, field: &str) -> SpecificationBuilder<K, Ordered> {
        self.with(|m| m.push_order(OrderBy::new(field, Dir::Desc), OrderKind::Primary))
            .into_state()
    }

    /// Starts an eager-load path.
    pub fn include(self, navigation: &str) -> SpecificationBuilder<K, Included> {
        self.with(|m| m.push_include(IncludePath::new(navigation)))
            .into_state()
    }

    /// Adds a dotted eager-load path. Blank paths are ignored.
    pub fn include_string(self, path: &str) -> SpecificationBuilder<K, Base> {
        let path = path.trim().to_string();
        self.with(|m| {
            if !path.is_empty() {
                m.push_include_string(path);
            }
        })
        .into_state()
    }

    /// Opens (or joins) search group `group` with one `LIKE` criterion.
    pub fn search(
        self,
        field: &str,
        pattern: &str,
        group: i32,
    ) -> Result<SpecificationBuilder<K, Grouped>> {
        let criteria = SearchCriteria::new(field, pattern, group)?;
        Ok(self.with(|m| m.push_search(criteria)).into_state())
    }

    pub fn skip(self, count: usize) -> SpecificationBuilder<K, Base> {
        self.with(|m| m.set_skip(count)).into_state()
    }

    pub fn take(self, count: usize) -> SpecificationBuilder<K, Base> {
        self.with(|m| m.set_take(count)).into_state()
    }

    pub fn as_no_tracking(self) -> SpecificationBuilder<K, Base> {
        self.with(Specification::set_as_no_tracking).into_state()
    }

    pub fn as_split_query(self) -> SpecificationBuilder<K, Base> {
        self.with(Specification::set_as_split_query).into_state()
    }

    pub fn ignore_query_filters(self) -> SpecificationBuilder<K, Base> {
        self.with(Specification::set_ignore_query_filters)
            .into_state()
    }

    /// Marks the specification as targeting at most one result.
    pub fn single(self) -> SpecificationBuilder<K, Base> {
        self.with(|m| m.set_return_type(ReturnType::Single))
            .into_state()
    }

    pub fn build(self) -> K {
        self.target
    }
}

impl<K: BuildTarget> SpecificationBuilder<K, Ordered> {
    pub fn then_by(self, field: &str) -> Self {
        self.with(|m| m.push_order(OrderBy::new(field, Dir::Asc), OrderKind::Then))
    }

    pub fn then_by_desc(self, field: &str) -> Self {
        self.with(|m| m.push_order(OrderBy::new(field, Dir::Desc), OrderKind::Then))
    }
}

impl<K: BuildTarget> SpecificationBuilder<K, Included> {
    /// Extends the last include path by one navigation.
    pub fn then_include(self, navigation: &str) -> Self {
        let segment = navigation.to_string();
        self.with(|m| m.extend_last_include(segment))
    }
}

impl<K: BuildTarget> SpecificationBuilder<K, Grouped> {
    /// Adds a criterion ORed with the current search group.
    pub fn or_search(self, field: &str, pattern: &str) -> Result<Self> {
        let mut this = self;
        let group = this.target.model_mut().last_search_group().unwrap_or_default();
        let criteria = SearchCriteria::new(field, pattern, group)?;
        this.target.model_mut().push_search(criteria);
        Ok(this)
    }
}

impl<T, R, S> SpecificationBuilder<ProjectedSpecification<T, R>, S> {
    /// Projects each match to one `R`.
    pub fn select<F>(mut self, f: F) -> Result<SpecificationBuilder<ProjectedSpecification<T, R>, Base>>
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        self.target.set_selector(Selector::one(f))?;
        Ok(self.into_state())
    }

    /// Projects each match to any number of `R`, flattened.
    pub fn select_many<F>(
        mut self,
        f: F,
    ) -> Result<SpecificationBuilder<ProjectedSpecification<T, R>, Base>>
    where
        F: Fn(&T) -> Vec<R> + Send + Sync + 'static,
    {
        self.target.set_selector(Selector::many(f))?;
        Ok(self.into_state())
    }
}

impl<T, S> SpecificationBuilder<UpdateSpecification<T>, S> {
    /// Adds an assignment. A later assignment to the same field replaces
    /// the earlier one.
    pub fn modify(self, assignment: Assignment<T>) -> SpecificationBuilder<UpdateSpecification<T>, Base> {
        self.with(|m| m.push_assignment(assignment)).into_state()
    }

    pub fn set(
        self,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> SpecificationBuilder<UpdateSpecification<T>, Base> {
        self.modify(Assignment::set(field, value))
    }

    pub fn set_with<F>(self, field: &str, f: F) -> SpecificationBuilder<UpdateSpecification<T>, Base>
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        self.modify(Assignment::compute(field, f))
    }
}
