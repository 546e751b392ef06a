//! The evaluator chain.
//!
//! Each evaluator applies one concern of a specification to a
//! [`Queryable`]. [`SpecificationEvaluator`] holds them sorted by
//! [`Evaluator::application_order`] and threads a query through all of them.
//!
//! Default chain:
//!
//! | Order | Evaluator | Criteria |
//! |------:|-----------|:--------:|
//! | 100 | [`WhereEvaluator`] | yes |
//! | 200 | [`SearchEvaluator`] | yes |
//! | 300 | [`IncludeEvaluator`] | |
//! | 400 | [`AsNoTrackingEvaluator`] | |
//! | 500 | [`AsSplitQueryEvaluator`] | |
//! | 600 | [`OrderEvaluator`] | |
//! | 700 | [`PagingEvaluator`] | |
//! | 800 | [`IgnoreQueryFiltersEvaluator`] | |
//! | 900 | [`PreUpdateEvaluator`] | |
//!
//! The projection step ([`ProjectionEvaluator`]) changes the element type,
//! so it is not part of the list and always runs last.
//!
//! Custom evaluators slot in by order; an evaluator with the same order as
//! an existing one runs after it.

mod builtin;
mod paging;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::Result;
use crate::queryable::Queryable;
use crate::specification::{ProjectedSpecification, Specification, UpdateSpecification};

pub use builtin::{
    AsNoTrackingEvaluator, AsSplitQueryEvaluator, IgnoreQueryFiltersEvaluator, IncludeEvaluator,
    OrderEvaluator, PreUpdateEvaluator, ProjectionEvaluator, SearchEvaluator, WhereEvaluator,
};
pub use paging::PagingEvaluator;

/// One concern of a specification, applied to a query.
///
/// Implementations hold no per-call state and may be shared freely.
pub trait Evaluator<T, Q>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Sort key within a chain; lower runs first.
    fn application_order(&self) -> i32;

    /// Whether this evaluator only narrows the candidate set, so running it
    /// alone yields the same matches without shaping.
    fn is_criteria_evaluator(&self) -> bool {
        false
    }

    fn evaluate(&self, query: Q, spec: &Specification<T>) -> Result<Q>;
}

/// An ordered chain of evaluators.
///
/// ```
/// use quarry_spec::{Query, Specification, SpecificationEvaluator};
///
/// let chain = SpecificationEvaluator::<(), Query<()>>::new();
/// let names: Vec<&str> = chain.evaluators().iter().map(|e| e.name()).collect();
/// assert_eq!(names[0], "where");
/// assert_eq!(names.last(), Some(&"pre_update"));
/// ```
pub struct SpecificationEvaluator<T, Q> {
    evaluators: Vec<Arc<dyn Evaluator<T, Q>>>,
    projection: ProjectionEvaluator,
}

impl<T, Q: Queryable<T>> SpecificationEvaluator<T, Q> {
    /// The default chain with lenient paging.
    pub fn new() -> Self {
        Self::with_paging(PagingEvaluator::default())
    }

    /// The default chain, failing on paging without ordering.
    pub fn strict() -> Self {
        Self::with_paging(PagingEvaluator::strict())
    }

    /// The default chain with a configured paging evaluator.
    pub fn with_paging(paging: PagingEvaluator) -> Self {
        Self::empty()
            .with_evaluator(WhereEvaluator)
            .with_evaluator(SearchEvaluator)
            .with_evaluator(IncludeEvaluator)
            .with_evaluator(AsNoTrackingEvaluator)
            .with_evaluator(AsSplitQueryEvaluator)
            .with_evaluator(OrderEvaluator)
            .with_evaluator(paging)
            .with_evaluator(IgnoreQueryFiltersEvaluator)
            .with_evaluator(PreUpdateEvaluator)
    }

    /// A chain with no evaluators; only the projection step remains.
    pub fn empty() -> Self {
        Self {
            evaluators: Vec::new(),
            projection: ProjectionEvaluator,
        }
    }

    pub fn with_evaluator<E>(self, evaluator: E) -> Self
    where
        E: Evaluator<T, Q> + 'static,
    {
        self.with_shared(Arc::new(evaluator))
    }

    /// Adds an evaluator after every evaluator of lower or equal order.
    pub fn with_shared(mut self, evaluator: Arc<dyn Evaluator<T, Q>>) -> Self {
        let order = evaluator.application_order();
        let at = self
            .evaluators
            .partition_point(|e| e.application_order() <= order);
        self.evaluators.insert(at, evaluator);
        self
    }

    pub fn evaluators(&self) -> &[Arc<dyn Evaluator<T, Q>>] {
        &self.evaluators
    }

    /// Runs every evaluator in order.
    pub fn evaluate(&self, query: Q, spec: &Specification<T>) -> Result<Q> {
        self.run(query, spec, false)
    }

    /// Runs only the criteria evaluators: filtering without includes,
    /// ordering or paging. Used to count matches.
    pub fn evaluate_criteria(&self, query: Q, spec: &Specification<T>) -> Result<Q> {
        self.run(query, spec, true)
    }

    /// Runs the chain, then the terminal projection.
    pub fn evaluate_projected<R>(
        &self,
        query: Q,
        spec: &ProjectedSpecification<T, R>,
    ) -> Result<Q::Projection<R>> {
        let query = self.evaluate(query, spec.spec())?;
        self.projection.evaluate(query, spec)
    }

    pub fn evaluate_update(&self, query: Q, spec: &UpdateSpecification<T>) -> Result<Q> {
        self.evaluate(query, spec.spec())
    }

    fn run(&self, mut query: Q, spec: &Specification<T>, criteria_only: bool) -> Result<Q> {
        debug!(
            evaluators = self.evaluators.len(),
            criteria_only, "evaluating specification"
        );
        for evaluator in &self.evaluators {
            if criteria_only && !evaluator.is_criteria_evaluator() {
                continue;
            }
            trace!(
                evaluator = evaluator.name(),
                order = evaluator.application_order(),
                "applying evaluator"
            );
            query = evaluator.evaluate(query, spec)?;
        }
        Ok(query)
    }
}

impl<T, Q: Queryable<T>> Default for SpecificationEvaluator<T, Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, Q> Clone for SpecificationEvaluator<T, Q> {
    fn clone(&self) -> Self {
        Self {
            evaluators: self.evaluators.clone(),
            projection: ProjectionEvaluator,
        }
    }
}

impl<T, Q> fmt::Debug for SpecificationEvaluator<T, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.evaluators
                    .iter()
                    .map(|e| (e.name(), e.application_order())),
            )
            .finish()
    }
}
