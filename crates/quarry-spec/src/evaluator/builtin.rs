//! The built-in evaluators, listed in application order.
//!
//! Criteria evaluators (`where`, `search`) run first so that a caller can
//! apply them alone. Shaping follows, then the update hand-off. Projection
//! is terminal and lives outside the chain.

use tracing::trace;

use super::Evaluator;
use crate::error::{Result, SpecError};
use crate::include::IncludePath;
use crate::ordering::OrderKind;
use crate::queryable::Queryable;
use crate::search::SearchGroup;
use crate::specification::{ProjectedSpecification, Specification};

/// Applies every filter as a conjunct.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhereEvaluator;

impl<T, Q: Queryable<T>> Evaluator<T, Q> for WhereEvaluator {
    fn name(&self) -> &'static str {
        "where"
    }

    fn application_order(&self) -> i32 {
        100
    }

    fn is_criteria_evaluator(&self) -> bool {
        true
    }

    fn evaluate(&self, query: Q, spec: &Specification<T>) -> Result<Q> {
        spec.where_expressions()
            .iter()
            .try_fold(query, |query, criterion| query.filter(criterion))
    }
}

/// Applies search criteria: OR within a group, AND across groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchEvaluator;

impl<T, Q: Queryable<T>> Evaluator<T, Q> for SearchEvaluator {
    fn name(&self) -> &'static str {
        "search"
    }

    fn application_order(&self) -> i32 {
        200
    }

    fn is_criteria_evaluator(&self) -> bool {
        true
    }

    fn evaluate(&self, query: Q, spec: &Specification<T>) -> Result<Q> {
        SearchGroup::partition(spec.search_criteria())
            .iter()
            .try_fold(query, |query, group| query.search(group))
    }
}

/// Applies include paths, then dotted include strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeEvaluator;

impl<T, Q: Queryable<T>> Evaluator<T, Q> for IncludeEvaluator {
    fn name(&self) -> &'static str {
        "include"
    }

    fn application_order(&self) -> i32 {
        300
    }

    fn evaluate(&self, query: Q, spec: &Specification<T>) -> Result<Q> {
        let query = spec
            .include_expressions()
            .iter()
            .fold(query, |query, path| query.include(path));
        Ok(spec
            .include_strings()
            .iter()
            .filter_map(|s| IncludePath::parse(s))
            .fold(query, |query, path| query.include(&path)))
    }
}

/// Marks the query read-only when the specification asks for no tracking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsNoTrackingEvaluator;

impl<T, Q: Queryable<T>> Evaluator<T, Q> for AsNoTrackingEvaluator {
    fn name(&self) -> &'static str {
        "as_no_tracking"
    }

    fn application_order(&self) -> i32 {
        400
    }

    fn evaluate(&self, query: Q, spec: &Specification<T>) -> Result<Q> {
        Ok(if spec.is_as_no_tracking() {
            query.as_no_tracking()
        } else {
            query
        })
    }
}

/// Forwards the split-query hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsSplitQueryEvaluator;

impl<T, Q: Queryable<T>> Evaluator<T, Q> for AsSplitQueryEvaluator {
    fn name(&self) -> &'static str {
        "as_split_query"
    }

    fn application_order(&self) -> i32 {
        500
    }

    fn evaluate(&self, query: Q, spec: &Specification<T>) -> Result<Q> {
        Ok(if spec.is_as_split_query() {
            query.as_split_query()
        } else {
            query
        })
    }
}

/// Applies orderings.
///
/// The first primary entry becomes the base ordering. Every other entry is
/// a tie-break, in declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderEvaluator;

impl<T, Q: Queryable<T>> Evaluator<T, Q> for OrderEvaluator {
    fn name(&self) -> &'static str {
        "order"
    }

    fn application_order(&self) -> i32 {
        600
    }

    fn evaluate(&self, query: Q, spec: &Specification<T>) -> Result<Q> {
        let orders = spec.order_expressions();
        if orders.is_empty() {
            return Ok(query);
        }
        let primary = orders
            .iter()
            .position(|o| o.kind == OrderKind::Primary)
            .unwrap_or(0);
        let mut query = query.order_by(&orders[primary].order);
        for (i, expr) in orders.iter().enumerate() {
            if i != primary {
                query = query.then_by(&expr.order);
            }
        }
        Ok(query)
    }
}

/// Tells the query to drop store-level default filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreQueryFiltersEvaluator;

impl<T, Q: Queryable<T>> Evaluator<T, Q> for IgnoreQueryFiltersEvaluator {
    fn name(&self) -> &'static str {
        "ignore_query_filters"
    }

    fn application_order(&self) -> i32 {
        800
    }

    fn evaluate(&self, query: Q, spec: &Specification<T>) -> Result<Q> {
        Ok(if spec.ignores_query_filters() {
            query.ignore_query_filters()
        } else {
            query
        })
    }
}

/// Hands update assignments to the query, after all shaping.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreUpdateEvaluator;

impl<T, Q: Queryable<T>> Evaluator<T, Q> for PreUpdateEvaluator {
    fn name(&self) -> &'static str {
        "pre_update"
    }

    fn application_order(&self) -> i32 {
        900
    }

    fn evaluate(&self, query: Q, spec: &Specification<T>) -> Result<Q> {
        let assignments = spec.update_expressions();
        if assignments.is_empty() {
            return Ok(query);
        }
        trace!(assignments = assignments.len(), "applying update assignments");
        Ok(query.update(assignments))
    }
}

/// Terminal step turning a query over `T` into one over `R`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionEvaluator;

impl ProjectionEvaluator {
    pub const APPLICATION_ORDER: i32 = 1000;

    pub fn evaluate<T, R, Q: Queryable<T>>(
        &self,
        query: Q,
        spec: &ProjectedSpecification<T, R>,
    ) -> Result<Q::Projection<R>> {
        let selector = spec.selector().ok_or(SpecError::SelectorNotFound)?;
        trace!(selector = selector.kind(), "applying projection");
        Ok(query.project(selector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queryable::Query;

    #[derive(Debug)]
    struct Row;

    fn run<E: Evaluator<Row, Query<Row>>>(evaluator: E, spec: &Specification<Row>) -> Vec<String> {
        evaluator.evaluate(Query::new(), spec).unwrap().plan()
    }

    #[test]
    fn order_uses_declaration_order_for_tie_breaks() {
        let spec = Specification::<Row>::builder()
            .order_by_desc("a")
            .then_by("b")
            .order_by("c")
            .build();
        assert_eq!(
            run(OrderEvaluator, &spec),
            vec!["order_by a desc", "then_by b asc", "then_by c asc"]
        );
    }

    #[test]
    fn search_groups_sorted_by_id() {
        let spec = Specification::<Row>::builder()
            .search("b", "x", 2)
            .unwrap()
            .search("a", "y", 1)
            .unwrap()
            .or_search("c", "z")
            .unwrap()
            .build();
        let plan = run(SearchEvaluator, &spec);
        assert_eq!(plan.len(), 2);
        assert!(plan[0].starts_with("search group 1"));
        assert!(plan[1].starts_with("search group 2"));
    }

    #[test]
    fn include_paths_before_strings() {
        let spec = Specification::<Row>::builder()
            .include_string("audit.entries")
            .include("orders")
            .then_include("lines")
            .build();
        assert_eq!(
            run(IncludeEvaluator, &spec),
            vec!["include orders.lines", "include audit.entries"]
        );
    }

    #[test]
    fn hints_only_when_set() {
        let spec = Specification::<Row>::new();
        assert!(run(AsNoTrackingEvaluator, &spec).is_empty());
        assert!(run(AsSplitQueryEvaluator, &spec).is_empty());
        assert!(run(IgnoreQueryFiltersEvaluator, &spec).is_empty());

        let spec = Specification::<Row>::builder()
            .as_no_tracking()
            .as_split_query()
            .ignore_query_filters()
            .build();
        assert_eq!(run(AsNoTrackingEvaluator, &spec), vec!["as_no_tracking"]);
        assert_eq!(run(AsSplitQueryEvaluator, &spec), vec!["as_split_query"]);
        assert_eq!(
            run(IgnoreQueryFiltersEvaluator, &spec),
            vec!["ignore_query_filters"]
        );
    }

    #[test]
    fn projection_without_selector_fails() {
        let spec = ProjectedSpecification::<Row, u8>::new();
        let err = ProjectionEvaluator
            .evaluate(Query::new(), &spec)
            .unwrap_err();
        assert!(matches!(err, SpecError::SelectorNotFound));
    }
}
