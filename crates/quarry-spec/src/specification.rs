//! The specification model.
//!
//! A specification describes a query against entity type `T`: filters,
//! search groups, includes, ordering, paging, execution hints and, for the
//! update flavor, field assignments. It is filled in by a
//! [`SpecificationBuilder`](crate::SpecificationBuilder) and read-only
//! afterwards, so one instance can be evaluated concurrently from many
//! threads.
//!
//! Three flavors share the model:
//!
//! - [`Specification<T>`]: filters and shapes a sequence of `T`
//! - [`ProjectedSpecification<T, R>`]: additionally projects to `R`
//! - [`UpdateSpecification<T>`]: additionally assigns fields in place

use std::fmt;
use std::ops::Deref;

use crate::builder::{BuildTarget, SpecificationBuilder};
use crate::clause::Criterion;
use crate::error::{Result, SpecError};
use crate::evaluator::SpecificationEvaluator;
use crate::include::IncludePath;
use crate::ordering::{OrderBy, OrderExpression, OrderKind};
use crate::queryable::Query;
use crate::record::Record;
use crate::search::SearchCriteria;
use crate::selector::Selector;
use crate::update::{self, Assignment};
use crate::validator::{SearchValidator, Validator, WhereValidator};

/// Whether a specification targets one instance or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnType {
    #[default]
    Collection,
    Single,
}

/// Query intent against entity type `T`.
///
/// ```
/// use quarry_spec::{Number, Op, Record, Specification, Value};
///
/// struct Package {
///     name: &'static str,
///     version: u32,
/// }
///
/// impl Record for Package {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "name" => Value::String(self.name),
///             "version" => Value::Number(Number::from(self.version)),
///             _ => Value::None,
///         }
///     }
/// }
///
/// let spec = Specification::<Package>::builder()
///     .filter("version", Op::Gte, 2u32)
///     .order_by("name")
///     .then_by_desc("version")
///     .build();
///
/// let packages = vec![
///     Package { name: "b", version: 1 },
///     Package { name: "a", version: 2 },
///     Package { name: "a", version: 5 },
/// ];
/// let found = spec.evaluate(&packages).unwrap();
/// assert_eq!(found.len(), 2);
/// assert_eq!(found[0].version, 5);
/// assert!(!spec.is_satisfied_by(&packages[0]));
/// ```
pub struct Specification<T> {
    where_expressions: Vec<Criterion<T>>,
    order_expressions: Vec<OrderExpression>,
    include_expressions: Vec<IncludePath>,
    include_strings: Vec<String>,
    search_criteria: Vec<SearchCriteria>,
    skip: Option<usize>,
    take: Option<usize>,
    as_no_tracking: bool,
    as_split_query: bool,
    ignore_query_filters: bool,
    update_expressions: Vec<Assignment<T>>,
    return_type: ReturnType,
}

impl<T> Specification<T> {
    /// An empty specification, matching every entity.
    pub fn new() -> Self {
        Self {
            where_expressions: Vec::new(),
            order_expressions: Vec::new(),
            include_expressions: Vec::new(),
            include_strings: Vec::new(),
            search_criteria: Vec::new(),
            skip: None,
            take: None,
            as_no_tracking: false,
            as_split_query: false,
            ignore_query_filters: false,
            update_expressions: Vec::new(),
            return_type: ReturnType::Collection,
        }
    }

    pub fn builder() -> SpecificationBuilder<Self> {
        SpecificationBuilder::new(Self::new())
    }

    pub fn where_expressions(&self) -> &[Criterion<T>] {
        &self.where_expressions
    }

    pub fn order_expressions(&self) -> &[OrderExpression] {
        &self.order_expressions
    }

    pub fn include_expressions(&self) -> &[IncludePath] {
        &self.include_expressions
    }

    pub fn include_strings(&self) -> &[String] {
        &self.include_strings
    }

    pub fn search_criteria(&self) -> &[SearchCriteria] {
        &self.search_criteria
    }

    pub fn skip(&self) -> Option<usize> {
        self.skip
    }

    pub fn take(&self) -> Option<usize> {
        self.take
    }

    pub fn is_as_no_tracking(&self) -> bool {
        self.as_no_tracking
    }

    pub fn is_as_split_query(&self) -> bool {
        self.as_split_query
    }

    pub fn ignores_query_filters(&self) -> bool {
        self.ignore_query_filters
    }

    pub fn update_expressions(&self) -> &[Assignment<T>] {
        &self.update_expressions
    }

    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    pub fn is_paged(&self) -> bool {
        self.skip.is_some() || self.take.is_some()
    }

    pub fn has_ordering(&self) -> bool {
        !self.order_expressions.is_empty()
    }

    /// Whether the specification carries no clause at all.
    pub fn is_empty(&self) -> bool {
        self.where_expressions.is_empty()
            && self.order_expressions.is_empty()
            && self.include_expressions.is_empty()
            && self.include_strings.is_empty()
            && self.search_criteria.is_empty()
            && !self.is_paged()
            && self.update_expressions.is_empty()
    }

    pub(crate) fn push_criterion(&mut self, criterion: Criterion<T>) {
        self.where_expressions.push(criterion);
    }

    pub(crate) fn push_order(&mut self, order: OrderBy, kind: OrderKind) {
        self.order_expressions.push(OrderExpression { order, kind });
    }

    pub(crate) fn push_include(&mut self, path: IncludePath) {
        self.include_expressions.push(path);
    }

    pub(crate) fn extend_last_include(&mut self, segment: String) {
        if let Some(path) = self.include_expressions.last_mut() {
            path.then(segment);
        }
    }

    pub(crate) fn push_include_string(&mut self, path: String) {
        self.include_strings.push(path);
    }

    pub(crate) fn push_search(&mut self, criteria: SearchCriteria) {
        self.search_criteria.push(criteria);
    }

    pub(crate) fn last_search_group(&self) -> Option<i32> {
        self.search_criteria.last().map(SearchCriteria::group)
    }

    pub(crate) fn set_skip(&mut self, skip: usize) {
        self.skip = Some(skip);
    }

    pub(crate) fn set_take(&mut self, take: usize) {
        self.take = Some(take);
    }

    pub(crate) fn set_as_no_tracking(&mut self) {
        self.as_no_tracking = true;
    }

    pub(crate) fn set_as_split_query(&mut self) {
        self.as_split_query = true;
    }

    pub(crate) fn set_ignore_query_filters(&mut self) {
        self.ignore_query_filters = true;
    }

    pub(crate) fn set_return_type(&mut self, return_type: ReturnType) {
        self.return_type = return_type;
    }

    /// Adds an assignment, replacing an earlier one on the same field.
    pub(crate) fn push_assignment(&mut self, assignment: Assignment<T>) {
        match self
            .update_expressions
            .iter_mut()
            .find(|a| a.field() == assignment.field())
        {
            Some(existing) => *existing = assignment,
            None => self.update_expressions.push(assignment),
        }
    }
}

impl<T: Record> Specification<T> {
    /// Whether `entity` passes the default validators (where and search).
    ///
    /// Calls the two validators directly, so no chain is allocated.
    pub fn is_satisfied_by(&self, entity: &T) -> bool {
        WhereValidator.is_valid(entity, self) && SearchValidator.is_valid(entity, self)
    }

    /// Runs the default evaluator chain in memory.
    ///
    /// The chain is built for this call. Hot paths should hold one
    /// [`SpecificationEvaluator`] and call it directly, as repositories do.
    pub fn evaluate<'a>(&self, items: &'a [T]) -> Result<Vec<&'a T>> {
        let query = SpecificationEvaluator::new().evaluate(Query::new(), self)?;
        Ok(query.load(items))
    }
}

impl<T> Default for Specification<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Self {
            where_expressions: self.where_expressions.clone(),
            order_expressions: self.order_expressions.clone(),
            include_expressions: self.include_expressions.clone(),
            include_strings: self.include_strings.clone(),
            search_criteria: self.search_criteria.clone(),
            skip: self.skip,
            take: self.take,
            as_no_tracking: self.as_no_tracking,
            as_split_query: self.as_split_query,
            ignore_query_filters: self.ignore_query_filters,
            update_expressions: self.update_expressions.clone(),
            return_type: self.return_type,
        }
    }
}

impl<T> fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("where", &self.where_expressions)
            .field("order", &self.order_expressions)
            .field("include", &self.include_expressions)
            .field("include_strings", &self.include_strings)
            .field("search", &self.search_criteria)
            .field("skip", &self.skip)
            .field("take", &self.take)
            .field("as_no_tracking", &self.as_no_tracking)
            .field("as_split_query", &self.as_split_query)
            .field("ignore_query_filters", &self.ignore_query_filters)
            .field("update", &self.update_expressions)
            .field("return_type", &self.return_type)
            .finish()
    }
}

impl<T> BuildTarget for Specification<T> {
    type Entity = T;

    fn model_mut(&mut self) -> &mut Specification<T> {
        self
    }
}

/// A specification projecting each matched `T` into `R`.
pub struct ProjectedSpecification<T, R> {
    spec: Specification<T>,
    selector: Option<Selector<T, R>>,
}

impl<T, R> ProjectedSpecification<T, R> {
    pub fn new() -> Self {
        Self {
            spec: Specification::new(),
            selector: None,
        }
    }

    pub fn builder() -> SpecificationBuilder<Self> {
        SpecificationBuilder::new(Self::new())
    }

    pub fn spec(&self) -> &Specification<T> {
        &self.spec
    }

    pub fn selector(&self) -> Option<&Selector<T, R>> {
        self.selector.as_ref()
    }

    /// Installs the terminal projection.
    ///
    /// Replacing a selector with one of the same kind is allowed; mixing
    /// `select` and `select_many` fails with
    /// [`SpecError::ConcurrentSelectors`].
    pub(crate) fn set_selector(&mut self, selector: Selector<T, R>) -> Result<()> {
        if let Some(existing) = &self.selector {
            if existing.kind() != selector.kind() {
                return Err(SpecError::ConcurrentSelectors {
                    existing: existing.kind(),
                    attempted: selector.kind(),
                });
            }
        }
        self.selector = Some(selector);
        Ok(())
    }
}

impl<T: Record, R> ProjectedSpecification<T, R> {
    /// Runs the default evaluator chain and the projection in memory.
    ///
    /// Builds the chain per call, like [`Specification::evaluate`].
    pub fn evaluate(&self, items: &[T]) -> Result<Vec<R>> {
        let projected = SpecificationEvaluator::new().evaluate_projected(Query::new(), self)?;
        Ok(projected.load(items))
    }
}

impl<T, R> Default for ProjectedSpecification<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, R> Clone for ProjectedSpecification<T, R> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec.clone(),
            selector: self.selector.clone(),
        }
    }
}

impl<T, R> fmt::Debug for ProjectedSpecification<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectedSpecification")
            .field("spec", &self.spec)
            .field("selector", &self.selector)
            .finish()
    }
}

impl<T, R> Deref for ProjectedSpecification<T, R> {
    type Target = Specification<T>;

    fn deref(&self) -> &Specification<T> {
        &self.spec
    }
}

impl<T, R> BuildTarget for ProjectedSpecification<T, R> {
    type Entity = T;

    fn model_mut(&mut self) -> &mut Specification<T> {
        &mut self.spec
    }
}

/// A specification whose matches receive field assignments.
pub struct UpdateSpecification<T> {
    spec: Specification<T>,
}

impl<T> UpdateSpecification<T> {
    pub fn new() -> Self {
        Self {
            spec: Specification::new(),
        }
    }

    pub fn builder() -> SpecificationBuilder<Self> {
        SpecificationBuilder::new(Self::new())
    }

    pub fn spec(&self) -> &Specification<T> {
        &self.spec
    }

    pub fn assignments(&self) -> &[Assignment<T>] {
        self.spec.update_expressions()
    }
}

impl<T: Record + Clone> UpdateSpecification<T> {
    /// Applies every assignment to one already-fetched record, or none.
    pub fn apply(&self, record: &mut T) -> Result<()> {
        update::apply_all(self.assignments(), record)
    }

    /// Runs the default evaluator chain in memory and updates the matches.
    ///
    /// Returns the number of updated records. On error no record changes.
    /// Builds the chain per call, like [`Specification::evaluate`].
    pub fn execute(&self, items: &mut [T]) -> Result<usize> {
        let query = SpecificationEvaluator::new().evaluate_update(Query::new(), self)?;
        query.execute_update(items)
    }
}

impl<T> Default for UpdateSpecification<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for UpdateSpecification<T> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec.clone(),
        }
    }
}

impl<T> fmt::Debug for UpdateSpecification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UpdateSpecification").field(&self.spec).finish()
    }
}

impl<T> Deref for UpdateSpecification<T> {
    type Target = Specification<T>;

    fn deref(&self) -> &Specification<T> {
        &self.spec
    }
}

impl<T> BuildTarget for UpdateSpecification<T> {
    type Entity = T;

    fn model_mut(&mut self) -> &mut Specification<T> {
        &mut self.spec
    }
}
