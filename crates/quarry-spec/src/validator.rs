//! In-memory validation of a single entity against a specification.
//!
//! The validator re-checks the criteria part of a specification (filters
//! and search groups) without a query. Includes, ordering and paging have
//! no meaning for one instance and are ignored. A typical use is checking
//! that a cached entity still satisfies the specification it would have
//! been fetched with.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::record::Record;
use crate::search::matches_all_groups;
use crate::specification::Specification;

/// A predicate over `(entity, specification)`.
pub trait Validator<T>: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_valid(&self, entity: &T, spec: &Specification<T>) -> bool;
}

/// Every filter must hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhereValidator;

impl<T: Record> Validator<T> for WhereValidator {
    fn name(&self) -> &'static str {
        "where"
    }

    fn is_valid(&self, entity: &T, spec: &Specification<T>) -> bool {
        spec.where_expressions()
            .iter()
            .all(|c| c.is_satisfied_by(entity))
    }
}

/// Every search group needs at least one matching criterion.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchValidator;

impl<T: Record> Validator<T> for SearchValidator {
    fn name(&self) -> &'static str {
        "search"
    }

    fn is_valid(&self, entity: &T, spec: &Specification<T>) -> bool {
        matches_all_groups(entity, spec.search_criteria())
    }
}

/// A validator backed by a closure.
pub struct FnValidator<F> {
    name: &'static str,
    f: F,
}

impl<T, F> Validator<T> for FnValidator<F>
where
    F: Fn(&T, &Specification<T>) -> bool + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_valid(&self, entity: &T, spec: &Specification<T>) -> bool {
        (self.f)(entity, spec)
    }
}

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnValidator").field(&self.name).finish()
    }
}

/// Wraps a closure as a [`Validator`].
///
/// ```
/// use quarry_spec::{validator_fn, Specification, SpecificationValidator};
///
/// let even = validator_fn("even", |n: &i64, _spec: &Specification<i64>| n % 2 == 0);
/// let validator = SpecificationValidator::empty().with_validator(even);
/// assert!(validator.is_valid(&4, &Specification::new()));
/// assert!(!validator.is_valid(&3, &Specification::new()));
/// ```
pub fn validator_fn<T, F>(name: &'static str, f: F) -> FnValidator<F>
where
    F: Fn(&T, &Specification<T>) -> bool + Send + Sync,
{
    FnValidator { name, f }
}

/// An ordered, short-circuiting list of validators.
pub struct SpecificationValidator<T> {
    validators: Vec<Arc<dyn Validator<T>>>,
}

impl<T: Record> SpecificationValidator<T> {
    /// Where, then search.
    pub fn new() -> Self {
        Self::empty()
            .with_validator(WhereValidator)
            .with_validator(SearchValidator)
    }
}

impl<T> SpecificationValidator<T> {
    /// Accepts every entity until validators are added.
    pub fn empty() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Validator<T> + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn with_shared(mut self, validator: Arc<dyn Validator<T>>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn validators(&self) -> &[Arc<dyn Validator<T>>] {
        &self.validators
    }

    /// Whether `entity` passes every validator. Stops at the first failure.
    pub fn is_valid(&self, entity: &T, spec: &Specification<T>) -> bool {
        self.validators.iter().all(|v| {
            let valid = v.is_valid(entity, spec);
            if !valid {
                trace!(validator = v.name(), "entity rejected");
            }
            valid
        })
    }
}

impl<T: Record> Default for SpecificationValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SpecificationValidator<T> {
    fn clone(&self) -> Self {
        Self {
            validators: self.validators.clone(),
        }
    }
}

impl<T> fmt::Debug for SpecificationValidator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.validators.iter().map(|v| v.name()))
            .finish()
    }
}
