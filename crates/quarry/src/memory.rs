//! An in-memory repository.
//!
//! Rows live in insertion order behind a `parking_lot::RwLock`. Reads run
//! the evaluator chain into a [`Query`] plan and execute it over the rows.
//! Writes run on a copy of the table that replaces the original only when
//! every change succeeded, so a failed write leaves the store untouched.
//!
//! Entities read by id are kept in a cache. A cached entity is returned
//! for a specification only after the validator chain and the query
//! filters accept it.
//!
//! Locks are always taken table first, then cache. Readers fill the cache
//! while still holding the table read lock and writers clear it before
//! releasing the write lock, so a row loaded before a write can never be
//! cached after it.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use quarry_id::registry;
use quarry_spec::{
    Criterion, ProjectedSpecification, Query, Queryable, Specification, SpecificationEvaluator,
    SpecificationValidator, UpdateSpecification,
};
use tracing::{debug, trace};

use crate::config::RepositoryConfig;
use crate::entity::{Entity, GeneratedId};
use crate::error::{RepositoryError, Result};
use crate::repository::{duplicate, not_found, ReadRepository, Repository};
use crate::unit_of_work::UnitOfWork;

pub(crate) struct Table<T: Entity> {
    rows: Vec<T>,
    index: HashMap<T::Id, usize>,
}

impl<T: Entity> Table<T> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn get(&self, id: &T::Id) -> Option<&T> {
        self.index.get(id).map(|&i| &self.rows[i])
    }

    pub(crate) fn insert(&mut self, entity: T) -> Result<()> {
        let id = entity.id();
        if self.index.contains_key(&id) {
            return Err(duplicate::<T>(&id));
        }
        self.index.insert(id, self.rows.len());
        self.rows.push(entity);
        Ok(())
    }

    pub(crate) fn replace(&mut self, entity: T) -> Result<()> {
        let id = entity.id();
        let &at = self.index.get(&id).ok_or_else(|| not_found::<T>(&id))?;
        self.rows[at] = entity;
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: &T::Id) -> Result<T> {
        let at = self.index.remove(id).ok_or_else(|| not_found::<T>(id))?;
        let removed = self.rows.remove(at);
        for slot in self.index.values_mut() {
            if *slot > at {
                *slot -= 1;
            }
        }
        Ok(removed)
    }

    /// Runs an update plan, then rebuilds the index since assignments may
    /// have changed ids.
    pub(crate) fn execute_update(&mut self, query: &Query<T>) -> Result<usize> {
        let updated = query.execute_update(&mut self.rows)?;
        if updated > 0 {
            self.reindex()?;
        }
        Ok(updated)
    }

    fn reindex(&mut self) -> Result<()> {
        let mut index = HashMap::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            let id = row.id();
            if index.contains_key(&id) {
                return Err(duplicate::<T>(&id));
            }
            index.insert(id, i);
        }
        self.index = index;
        Ok(())
    }
}

impl<T: Entity> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
            index: self.index.clone(),
        }
    }
}

/// Thread-safe repository over a `Vec<T>`.
///
/// ```
/// use quarry::{InMemoryRepository, ReadRepository, Repository};
/// # use quarry::{Entity, GeneratedId};
/// # use quarry::spec::{Number, Record, Specification, Value};
/// # #[derive(Clone)]
/// # struct Task { id: i64, done: bool }
/// # impl Record for Task {
/// #     fn field_value(&self, field: &str) -> Value<'_> {
/// #         match field {
/// #             "id" => Value::Number(Number::I64(self.id)),
/// #             "done" => Value::Bool(self.done),
/// #             _ => Value::None,
/// #         }
/// #     }
/// # }
/// # impl Entity for Task {
/// #     const TYPE_KEY: &'static str = "task";
/// #     type Id = i64;
/// #     fn id(&self) -> i64 { self.id }
/// # }
/// # impl GeneratedId for Task {}
///
/// let tasks = InMemoryRepository::<Task>::new();
/// tasks.add(Task { id: 1, done: false }).unwrap();
/// tasks.add(Task { id: 2, done: true }).unwrap();
///
/// let open = Specification::<Task>::builder().filter_eq("done", false).build();
/// assert_eq!(tasks.count(&open).unwrap(), 1);
/// assert!(tasks.add(Task { id: 1, done: true }).is_err());
/// ```
pub struct InMemoryRepository<T: Entity> {
    config: RepositoryConfig,
    evaluator: SpecificationEvaluator<T, Query<T>>,
    validator: SpecificationValidator<T>,
    query_filters: Vec<Criterion<T>>,
    table: RwLock<Table<T>>,
    cache: RwLock<HashMap<T::Id, T>>,
}

impl<T: Entity + GeneratedId> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::with_config(RepositoryConfig::default())
    }

    /// A repository whose paging, id filling and caching follow `config`.
    pub fn with_config(config: RepositoryConfig) -> Self {
        Self {
            evaluator: SpecificationEvaluator::with_paging(config.paging()),
            validator: SpecificationValidator::new(),
            query_filters: Vec::new(),
            table: RwLock::new(Table::new()),
            cache: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Replaces the evaluator chain.
    pub fn with_evaluator(mut self, evaluator: SpecificationEvaluator<T, Query<T>>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Replaces the validator chain used for cache-hit verification.
    pub fn with_validator(mut self, validator: SpecificationValidator<T>) -> Self {
        self.validator = validator;
        self
    }

    /// Adds a filter applied to every read unless the specification asks
    /// to ignore query filters.
    pub fn with_query_filter(mut self, criterion: impl Into<Criterion<T>>) -> Self {
        self.query_filters.push(criterion.into());
        self
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    /// Starts a unit of work against this repository.
    pub fn unit_of_work(&self) -> UnitOfWork<'_, T> {
        UnitOfWork::new(self)
    }

    /// The entity with `id`, if it exists and satisfies `spec`.
    ///
    /// A cached copy is returned when the validator chain accepts it and,
    /// unless `spec` ignores them, so do the query filters. Otherwise the
    /// store is queried with the full criteria chain, which also sees custom
    /// evaluators the validators know nothing about. A no-tracking `spec`
    /// never adds to the cache.
    pub fn find_cached(&self, id: &T::Id, spec: &Specification<T>) -> Result<Option<T>> {
        if self.config.cache_entities {
            if let Some(cached) = self.cache.read().get(id) {
                if self.accepts_cached(cached, spec) {
                    trace!(type_key = T::TYPE_KEY, %id, "cache hit");
                    return Ok(Some(cached.clone()));
                }
                trace!(type_key = T::TYPE_KEY, %id, "cached entity rejected");
            }
        }

        let query = self.evaluator.evaluate_criteria(self.base_query(spec)?, spec)?;
        let table = self.table.read();
        let found = query
            .load(&table.rows)
            .into_iter()
            .find(|row| row.id() == *id)
            .cloned();
        if let Some(entity) = &found {
            if !spec.is_as_no_tracking() {
                self.remember(std::slice::from_ref(entity));
            }
        }
        drop(table);
        Ok(found)
    }

    /// Fills the id of `entity` from the configured generator when it
    /// asks for one.
    pub(crate) fn fill_id(&self, entity: &mut T) -> Result<()> {
        if !self.config.fill_ids || !entity.should_have_id_filled() {
            return Ok(());
        }
        let id = match self.config.id_generator {
            Some(key) => registry::generate_with(key)?,
            None => registry::generate()?,
        };
        entity.assign_id(id);
        Ok(())
    }

    pub(crate) fn evaluator(&self) -> &SpecificationEvaluator<T, Query<T>> {
        &self.evaluator
    }

    /// Applies `f` to a copy of the table and swaps it in on success.
    pub(crate) fn transact<R, F>(&self, operation: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Table<T>) -> Result<R>,
    {
        let mut table = self.table.write();
        let mut staged = table.clone();
        let result = f(&mut staged)?;
        let rows = staged.rows.len();
        *table = staged;
        // Any entity may have changed; cached copies are stale.
        self.cache.write().clear();
        drop(table);

        debug!(type_key = T::TYPE_KEY, operation, rows, "committed");
        Ok(result)
    }

    /// A query seeded with the repository's query filters.
    pub(crate) fn base_query(&self, spec: &Specification<T>) -> Result<Query<T>> {
        let mut query = Query::new();
        if spec.ignores_query_filters() {
            return Ok(query);
        }
        for criterion in &self.query_filters {
            query = query.filter(criterion)?;
        }
        Ok(query)
    }

    fn accepts_cached(&self, cached: &T, spec: &Specification<T>) -> bool {
        self.validator.is_valid(cached, spec)
            && (spec.ignores_query_filters()
                || self.query_filters.iter().all(|c| c.is_satisfied_by(cached)))
    }

    /// Call with the table read lock held.
    fn remember(&self, entities: &[T]) {
        if !self.config.cache_entities {
            return;
        }
        let mut cache = self.cache.write();
        for entity in entities {
            cache.insert(entity.id(), entity.clone());
        }
    }

    fn select(&self, spec: &Specification<T>) -> Result<Vec<T>> {
        let query = self.evaluator.evaluate(self.base_query(spec)?, spec)?;
        let table = self.table.read();
        let found: Vec<T> = query.load(&table.rows).into_iter().cloned().collect();
        if !query.is_no_tracking() {
            self.remember(&found);
        }
        Ok(found)
    }
}

impl<T: Entity + GeneratedId> ReadRepository<T> for InMemoryRepository<T> {
    fn get_by_id(&self, id: &T::Id) -> Result<Option<T>> {
        if self.config.cache_entities {
            if let Some(cached) = self.cache.read().get(id) {
                trace!(type_key = T::TYPE_KEY, %id, "cache hit");
                return Ok(Some(cached.clone()));
            }
        }
        let table = self.table.read();
        let found = table.get(id).cloned();
        if let Some(entity) = &found {
            self.remember(std::slice::from_ref(entity));
        }
        Ok(found)
    }

    fn list(&self, spec: &Specification<T>) -> Result<Vec<T>> {
        self.select(spec)
    }

    fn list_projected<R>(&self, spec: &ProjectedSpecification<T, R>) -> Result<Vec<R>> {
        let projected = self
            .evaluator
            .evaluate_projected(self.base_query(spec.spec())?, spec)?;
        let table = self.table.read();
        Ok(projected.load(&table.rows))
    }

    fn first_or_default(&self, spec: &Specification<T>) -> Result<Option<T>> {
        let query = self.evaluator.evaluate(self.base_query(spec)?, spec)?;
        let table = self.table.read();
        Ok(query.first(&table.rows).cloned())
    }

    fn single_or_default(&self, spec: &Specification<T>) -> Result<Option<T>> {
        let mut found = self.select(spec)?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            count => Err(RepositoryError::MultipleResults { count }),
        }
    }

    fn count(&self, spec: &Specification<T>) -> Result<usize> {
        let query = self
            .evaluator
            .evaluate_criteria(self.base_query(spec)?, spec)?;
        let table = self.table.read();
        Ok(query.count(&table.rows))
    }
}

impl<T: Entity + GeneratedId> Repository<T> for InMemoryRepository<T> {
    fn add(&self, mut entity: T) -> Result<T> {
        self.fill_id(&mut entity)?;
        let stored = entity.clone();
        self.transact("add", |table| table.insert(entity))?;
        Ok(stored)
    }

    fn add_range(&self, mut entities: Vec<T>) -> Result<Vec<T>> {
        for entity in &mut entities {
            self.fill_id(entity)?;
        }
        let stored = entities.clone();
        self.transact("add_range", |table| {
            entities.into_iter().try_for_each(|e| table.insert(e))
        })?;
        Ok(stored)
    }

    fn update(&self, entity: T) -> Result<T> {
        let stored = entity.clone();
        self.transact("update", |table| table.replace(entity))?;
        Ok(stored)
    }

    fn delete(&self, id: &T::Id) -> Result<T> {
        self.transact("delete", |table| table.remove(id))
    }

    fn update_where(&self, spec: &UpdateSpecification<T>) -> Result<usize> {
        let query = self
            .evaluator
            .evaluate_update(self.base_query(spec.spec())?, spec)?;
        self.transact("update_where", |table| table.execute_update(&query))
    }
}

impl<T: Entity + GeneratedId> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> fmt::Debug for InMemoryRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("type_key", &T::TYPE_KEY)
            .field("rows", &self.table.read().rows.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
