//! Repository traits.
//!
//! Reads take a specification and never mutate the store. Writes go
//! through [`Repository`], one entity at a time, or through a
//! [`UnitOfWork`](crate::UnitOfWork) for several changes at once.

use quarry_spec::{ProjectedSpecification, Specification, UpdateSpecification};

use crate::entity::{Entity, EntityKey};
use crate::error::{RepositoryError, Result};

pub trait ReadRepository<T: Entity> {
    fn get_by_id(&self, id: &T::Id) -> Result<Option<T>>;

    /// Like [`get_by_id`](Self::get_by_id), failing with `NotFound` when
    /// the entity is absent.
    fn resolve(&self, id: &T::Id) -> Result<T> {
        self.get_by_id(id)?.ok_or_else(|| not_found::<T>(id))
    }

    fn list(&self, spec: &Specification<T>) -> Result<Vec<T>>;

    fn list_projected<R>(&self, spec: &ProjectedSpecification<T, R>) -> Result<Vec<R>>;

    fn first_or_default(&self, spec: &Specification<T>) -> Result<Option<T>>;

    /// The only match, `None` when nothing matches, `MultipleResults` when
    /// more than one does.
    fn single_or_default(&self, spec: &Specification<T>) -> Result<Option<T>>;

    /// Number of matches, ignoring ordering and paging.
    fn count(&self, spec: &Specification<T>) -> Result<usize>;

    fn any(&self, spec: &Specification<T>) -> Result<bool> {
        Ok(self.count(spec)? > 0)
    }
}

pub trait Repository<T: Entity>: ReadRepository<T> {
    /// Stores a new entity, filling its id first when it asks for one.
    /// Returns the entity as stored.
    fn add(&self, entity: T) -> Result<T>;

    /// Stores every entity or none of them.
    fn add_range(&self, entities: Vec<T>) -> Result<Vec<T>>;

    /// Replaces the stored entity with the same id.
    fn update(&self, entity: T) -> Result<T>;

    /// Removes and returns the entity with `id`.
    fn delete(&self, id: &T::Id) -> Result<T>;

    /// Applies the assignments of `spec` to every match; returns the
    /// number of updated entities.
    fn update_where(&self, spec: &UpdateSpecification<T>) -> Result<usize>;
}

pub(crate) fn not_found<T: Entity>(id: &T::Id) -> RepositoryError {
    RepositoryError::NotFound {
        key: EntityKey::new::<T>(id).to_string(),
    }
}

pub(crate) fn duplicate<T: Entity>(id: &T::Id) -> RepositoryError {
    RepositoryError::DuplicateKey {
        key: EntityKey::new::<T>(id).to_string(),
    }
}
