//! Staged, all-or-none writes.

use std::fmt;

use quarry_spec::{Query, UpdateSpecification};
use tracing::debug;

use crate::entity::{Entity, GeneratedId};
use crate::error::Result;
use crate::memory::InMemoryRepository;

enum Change<T: Entity> {
    Insert(T),
    Update(T),
    Delete(T::Id),
    UpdateWhere(UpdateSpecification<T>),
}

impl<T: Entity> Change<T> {
    fn kind(&self) -> &'static str {
        match self {
            Change::Insert(_) => "insert",
            Change::Update(_) => "update",
            Change::Delete(_) => "delete",
            Change::UpdateWhere(_) => "update_where",
        }
    }
}

/// Counts of applied changes, returned by [`UnitOfWork::commit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Entities changed by `update_where` specifications.
    pub modified: usize,
}

impl CommitSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.deleted + self.modified
    }
}

/// Changes staged against one repository.
///
/// Nothing reaches the repository before [`commit`](Self::commit), which
/// applies the changes in staging order. If any of them fails, none is
/// applied. Dropping a unit of work without committing discards it.
pub struct UnitOfWork<'r, T: Entity + GeneratedId> {
    repository: &'r InMemoryRepository<T>,
    changes: Vec<Change<T>>,
}

impl<'r, T: Entity + GeneratedId> UnitOfWork<'r, T> {
    pub(crate) fn new(repository: &'r InMemoryRepository<T>) -> Self {
        Self {
            repository,
            changes: Vec::new(),
        }
    }

    pub fn insert(&mut self, entity: T) -> &mut Self {
        self.changes.push(Change::Insert(entity));
        self
    }

    pub fn update(&mut self, entity: T) -> &mut Self {
        self.changes.push(Change::Update(entity));
        self
    }

    pub fn delete(&mut self, id: T::Id) -> &mut Self {
        self.changes.push(Change::Delete(id));
        self
    }

    pub fn update_where(&mut self, spec: UpdateSpecification<T>) -> &mut Self {
        self.changes.push(Change::UpdateWhere(spec));
        self
    }

    pub fn pending(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Applies every staged change or none of them.
    ///
    /// Ids are generated and update plans built before the store is
    /// touched, so a failing generator or evaluator also leaves it as is.
    pub fn commit(self) -> Result<CommitSummary> {
        let repository = self.repository;
        let mut staged = Vec::with_capacity(self.changes.len());
        for change in self.changes {
            staged.push(match change {
                Change::Insert(mut entity) => {
                    repository.fill_id(&mut entity)?;
                    Staged::Insert(entity)
                }
                Change::Update(entity) => Staged::Update(entity),
                Change::Delete(id) => Staged::Delete(id),
                Change::UpdateWhere(spec) => {
                    let query = repository
                        .evaluator()
                        .evaluate_update(repository.base_query(spec.spec())?, &spec)?;
                    Staged::Execute(query)
                }
            });
        }

        repository.transact("commit", |table| {
            let mut summary = CommitSummary::default();
            for change in staged {
                match change {
                    Staged::Insert(entity) => {
                        table.insert(entity)?;
                        summary.inserted += 1;
                    }
                    Staged::Update(entity) => {
                        table.replace(entity)?;
                        summary.updated += 1;
                    }
                    Staged::Delete(id) => {
                        table.remove(&id)?;
                        summary.deleted += 1;
                    }
                    Staged::Execute(query) => {
                        summary.modified += table.execute_update(&query)?;
                    }
                }
            }
            Ok(summary)
        })
    }

    /// Discards every staged change.
    pub fn rollback(self) {
        debug!(
            type_key = T::TYPE_KEY,
            discarded = self.changes.len(),
            "unit of work rolled back"
        );
    }
}

enum Staged<T: Entity> {
    Insert(T),
    Update(T),
    Delete(T::Id),
    Execute(Query<T>),
}

impl<T: Entity + GeneratedId> fmt::Debug for UnitOfWork<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("type_key", &T::TYPE_KEY)
            .field(
                "changes",
                &self.changes.iter().map(Change::kind).collect::<Vec<_>>(),
            )
            .finish()
    }
}
