//! Entity identity.
//!
//! Two entities are the same entity when their [`EntityKey`]s are equal:
//! same logical type, same id. Field values play no part.

use std::fmt;
use std::hash::Hash;

use quarry_spec::Record;

/// A record stored by a repository.
pub trait Entity: Record + Clone + Send + Sync + 'static {
    /// Logical type name, shared by every entity of this type.
    const TYPE_KEY: &'static str;

    type Id: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static;

    fn id(&self) -> Self::Id;

    fn key(&self) -> EntityKey {
        EntityKey::new::<Self>(&self.id())
    }
}

/// Identity of one entity across types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    type_key: &'static str,
    id: String,
}

impl EntityKey {
    pub fn new<T: Entity>(id: &T::Id) -> Self {
        Self {
            type_key: T::TYPE_KEY,
            id: id.to_string(),
        }
    }

    pub fn type_key(&self) -> &'static str {
        self.type_key
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_key, self.id)
    }
}

/// Entities whose id comes from an id generator on insert.
///
/// The defaults describe an entity with a natural key that never asks
/// for a generated id.
pub trait GeneratedId {
    /// Whether the id is still unset.
    fn should_have_id_filled(&self) -> bool {
        false
    }

    fn assign_id(&mut self, _id: i64) {}
}
