//! Process-wide registry of id generators.
//!
//! Generators are registered under a numeric key at start-up. The first
//! registered generator is the default until [`set_default`] picks another.
//! Repositories read the registry when filling ids of new entities.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{IdError, Result};
use crate::generator::IdGenerator;

#[derive(Default)]
struct Registry {
    generators: BTreeMap<u32, Arc<dyn IdGenerator>>,
    default: Option<u32>,
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::default()));

/// Registers `generator` under `key`, replacing any previous one.
pub fn register<G>(key: u32, generator: G)
where
    G: IdGenerator + 'static,
{
    register_shared(key, Arc::new(generator));
}

pub fn register_shared(key: u32, generator: Arc<dyn IdGenerator>) {
    let mut registry = REGISTRY.write();
    let replaced = registry.generators.insert(key, generator).is_some();
    if registry.default.is_none() {
        registry.default = Some(key);
    }
    debug!(key, replaced, "id generator registered");
}

pub fn get(key: u32) -> Option<Arc<dyn IdGenerator>> {
    REGISTRY.read().generators.get(&key).cloned()
}

pub fn default_generator() -> Option<Arc<dyn IdGenerator>> {
    let registry = REGISTRY.read();
    registry
        .default
        .and_then(|key| registry.generators.get(&key).cloned())
}

pub fn default_key() -> Option<u32> {
    REGISTRY.read().default
}

/// Makes the generator under `key` the default.
pub fn set_default(key: u32) -> Result<()> {
    let mut registry = REGISTRY.write();
    if !registry.generators.contains_key(&key) {
        return Err(IdError::UnknownGenerator(key));
    }
    registry.default = Some(key);
    debug!(key, "default id generator changed");
    Ok(())
}

/// Generates an id with the default generator.
pub fn generate() -> Result<i64> {
    // Clone out of the lock: generators may block on sequence overflow.
    let generator = default_generator().ok_or(IdError::FactoryMissing)?;
    generator.generate_id()
}

/// Generates an id with the generator under `key`.
pub fn generate_with(key: u32) -> Result<i64> {
    let generator = get(key).ok_or(IdError::UnknownGenerator(key))?;
    generator.generate_id()
}

/// Removes every generator.
pub fn clear() {
    let mut registry = REGISTRY.write();
    registry.generators.clear();
    registry.default = None;
    debug!("id generator registry cleared");
}
