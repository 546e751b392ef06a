//! Repository configuration.
//!
//! ```yaml
//! strict_paging: true
//! max_take: 500
//! fill_ids: true
//! id_generator: 1
//! cache_entities: true
//! snowflake:
//!   datacenter_id: 1
//!   worker_id: 3
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::Path;

use quarry_id::{registry, Snowflake, SnowflakeConfig};
use quarry_spec::PagingEvaluator;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RepositoryError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Reject paging without ordering instead of logging a warning.
    pub strict_paging: bool,
    /// Upper bound on every `take`; also applied when none is declared.
    pub max_take: Option<usize>,
    /// Generate ids for new entities that ask for one.
    pub fill_ids: bool,
    /// Registry key of the id generator; `None` uses the registry default.
    pub id_generator: Option<u32>,
    /// Keep fetched entities in the repository's cache.
    pub cache_entities: bool,
    /// Node settings for a snowflake generator installed by
    /// [`install_id_generator`](Self::install_id_generator).
    pub snowflake: Option<SnowflakeConfig>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            strict_paging: false,
            max_take: None,
            fill_ids: true,
            id_generator: None,
            cache_entities: true,
            snowflake: None,
        }
    }
}

impl RepositoryConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RepositoryError::Config {
            message: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RepositoryError::Config {
            message: e.to_string(),
        })
    }

    /// Loads a `.yaml`, `.yml` or `.json` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RepositoryError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(RepositoryError::Config {
                message: format!(
                    "unsupported config format '{}' for {}",
                    other.unwrap_or(""),
                    path.display()
                ),
            }),
        }
    }

    /// The paging evaluator matching `strict_paging` and `max_take`.
    pub fn paging(&self) -> PagingEvaluator {
        let paging = if self.strict_paging {
            PagingEvaluator::strict()
        } else {
            PagingEvaluator::lenient()
        };
        paging.with_max_take(self.max_take)
    }

    /// Registers a snowflake generator built from `snowflake` under
    /// `id_generator` (key 0 when unset). Does nothing without a
    /// `snowflake` section.
    pub fn install_id_generator(&self) -> Result<()> {
        let Some(snowflake) = self.snowflake else {
            return Ok(());
        };
        let key = self.id_generator.unwrap_or(0);
        registry::register(key, Snowflake::new(snowflake)?);
        debug!(
            key,
            datacenter_id = snowflake.datacenter_id,
            worker_id = snowflake.worker_id,
            "snowflake generator installed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RepositoryConfig::default();
        assert!(!config.strict_paging);
        assert!(config.fill_ids);
        assert!(config.cache_entities);
        assert_eq!(config.max_take, None);
        assert_eq!(config.paging(), PagingEvaluator::lenient());
    }

    #[test]
    fn yaml_with_missing_keys() {
        let config = RepositoryConfig::from_yaml("strict_paging: true\nmax_take: 100\n").unwrap();
        assert!(config.strict_paging);
        assert_eq!(config.max_take, Some(100));
        assert!(config.fill_ids);
        assert!(config.paging().is_strict());
        assert_eq!(config.paging().max_take(), Some(100));
    }

    #[test]
    fn json_with_snowflake() {
        let config = RepositoryConfig::from_json(
            r#"{"id_generator": 2, "snowflake": {"datacenter_id": 1, "worker_id": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.id_generator, Some(2));
        assert_eq!(config.snowflake, Some(SnowflakeConfig::node(1, 3)));
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let err = RepositoryConfig::from_yaml("max_take: lots").unwrap_err();
        assert!(matches!(err, RepositoryError::Config { .. }));
    }
}
