//! Id generation for quarry repositories.
//!
//! - [`IdGenerator`]: anything producing unique `i64` ids
//! - [`Snowflake`]: time-ordered ids from a timestamp, a node id and a
//!   sequence, configured by [`SnowflakeConfig`]
//! - [`registry`]: process-wide generators keyed by number, with a default
//!
//! ```
//! use quarry_id::{registry, Snowflake, SnowflakeConfig};
//!
//! registry::register(1, Snowflake::new(SnowflakeConfig::node(0, 1)).unwrap());
//! let id = registry::generate().unwrap();
//! assert!(id > 0);
//! ```

mod error;
mod generator;
pub mod registry;

pub use error::{IdError, Result};
pub use generator::{
    IdGenerator, Snowflake, SnowflakeConfig, SnowflakeParts, DEFAULT_EPOCH_MILLIS,
};
