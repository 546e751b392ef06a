//! # Quarry - specification-driven repositories
//!
//! Callers describe what they want as a [`Specification`](spec::Specification)
//! and hand it to a repository. The repository translates it through an
//! ordered evaluator chain into a query, and re-checks cached entities
//! against it with the validator chain.
//!
//! This crate bundles:
//!
//! - [`spec`]: specifications, the builder, evaluators and validators
//! - [`id`]: snowflake ids and the process-wide generator registry
//! - [`Record`]: the derive macro exposing entity fields to specifications
//! - the repository layer: [`Entity`], [`ReadRepository`], [`Repository`],
//!   [`InMemoryRepository`] and [`UnitOfWork`]
//! - [`RepositoryConfig`], loadable from YAML or JSON
//!
//! ## Example
//!
//! ```rust
//! use quarry::spec::{Number, Record, Specification, UpdateSpecification, Value};
//! use quarry::{Entity, GeneratedId, InMemoryRepository, ReadRepository, Repository};
//!
//! #[derive(Clone)]
//! struct Package {
//!     id: i64,
//!     name: String,
//!     downloads: i64,
//! }
//!
//! impl Record for Package {
//!     fn field_value(&self, field: &str) -> Value<'_> {
//!         match field {
//!             "id" => Value::Number(Number::I64(self.id)),
//!             "name" => Value::String(&self.name),
//!             "downloads" => Value::Number(Number::I64(self.downloads)),
//!             _ => Value::None,
//!         }
//!     }
//!
//!     fn set_field(&mut self, field: &str, value: quarry::spec::FieldValue) -> quarry::spec::Result<()> {
//!         match field {
//!             "downloads" => self.downloads = value.into_number(field)?,
//!             _ => return Err(quarry::spec::SpecError::unknown_field(field)),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Entity for Package {
//!     const TYPE_KEY: &'static str = "package";
//!     type Id = i64;
//!
//!     fn id(&self) -> i64 {
//!         self.id
//!     }
//! }
//!
//! impl GeneratedId for Package {}
//!
//! let packages = InMemoryRepository::<Package>::new();
//! packages.add(Package { id: 1, name: "serde".into(), downloads: 90 }).unwrap();
//! packages.add(Package { id: 2, name: "tokio".into(), downloads: 70 }).unwrap();
//!
//! let popular = Specification::<Package>::builder()
//!     .order_by_desc("downloads")
//!     .take(1)
//!     .build();
//! assert_eq!(packages.list(&popular).unwrap()[0].name, "serde");
//!
//! let reset = UpdateSpecification::<Package>::builder()
//!     .filter_eq("name", "tokio")
//!     .set("downloads", 0i64)
//!     .build();
//! assert_eq!(packages.update_where(&reset).unwrap(), 1);
//! assert_eq!(packages.resolve(&2).unwrap().downloads, 0);
//! ```

mod config;
mod entity;
mod error;
mod memory;
mod repository;
mod unit_of_work;

pub use quarry_id as id;
pub use quarry_macros::Record;
pub use quarry_spec as spec;

pub use config::RepositoryConfig;
pub use entity::{Entity, EntityKey, GeneratedId};
pub use error::{RepositoryError, Result};
pub use memory::InMemoryRepository;
pub use repository::{ReadRepository, Repository};
pub use unit_of_work::{CommitSummary, UnitOfWork};
