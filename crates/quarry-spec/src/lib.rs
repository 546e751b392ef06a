//! Quarry specifications - query intent as data.
//!
//! A [`Specification`] describes what to fetch from a repository: filters,
//! search groups, eager-load paths, ordering, paging, execution hints and,
//! for updates, field assignments. It holds no data access itself. Two
//! consumers read it:
//!
//! - the **evaluator chain** ([`SpecificationEvaluator`]) translates it into
//!   calls on a [`Queryable`], one evaluator per concern, in a fixed order
//! - the **validator chain** ([`SpecificationValidator`]) re-checks its
//!   filters and search groups against one already-materialized entity
//!
//! # Quick Start
//!
//! ```rust
//! use quarry_spec::{Number, Op, Record, Specification, Value};
//!
//! struct Task {
//!     name: String,
//!     priority: i64,
//!     archived: bool,
//! }
//!
//! impl Record for Task {
//!     fn field_value(&self, field: &str) -> Value<'_> {
//!         match field {
//!             "name" => Value::String(&self.name),
//!             "priority" => Value::Number(Number::I64(self.priority)),
//!             "archived" => Value::Bool(self.archived),
//!             _ => Value::None,
//!         }
//!     }
//! }
//!
//! let tasks = vec![
//!     Task { name: "Write docs".into(), priority: 3, archived: false },
//!     Task { name: "Fix bug".into(), priority: 5, archived: false },
//!     Task { name: "Old task".into(), priority: 1, archived: true },
//! ];
//!
//! let spec = Specification::<Task>::builder()
//!     .filter("priority", Op::Gte, 3i64)
//!     .filter_eq("archived", false)
//!     .order_by_desc("priority")
//!     .build();
//!
//! let found = spec.evaluate(&tasks).unwrap();
//! assert_eq!(found.len(), 2);
//! assert_eq!(found[0].name, "Fix bug");
//! assert!(!spec.is_satisfied_by(&tasks[2]));
//! ```
//!
//! # Builder States
//!
//! The builder is typed by the last clause appended, so follow-on calls
//! that make no sense do not compile: `then_by` needs a preceding
//! `order_by`, `then_include` an `include`, `or_search` a `search`.
//!
//! # Matching Semantics
//!
//! ```text
//! match = (every filter holds)
//!       ∧ (for every search group, at least one criterion matches)
//! ```
//!
//! Search patterns use SQL `LIKE` syntax (`%` and `_`), case-insensitive
//! and anchored. A missing field never satisfies a clause and a clause
//! whose operand kind differs from the field's never matches.
//!
//! # Field Types and Operators
//!
//! | Type | Operators |
//! |------|-----------|
//! | String | `Eq`, `Ne`, `StartsWith`, `EndsWith`, `Contains`, `Like`, `Regex` |
//! | Number | `Eq`, `Ne`, `Gt`, `Gte`, `Lt`, `Lte` |
//! | Timestamp | `Eq`, `Ne`, `Before`, `After`, `Gt`, `Gte`, `Lt`, `Lte` |
//! | Enum | `Eq`, `Ne`, `In` |
//! | Bool | `Eq`, `Ne`, `Is` |

mod builder;
mod clause;
mod error;
pub mod evaluator;
mod include;
mod op;
mod ordering;
mod queryable;
mod record;
mod search;
mod selector;
mod specification;
mod update;
mod validator;
mod value;

pub use builder::{Base, BuildTarget, Grouped, Included, Ordered, SpecificationBuilder};
pub use clause::{Clause, ClauseValue, Criterion, NumericOperand, Predicate};
pub use error::{Result, SpecError};
pub use evaluator::{Evaluator, PagingEvaluator, ProjectionEvaluator, SpecificationEvaluator};
pub use include::IncludePath;
pub use op::Op;
pub use ordering::{compare_by_keys, compare_values, Dir, OrderBy, OrderExpression, OrderKind};
pub use queryable::{Projected, Query, QueryStep, Queryable};
pub use record::{enum_from_value, Record, RecordEnum, RecordTimestamp};
pub use search::{matches_all_groups, LikePattern, SearchCriteria, SearchGroup};
pub use selector::Selector;
pub use specification::{ProjectedSpecification, ReturnType, Specification, UpdateSpecification};
pub use update::{apply_all, AssignedValue, Assignment};
pub use validator::{
    validator_fn, FnValidator, SearchValidator, SpecificationValidator, Validator, WhereValidator,
};
pub use value::{FieldValue, FromNumber, Number, Timestamp, Value};
