//! Derive macros for quarry.
//!
//! - [`Record`]: generates `quarry_spec::Record` from `#[record(...)]` field
//!   annotations, so specifications can read and assign fields by name.
//!
//! The generated code refers to `::quarry_spec`, so crates deriving
//! `Record` depend on `quarry-spec` directly (the `quarry` facade
//! re-exports this macro).

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `quarry_spec::Record` for a struct with named fields.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `String` | String field (Eq, Ne, Contains, StartsWith, EndsWith, Like, Regex) |
/// | `Number` | Numeric field (Eq, Ne, Gt, Gte, Lt, Lte) |
/// | `Timestamp` | Timestamp field, requires `RecordTimestamp` |
/// | `Enum` | Enum field (Eq, Ne, In), requires `RecordEnum` |
/// | `Bool` | Boolean field (Eq, Ne, Is) |
/// | `kind = "..."` | Same as the bare kinds, for keyword spellings such as `"bool"` |
/// | `readonly` | Readable by filters and orderings, rejected by assignments |
/// | `skip` | Not exposed at all |
/// | `rename = "..."` | Name used by specifications instead of the field name |
///
/// Fields without an attribute are not exposed.
///
/// # Generated Code
///
/// 1. One name constant per exposed field (`Package::NAME`), plus `FIELDS`
/// 2. `Record::field_value`
/// 3. `Record::set_field` covering the writable fields
///
/// # Example
///
/// ```ignore
/// use quarry_macros::Record;
/// use quarry_spec::{Op, Specification, UpdateSpecification};
///
/// #[derive(Clone, Record)]
/// struct Package {
///     #[record(Number, readonly)]
///     id: i64,
///
///     #[record(String)]
///     name: String,
///
///     #[record(Bool)]
///     yanked: bool,
///
///     #[record(skip)]
///     checksum: Vec<u8>,
/// }
///
/// let mut packages = vec![
///     Package { id: 1, name: "serde".into(), yanked: false, checksum: vec![] },
///     Package { id: 2, name: "tokio".into(), yanked: false, checksum: vec![] },
/// ];
///
/// let yank = UpdateSpecification::<Package>::builder()
///     .filter_eq(Package::NAME, "tokio")
///     .set(Package::YANKED, true)
///     .build();
/// assert_eq!(yank.execute(&mut packages).unwrap(), 1);
///
/// let live = Specification::<Package>::builder()
///     .filter_eq(Package::YANKED, false)
///     .build();
/// assert_eq!(live.evaluate(&packages).unwrap().len(), 1);
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
