//! `#[derive(Record)]`: field access for specifications, generated from
//! `#[record(...)]` annotations.

mod attrs;
mod derive;

pub use derive::record_derive_impl;
