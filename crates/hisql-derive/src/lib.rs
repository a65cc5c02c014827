//! Derive macros for hisql
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod entity;

/// Derive the `Entity` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use hisql::Entity;
///
/// #[derive(Debug, Default, Entity)]
/// #[orm(table = "person", key = "id")]
/// struct Person {
///     id: Option<i64>,
///     name: String,
///     #[orm(column = "birthDate")]
///     birth_date: Option<chrono::NaiveDate>,
///     #[orm(skip)]
///     display_name: String,
/// }
/// ```
///
/// # Generated
///
/// - a static `EntityDescriptor` describing table, key and fields
/// - `Entity` impl reading and writing fields through `ToValue` / `FromValue`
/// - an `EntityRegistration` submitted to `inventory` for startup checks
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name
/// - `#[orm(key = "name")]` - Key field or column name
/// - `#[orm(id)]` - Mark the key field (when `key` is not given)
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(skip)]` - Exclude the field from all generated SQL
/// - `#[orm(nullable)]` / `#[orm(not_null)]` - Override nullability (defaults to `Option<T>` detection)
///
/// The struct must implement `Default`; a missing table or key is reported when the
/// entity is first used.
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
