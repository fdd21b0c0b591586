//! Derive macros for eazydb
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod record;
mod sql_ident;

/// Derive `Record` (and the row-decoding traits) for a struct.
///
/// # Example
///
/// ```ignore
/// use eazydb::Record;
///
/// #[derive(Debug, Default, Record)]
/// struct User {
///     #[orm(column = "id")]
///     id: i32,
///     #[orm(column = "name")]
///     name: String,
///     #[orm(column = "email", skip_fake)]
///     email: Option<String>,
///     // not a column
///     visits: u32,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(column = "name")]` - Map the field to a column; untagged fields are ignored
/// - `#[orm(skip_fake)]` - Accepted for compatibility, has no effect
///
/// # Generated
///
/// - `eazydb::Record` - column descriptor and field values, in declaration order
/// - `eazydb::FromRecord` - decode one row; untagged fields use `Default`
/// - `eazydb::FromRowSet` - decode the first row of a result, `NotFound` when empty
///
/// Structs with lifetime parameters only get `Record`.
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
