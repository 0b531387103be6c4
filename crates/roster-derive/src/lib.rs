//! Derive macros for roster
//!
//! Provides `#[derive(FromRow)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_row;

/// Derive `FromRow` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use roster::FromRow;
///
/// #[derive(FromRow)]
/// struct MemberName {
///     #[roster(column = "member_id")]
///     id: i64,
///     username: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[roster(column = "name")]` - Map field to a different column name
#[proc_macro_derive(FromRow, attributes(roster))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
