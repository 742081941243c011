#![deny(unsafe_code)]

//! Procedural macros for the inscription workspace.
//!
//! - `#[derive(Validate)]`: generate a `validate()` method from field annotations

extern crate proc_macro;

mod validate;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for field-level input validation.
///
/// Generates a `validate(&self) -> Result<(), Vec<String>>` method that
/// checks field constraints at runtime, driven by annotations applied at
/// compile time.
///
/// Supported attributes:
/// - `#[validate(non_empty)]`: string/collection must not be empty
/// - `#[validate(pattern = "regex")]`: string must match the regex; the
///   regex is checked when the macro expands. The consuming crate must depend
///   on `regex`.
/// - `#[validate(nested)]`: field type derives `Validate` too; its messages
///   are prefixed with the field name
///
/// # Example
///
/// ```ignore
/// use inscription_macros::Validate;
///
/// #[derive(Validate)]
/// struct Student {
///     #[validate(non_empty)]
///     pub name: String,
///     #[validate(pattern = r"^\d{8}$")]
///     pub student_id: String,
/// }
/// ```
#[proc_macro_derive(Validate, attributes(validate))]
pub fn derive_validate(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    validate::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
