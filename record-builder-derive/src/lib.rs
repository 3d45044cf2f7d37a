//! # record-builder-derive
//!
//! A procedural macro that generates a mutable, presence-tracking builder for an
//! immutable record struct.
//!
//! Use it through the `record-builder` crate, which re-exports the derive and
//! provides the `BuilderError` type the generated code returns.
//!
//! ## Example
//!
//! ```ignore
//! use record_builder::RecordBuilder;
//!
//! #[derive(RecordBuilder, Debug, Clone, PartialEq)]
//! pub struct User {
//!     pub username: String,
//!     pub age: u32,
//!     pub nickname: Option<String>,
//!     pub roles: Vec<String>,
//! }
//!
//! let user = User::builder()
//!     .set_username("alice".to_string())
//!     .set_age(30)
//!     .add_roles("admin".to_string())
//!     .build()
//!     .unwrap();
//! assert_eq!(user.nickname, None);
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives a builder for the annotated struct.
///
/// This macro generates:
/// - A builder struct named `{StructName}Builder` with the record's visibility and generics
/// - `of()`, `Default` and a `builder()` constructor on the original struct
/// - `From<StructName>` for the builder, copying every present value
/// - Per field: a setter (`set_x`), or adders (`add_x`, `add_all_x`) for collections,
///   or putters (`put_x`, `put_all_x`) for maps, plus `get_x`, `has_x` and `clear_x`
/// - A `build()` method that assembles the record from the stored values
///
/// ## Field Handling
///
/// - **Primitives** (`bool`, `char`, integers, floats) start at their zero value and
///   can always be built
/// - **Nullable fields** (`Option<T>` in any of its path spellings) take and return
///   the option as is
/// - **Other fields** must be set before `get_x()` or `build()` succeeds
/// - **Collections and maps** start uninitialized and build as empty when never touched
///
/// ## Limitations
///
/// `From<StructName>` moves every field out of the source record. A record that
/// implements `Drop` cannot be taken apart that way, so deriving on it fails with
/// E0509 inside the generated impl. Fields whose types implement `Drop` are fine.
///
/// ## Field Attributes
///
/// - `#[record_builder(nullable)]`: the field's type is an alias of `Option`
/// - `#[record_builder(collection)]`: the field's type is a collection that
///   implements `FromIterator` and `IntoIterator`
/// - `#[record_builder(map)]`: the same for a map over `(K, V)` pairs
#[proc_macro_derive(RecordBuilder, attributes(record_builder))]
pub fn derive_record_builder(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match record_builder_core::impl_builder(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
