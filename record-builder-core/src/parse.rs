//! Parsing and validation logic for the RecordBuilder derive.
//!
//! This module checks that the input is an eligible record (a struct with named
//! fields), reads `#[record_builder(...)]` field options, and resolves the field
//! descriptor list in declaration order.

use crate::classify::FieldDescriptor;
use std::fmt;
use syn::{Data, DeriveInput, Field, Fields};

/// Name of the helper attribute.
pub const ATTRIBUTE: &str = "record_builder";

/// Explicit family membership for a type the classifier cannot recognize by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyHint {
    Collection,
    Map,
}

impl FamilyHint {
    /// Number of type arguments the family needs.
    pub fn arity(self) -> usize {
        match self {
            FamilyHint::Collection => 1,
            FamilyHint::Map => 2,
        }
    }
}

impl fmt::Display for FamilyHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FamilyHint::Collection => write!(f, "collection"),
            FamilyHint::Map => write!(f, "map"),
        }
    }
}

/// Options read from `#[record_builder(...)]` on a field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FieldOptions {
    pub nullable: bool,
    pub family: Option<FamilyHint>,
}

/// Validates that the input is a struct with named fields.
///
/// Returns an error if the input is:
/// - An enum
/// - A union
/// - A tuple struct
/// - A unit struct
pub fn validate_struct(input: &DeriveInput) -> syn::Result<()> {
    match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(_) => Ok(()),
            Fields::Unnamed(_) => Err(syn::Error::new_spanned(
                input,
                "RecordBuilder can only be derived for structs with named fields, not tuple structs",
            )),
            Fields::Unit => Err(syn::Error::new_spanned(
                input,
                "RecordBuilder cannot be derived for unit structs",
            )),
        },
        Data::Enum(_) => Err(syn::Error::new_spanned(
            input,
            "RecordBuilder can only be derived for structs, not enums",
        )),
        Data::Union(_) => Err(syn::Error::new_spanned(
            input,
            "RecordBuilder can only be derived for structs, not unions",
        )),
    }
}

/// Extracts the named fields from a struct.
///
/// Assumes the input has already been validated with `validate_struct()`.
pub fn extract_fields(
    input: &DeriveInput,
) -> syn::Result<&syn::punctuated::Punctuated<syn::Field, syn::token::Comma>> {
    match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields_named) => Ok(&fields_named.named),
            _ => Err(syn::Error::new_spanned(input, "Expected named fields")),
        },
        _ => Err(syn::Error::new_spanned(input, "Expected a struct")),
    }
}

/// Reads the `#[record_builder(...)]` options attached to a field.
pub fn field_options(field: &Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident(ATTRIBUTE)) {
        attr.parse_nested_meta(|meta| {
            let family = if meta.path.is_ident("nullable") {
                options.nullable = true;
                return Ok(());
            } else if meta.path.is_ident("collection") {
                FamilyHint::Collection
            } else if meta.path.is_ident("map") {
                FamilyHint::Map
            } else {
                return Err(meta.error(
                    "unsupported record_builder option, expected `nullable`, `collection` or `map`",
                ));
            };
            match options.family {
                Some(existing) if existing != family => Err(meta.error(format!(
                    "`{}` conflicts with `{}` on the same field",
                    family, existing
                ))),
                _ => {
                    options.family = Some(family);
                    Ok(())
                }
            }
        })?;
    }
    Ok(options)
}

/// Resolves every field of a validated record, reporting all field errors at once.
pub fn field_descriptors(input: &DeriveInput) -> syn::Result<Vec<FieldDescriptor>> {
    let fields = extract_fields(input)?;
    let mut descriptors = Vec::with_capacity(fields.len());
    let mut errors: Option<syn::Error> = None;

    for (ordinal, field) in fields.iter().enumerate() {
        match FieldDescriptor::from_field(field, ordinal) {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(error) => match errors.as_mut() {
                Some(combined) => combined.combine(error),
                None => errors = Some(error),
            },
        }
    }

    match errors {
        Some(error) => Err(error),
        None => Ok(descriptors),
    }
}
