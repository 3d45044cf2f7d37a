//! Type signature reconstruction.
//!
//! Signatures are rebuilt bottom-up from a [`TypeDescriptor`]: inner arguments
//! first, then the container head, then the marker recorded at that position.
//! A marker buried at any depth therefore survives with its original spelling,
//! and no position is ever wrapped twice.

use crate::classify::{FieldDescriptor, InterfaceCategory, TypeDescriptor, TypeKind};
use crate::nullability::NullabilityMarker;
use syn::{parse_quote, GenericArgument, PathArguments, Type};

/// Full signature of a type position, marker included.
pub fn value_signature(ty: &TypeDescriptor) -> Type {
    let bare = bare_signature(ty);
    match &ty.marker {
        Some(marker) => marker.wrap(bare),
        None => bare,
    }
}

/// Signature of a type position without the marker recorded at that position.
pub fn bare_signature(ty: &TypeDescriptor) -> Type {
    match &ty.kind {
        TypeKind::Primitive(_) | TypeKind::Reference => ty.declared.clone(),
        TypeKind::Collection { element, .. } => {
            rebuild(&ty.declared, vec![value_signature(element)])
        }
        TypeKind::Map { key, value, .. } => rebuild(
            &ty.declared,
            vec![value_signature(key), value_signature(value)],
        ),
    }
}

/// The type a builder stores a container in.
///
/// Concrete containers keep their declared head; abstract ones are backed by the
/// default implementation of their category.
pub fn backing_signature(ty: &TypeDescriptor) -> Type {
    match &ty.kind {
        TypeKind::Collection { element, shape } if !shape.is_concrete() => {
            default_head(shape.category, vec![value_signature(element)])
        }
        TypeKind::Map { key, value, shape } if !shape.is_concrete() => default_head(
            InterfaceCategory::Map,
            vec![value_signature(key), value_signature(value)],
        ),
        _ => bare_signature(ty),
    }
}

/// Type of the builder field backing `field`.
///
/// Differs from the record's field type in one respect: a non-primitive field
/// that is not already nullable gains a marker, because the builder may hold
/// nothing for it yet.
pub fn storage_signature(field: &FieldDescriptor) -> Type {
    let ty = &field.ty;
    if let (TypeKind::Primitive(_), None) = (&ty.kind, &ty.marker) {
        return ty.declared.clone();
    }
    let backing = backing_signature(ty);
    match &ty.marker {
        Some(marker) => marker.wrap(backing),
        None if field.is_nullable => backing,
        None => NullabilityMarker::canonical().wrap(backing),
    }
}

fn default_head(category: InterfaceCategory, args: Vec<Type>) -> Type {
    match category {
        InterfaceCategory::List => parse_quote!(::std::vec::Vec<#(#args),*>),
        InterfaceCategory::Set => parse_quote!(::std::collections::HashSet<#(#args),*>),
        InterfaceCategory::Map => parse_quote!(::std::collections::HashMap<#(#args),*>),
    }
}

/// Replaces the leading type arguments of `declared`'s head with `args`.
///
/// Arguments past `args` (hashers, allocators) are kept as declared. A slice
/// argument (`Box<[T]>`) has its element replaced.
fn rebuild(declared: &Type, args: Vec<Type>) -> Type {
    let mut rebuilt = declared.clone();
    if let Type::Path(type_path) = &mut rebuilt {
        if let Some(last) = type_path.path.segments.last_mut() {
            if let PathArguments::AngleBracketed(generics) = &mut last.arguments {
                let mut replacements = args.into_iter();
                for arg in generics.args.iter_mut() {
                    let GenericArgument::Type(slot) = arg else {
                        continue;
                    };
                    let Some(replacement) = replacements.next() else {
                        break;
                    };
                    match slot {
                        Type::Slice(slice) => *slice.elem = replacement,
                        other => *other = replacement,
                    }
                }
            }
        }
    }
    rebuilt
}
