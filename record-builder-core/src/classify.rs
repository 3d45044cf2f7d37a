//! Field analysis and type classification.
//!
//! This module turns a struct field into a [`FieldDescriptor`]: its name,
//! position, a recursive [`TypeDescriptor`] of its declared type, and whether the
//! field may hold "absent".

use crate::nullability::{peel, strip_marker, NullabilityMarker};
use crate::parse::{field_options, FamilyHint};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Field, GenericArgument, Ident, PathArguments, Type, TypePath};

/// Name of the builder field holding the presence bitmap.
pub const PRESENCE_FIELD: &str = "__presence";

/// Scalar types with a zero value and no absent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

impl PrimitiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" => PrimitiveKind::Bool,
            "char" => PrimitiveKind::Char,
            "i8" => PrimitiveKind::I8,
            "i16" => PrimitiveKind::I16,
            "i32" => PrimitiveKind::I32,
            "i64" => PrimitiveKind::I64,
            "i128" => PrimitiveKind::I128,
            "isize" => PrimitiveKind::Isize,
            "u8" => PrimitiveKind::U8,
            "u16" => PrimitiveKind::U16,
            "u32" => PrimitiveKind::U32,
            "u64" => PrimitiveKind::U64,
            "u128" => PrimitiveKind::U128,
            "usize" => PrimitiveKind::Usize,
            "f32" => PrimitiveKind::F32,
            "f64" => PrimitiveKind::F64,
            _ => return None,
        };
        Some(kind)
    }

    /// The value a fresh or cleared builder holds for this kind.
    pub fn zero_value(self) -> TokenStream {
        match self {
            PrimitiveKind::Bool => quote! { false },
            PrimitiveKind::Char => quote! { '\0' },
            PrimitiveKind::F32 | PrimitiveKind::F64 => quote! { 0.0 },
            _ => quote! { 0 },
        }
    }
}

/// The family interface a container belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceCategory {
    List,
    Set,
    Map,
}

/// Container types the classifier knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConcreteContainer {
    Vec,
    VecDeque,
    LinkedList,
    BinaryHeap,
    HashSet,
    BTreeSet,
    IndexSet,
    HashMap,
    BTreeMap,
    IndexMap,
}

const CONCRETE_COLLECTIONS: &[(&str, ConcreteContainer)] = &[
    ("Vec", ConcreteContainer::Vec),
    ("VecDeque", ConcreteContainer::VecDeque),
    ("LinkedList", ConcreteContainer::LinkedList),
    ("BinaryHeap", ConcreteContainer::BinaryHeap),
    ("HashSet", ConcreteContainer::HashSet),
    ("BTreeSet", ConcreteContainer::BTreeSet),
    ("IndexSet", ConcreteContainer::IndexSet),
];

const CONCRETE_MAPS: &[(&str, ConcreteContainer)] = &[
    ("HashMap", ConcreteContainer::HashMap),
    ("BTreeMap", ConcreteContainer::BTreeMap),
    ("IndexMap", ConcreteContainer::IndexMap),
];

impl ConcreteContainer {
    pub fn collection_from_name(name: &str) -> Option<Self> {
        lookup(CONCRETE_COLLECTIONS, name)
    }

    pub fn map_from_name(name: &str) -> Option<Self> {
        lookup(CONCRETE_MAPS, name)
    }

    /// Store used behind an abstract container of the given category.
    pub fn default_for(category: InterfaceCategory) -> Self {
        match category {
            InterfaceCategory::List => ConcreteContainer::Vec,
            InterfaceCategory::Set => ConcreteContainer::HashSet,
            InterfaceCategory::Map => ConcreteContainer::HashMap,
        }
    }

    pub fn category(self) -> InterfaceCategory {
        match self {
            ConcreteContainer::Vec
            | ConcreteContainer::VecDeque
            | ConcreteContainer::LinkedList
            | ConcreteContainer::BinaryHeap => InterfaceCategory::List,
            ConcreteContainer::HashSet
            | ConcreteContainer::BTreeSet
            | ConcreteContainer::IndexSet => InterfaceCategory::Set,
            ConcreteContainer::HashMap
            | ConcreteContainer::BTreeMap
            | ConcreteContainer::IndexMap => InterfaceCategory::Map,
        }
    }

    /// Inherent method that stores one element (or one entry for maps).
    pub fn insert_method(self) -> Ident {
        let name = match self {
            ConcreteContainer::Vec | ConcreteContainer::BinaryHeap => "push",
            ConcreteContainer::VecDeque | ConcreteContainer::LinkedList => "push_back",
            _ => "insert",
        };
        format_ident!("{}", name)
    }
}

fn lookup(table: &[(&str, ConcreteContainer)], name: &str) -> Option<ConcreteContainer> {
    table
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, container)| *container)
}

/// Shape details of a collection or map type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerShape {
    /// Set when the declared type is on one of the concrete allow-lists.
    pub concrete: Option<ConcreteContainer>,
    pub declared_name: String,
    pub category: InterfaceCategory,
}

impl ContainerShape {
    fn concrete(container: ConcreteContainer, declared_name: String) -> Self {
        ContainerShape {
            concrete: Some(container),
            declared_name,
            category: container.category(),
        }
    }

    fn abstract_of(category: InterfaceCategory, declared_name: String) -> Self {
        ContainerShape {
            concrete: None,
            declared_name,
            category,
        }
    }

    pub fn is_concrete(&self) -> bool {
        self.concrete.is_some()
    }

    /// The container the builder stores values in.
    pub fn store(&self) -> ConcreteContainer {
        self.concrete
            .unwrap_or_else(|| ConcreteContainer::default_for(self.category))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Reference,
    Collection {
        element: Box<TypeDescriptor>,
        shape: ContainerShape,
    },
    Map {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
        shape: ContainerShape,
    },
}

/// Recursive classification of one type position.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    /// Marker recorded at exactly this position.
    pub marker: Option<NullabilityMarker>,
    /// The declared type at this position, without this position's marker.
    pub declared: Type,
}

impl TypeDescriptor {
    pub fn is_nullable(&self) -> bool {
        self.marker.is_some()
    }
}

/// Classifies a type by name and structure.
pub fn classify(ty: &Type) -> TypeDescriptor {
    classify_with(ty, None)
}

/// Classifies a field's top-level type, honoring an explicit family hint.
pub(crate) fn classify_with(ty: &Type, hint: Option<FamilyHint>) -> TypeDescriptor {
    match strip_marker(ty) {
        Some((marker, inner)) => {
            let mut descriptor = classify_unmarked(peel(inner), hint);
            descriptor.marker = Some(marker);
            descriptor
        }
        None => classify_unmarked(peel(ty), hint),
    }
}

fn classify_unmarked(ty: &Type, hint: Option<FamilyHint>) -> TypeDescriptor {
    let kind = match ty {
        Type::Path(type_path) if type_path.qself.is_none() => classify_path(type_path, hint),
        _ => TypeKind::Reference,
    };
    TypeDescriptor {
        kind,
        marker: None,
        declared: ty.clone(),
    }
}

fn classify_path(type_path: &TypePath, hint: Option<FamilyHint>) -> TypeKind {
    let Some(last) = type_path.path.segments.last() else {
        return TypeKind::Reference;
    };
    let name = last.ident.to_string();

    if is_primitive_path(type_path) {
        if let Some(primitive) = PrimitiveKind::from_name(&name) {
            return TypeKind::Primitive(primitive);
        }
    }

    let args = type_arguments(&last.arguments);

    if let Some(container) = ConcreteContainer::collection_from_name(&name) {
        if let Some(element) = args.first() {
            return TypeKind::Collection {
                element: Box::new(classify(element)),
                shape: ContainerShape::concrete(container, name),
            };
        }
    }
    if let Some(container) = ConcreteContainer::map_from_name(&name) {
        if let [key, value, ..] = args.as_slice() {
            return TypeKind::Map {
                key: Box::new(classify(key)),
                value: Box::new(classify(value)),
                shape: ContainerShape::concrete(container, name),
            };
        }
    }

    // Box<[T]> is a list with no dedicated store type.
    if name == "Box" {
        if let [Type::Slice(slice)] = args.as_slice() {
            return TypeKind::Collection {
                element: Box::new(classify(&slice.elem)),
                shape: ContainerShape::abstract_of(InterfaceCategory::List, name),
            };
        }
    }

    match (hint, args.as_slice()) {
        (Some(FamilyHint::Collection), [element, ..]) => {
            let category = if name.ends_with("Set") {
                InterfaceCategory::Set
            } else {
                InterfaceCategory::List
            };
            TypeKind::Collection {
                element: Box::new(classify(element)),
                shape: ContainerShape::abstract_of(category, name),
            }
        }
        (Some(FamilyHint::Map), [key, value, ..]) => TypeKind::Map {
            key: Box::new(classify(key)),
            value: Box::new(classify(value)),
            shape: ContainerShape::abstract_of(InterfaceCategory::Map, name),
        },
        _ => TypeKind::Reference,
    }
}

/// `u32`, `std::primitive::u32` and `core::primitive::u32` all name a primitive.
fn is_primitive_path(type_path: &TypePath) -> bool {
    let segments: Vec<String> = type_path
        .path
        .segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect();
    let bare = type_path
        .path
        .segments
        .iter()
        .all(|segment| segment.arguments.is_none());
    bare && match segments.as_slice() {
        [_] => type_path.path.leading_colon.is_none(),
        [root, module, _] => (root == "std" || root == "core") && module == "primitive",
        _ => false,
    }
}

fn type_arguments(arguments: &PathArguments) -> Vec<&Type> {
    match arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Information about a field extracted for builder generation.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// The field's identifier
    pub name: Ident,
    /// Declaration position; also the presence-bit index
    pub ordinal: usize,
    /// The field's type as declared
    pub declared: Type,
    pub ty: TypeDescriptor,
    /// True when the field or its top-level type carries a nullability marker
    pub is_nullable: bool,
}

/// How the member policy treats a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldShape<'a> {
    Primitive(PrimitiveKind),
    Reference,
    Collection {
        element: &'a TypeDescriptor,
        shape: &'a ContainerShape,
    },
    Map {
        key: &'a TypeDescriptor,
        value: &'a TypeDescriptor,
        shape: &'a ContainerShape,
    },
}

impl FieldDescriptor {
    /// Analyzes a field and extracts information needed for builder generation.
    pub fn from_field(field: &Field, ordinal: usize) -> syn::Result<Self> {
        let name = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(field, "Field must have a name"))?;
        if name == PRESENCE_FIELD {
            return Err(syn::Error::new_spanned(
                &name,
                format!("`{}` is reserved for the builder's presence bitmap", PRESENCE_FIELD),
            ));
        }

        let options = field_options(field)?;
        let ty = classify_with(&field.ty, options.family);

        if let Some(family) = options.family {
            let matches_family = matches!(
                (family, &ty.kind),
                (FamilyHint::Collection, TypeKind::Collection { .. })
                    | (FamilyHint::Map, TypeKind::Map { .. })
            );
            if !matches_family {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    format!(
                        "`{}` needs a type with {} type argument(s)",
                        family,
                        family.arity()
                    ),
                ));
            }
        }
        if options.nullable && ty.marker.is_none() && !matches!(ty.kind, TypeKind::Reference) {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "`nullable` applies to types that can hold an absent value; \
                 primitives and containers cannot",
            ));
        }

        let is_nullable = options.nullable || ty.is_nullable();
        Ok(FieldDescriptor {
            name,
            ordinal,
            declared: field.ty.clone(),
            ty,
            is_nullable,
        })
    }

    pub fn shape(&self) -> FieldShape<'_> {
        match &self.ty.kind {
            TypeKind::Primitive(primitive) if !self.is_nullable => {
                FieldShape::Primitive(*primitive)
            }
            TypeKind::Primitive(_) | TypeKind::Reference => FieldShape::Reference,
            TypeKind::Collection { element, shape } => FieldShape::Collection { element, shape },
            TypeKind::Map { key, value, shape } => FieldShape::Map { key, value, shape },
        }
    }

    /// Nullable through the field attribute alone, with no marker to echo.
    pub fn is_declared_nullable(&self) -> bool {
        self.is_nullable && self.ty.marker.is_none()
    }

    /// The field name without any raw-identifier prefix.
    pub fn label(&self) -> String {
        let name = self.name.to_string();
        match name.strip_prefix("r#") {
            Some(stripped) => stripped.to_string(),
            None => name,
        }
    }

    /// Builder method name: `prefix_field`.
    pub fn method_name(&self, prefix: &str) -> Ident {
        format_ident!("{}_{}", prefix, self.label())
    }
}
