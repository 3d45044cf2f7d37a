//! Builder member synthesis.
//!
//! Decides, per field and in declaration order, which members a builder gets and
//! how each one behaves. The result is a [`BuilderPlan`]: the resolved fields, the
//! presence bitmap plan and the ordered member list the emitter renders.

use crate::classify::{FieldDescriptor, FieldShape};
use crate::parse::{field_descriptors, validate_struct};
use crate::presence::{self, PresencePlan};
use bitflags::bitflags;
use proc_macro2::Span;
use quote::format_ident;
use std::collections::HashMap;
use std::fmt;
use syn::{DeriveInput, Generics, Ident, Visibility};
use tracing::debug;

/// Suffix appended to the record name to name its builder.
pub const BUILDER_SUFFIX: &str = "Builder";

bitflags! {
    /// Behavior of one synthesized member.
    ///
    /// The emitter renders from `CHECKS_ARGUMENT`, `SETS_PRESENCE`,
    /// `CLEARS_PRESENCE`, `REQUIRES_VALUE`, `RAW_RETURN`, `BYPASSES_VIEW` and the
    /// two reset flags. `CHECKS_KEY`, `CHECKS_VALUE`, `CHECKS_SOURCE`, `LAZY_INIT`
    /// and `SKIPS_PRESENCE_CHECK` only describe the member for plan reports: the
    /// parameter types already exclude absence, every container mutator creates
    /// its store on first use, and `build` never reads the bitmap.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u16 {
        /// The single argument must be present; the parameter type has no marker.
        const CHECKS_ARGUMENT = 1 << 0;
        /// The key argument must be present.
        const CHECKS_KEY = 1 << 1;
        /// The value argument must be present.
        const CHECKS_VALUE = 1 << 2;
        /// The iterable or source argument must be present.
        const CHECKS_SOURCE = 1 << 3;
        const SETS_PRESENCE = 1 << 4;
        const CLEARS_PRESENCE = 1 << 5;
        /// Creates the backing store on first use.
        const LAZY_INIT = 1 << 6;
        /// Fails with a missing-value error while nothing is stored.
        const REQUIRES_VALUE = 1 << 7;
        /// Returns the stored value as is.
        const RAW_RETURN = 1 << 8;
        /// The store is the declared container; it is handed out and moved without conversion.
        const BYPASSES_VIEW = 1 << 9;
        const RESETS_TO_ZERO = 1 << 10;
        const RESETS_TO_ABSENT = 1 << 11;
        /// Reads stored values without consulting the presence bitmap.
        const SKIPS_PRESENCE_CHECK = 1 << 12;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Setter,
    Adder,
    AllAdder,
    Putter,
    AllPutter,
    Getter,
    HasCheck,
    Clearer,
    StaticEmpty,
    StaticFromSource,
    Assembler,
}

impl MemberKind {
    /// Method-name prefix for per-field members.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            MemberKind::Setter => Some("set"),
            MemberKind::Adder => Some("add"),
            MemberKind::AllAdder => Some("add_all"),
            MemberKind::Putter => Some("put"),
            MemberKind::AllPutter => Some("put_all"),
            MemberKind::Getter => Some("get"),
            MemberKind::HasCheck => Some("has"),
            MemberKind::Clearer => Some("clear"),
            MemberKind::StaticEmpty | MemberKind::StaticFromSource | MemberKind::Assembler => None,
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemberKind::Setter => "setter",
            MemberKind::Adder => "adder",
            MemberKind::AllAdder => "all-adder",
            MemberKind::Putter => "putter",
            MemberKind::AllPutter => "all-putter",
            MemberKind::Getter => "getter",
            MemberKind::HasCheck => "has-check",
            MemberKind::Clearer => "clearer",
            MemberKind::StaticEmpty => "static-empty",
            MemberKind::StaticFromSource => "static-from-source",
            MemberKind::Assembler => "assembler",
        };
        f.write_str(name)
    }
}

/// One generated operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderMember {
    pub kind: MemberKind,
    /// Ordinal of the field the member operates on.
    pub field: Option<usize>,
    pub name: Ident,
    pub flags: MemberFlags,
}

impl BuilderMember {
    fn for_field(kind: MemberKind, field: &FieldDescriptor, flags: MemberFlags) -> Self {
        let prefix = kind.prefix().unwrap_or_default();
        BuilderMember {
            kind,
            field: Some(field.ordinal),
            name: field.method_name(prefix),
            flags,
        }
    }

    fn for_schema(kind: MemberKind, name: &str, flags: MemberFlags) -> Self {
        BuilderMember {
            kind,
            field: None,
            name: Ident::new(name, Span::call_site()),
            flags,
        }
    }
}

/// Everything the emitter needs to render one builder.
#[derive(Debug, Clone)]
pub struct BuilderPlan {
    pub record: Ident,
    pub builder: Ident,
    pub vis: Visibility,
    pub generics: Generics,
    pub fields: Vec<FieldDescriptor>,
    pub presence: PresencePlan,
    pub members: Vec<BuilderMember>,
}

impl BuilderPlan {
    pub fn field(&self, ordinal: usize) -> &FieldDescriptor {
        &self.fields[ordinal]
    }

    /// The member of `kind` generated for the field at `ordinal`, if any.
    pub fn member_for(&self, ordinal: usize, kind: MemberKind) -> Option<&BuilderMember> {
        self.members
            .iter()
            .find(|member| member.field == Some(ordinal) && member.kind == kind)
    }
}

/// Resolves an eligible record into a builder plan.
pub fn plan_builder(input: &DeriveInput) -> syn::Result<BuilderPlan> {
    validate_struct(input)?;
    let fields = field_descriptors(input)?;
    let members = synthesize_members(&fields);
    check_member_names(input, &members)?;

    let presence = presence::plan(fields.len());
    debug!(
        record = %input.ident,
        fields = fields.len(),
        representation = %presence.representation(),
        members = members.len(),
        "synthesized builder plan"
    );

    Ok(BuilderPlan {
        record: input.ident.clone(),
        builder: format_ident!("{}{}", input.ident, BUILDER_SUFFIX),
        vis: input.vis.clone(),
        generics: input.generics.clone(),
        fields,
        presence,
        members,
    })
}

/// Produces the ordered member list for a schema.
///
/// Order: `of`, `from`, the mutators of every field, then every field's
/// has-check, getter and clearer, and finally `build`.
pub fn synthesize_members(fields: &[FieldDescriptor]) -> Vec<BuilderMember> {
    let mut members = Vec::with_capacity(fields.len() * 5 + 3);
    members.push(BuilderMember::for_schema(
        MemberKind::StaticEmpty,
        "of",
        MemberFlags::empty(),
    ));
    members.push(BuilderMember::for_schema(
        MemberKind::StaticFromSource,
        "from",
        MemberFlags::CHECKS_SOURCE,
    ));

    for field in fields {
        members.extend(mutators(field));
    }
    for field in fields {
        members.push(BuilderMember::for_field(
            MemberKind::HasCheck,
            field,
            MemberFlags::empty(),
        ));
    }
    for field in fields {
        members.push(getter(field));
    }
    for field in fields {
        members.push(clearer(field));
    }

    members.push(BuilderMember::for_schema(
        MemberKind::Assembler,
        "build",
        MemberFlags::SKIPS_PRESENCE_CHECK,
    ));
    members
}

fn mutators(field: &FieldDescriptor) -> Vec<BuilderMember> {
    match field.shape() {
        FieldShape::Primitive(_) => vec![BuilderMember::for_field(
            MemberKind::Setter,
            field,
            MemberFlags::SETS_PRESENCE,
        )],
        FieldShape::Reference => {
            let mut flags = MemberFlags::SETS_PRESENCE;
            flags.set(MemberFlags::CHECKS_ARGUMENT, !field.is_nullable);
            vec![BuilderMember::for_field(MemberKind::Setter, field, flags)]
        }
        FieldShape::Collection { element, .. } => {
            let mut add = MemberFlags::SETS_PRESENCE | MemberFlags::LAZY_INIT;
            add.set(MemberFlags::CHECKS_ARGUMENT, !element.is_nullable());
            vec![
                BuilderMember::for_field(MemberKind::Adder, field, add),
                BuilderMember::for_field(
                    MemberKind::AllAdder,
                    field,
                    MemberFlags::SETS_PRESENCE | MemberFlags::LAZY_INIT | MemberFlags::CHECKS_SOURCE,
                ),
            ]
        }
        FieldShape::Map { key, value, .. } => {
            let mut put = MemberFlags::SETS_PRESENCE | MemberFlags::LAZY_INIT;
            put.set(MemberFlags::CHECKS_KEY, !key.is_nullable());
            put.set(MemberFlags::CHECKS_VALUE, !value.is_nullable());
            vec![
                BuilderMember::for_field(MemberKind::Putter, field, put),
                BuilderMember::for_field(
                    MemberKind::AllPutter,
                    field,
                    MemberFlags::SETS_PRESENCE | MemberFlags::LAZY_INIT | MemberFlags::CHECKS_SOURCE,
                ),
            ]
        }
    }
}

fn getter(field: &FieldDescriptor) -> BuilderMember {
    let mut flags = match field.shape() {
        FieldShape::Primitive(_) => MemberFlags::RAW_RETURN,
        _ if field.is_nullable => MemberFlags::RAW_RETURN,
        _ => MemberFlags::REQUIRES_VALUE,
    };
    if let FieldShape::Collection { shape, .. } | FieldShape::Map { shape, .. } = field.shape() {
        flags.set(MemberFlags::BYPASSES_VIEW, shape.is_concrete());
    }
    BuilderMember::for_field(MemberKind::Getter, field, flags)
}

fn clearer(field: &FieldDescriptor) -> BuilderMember {
    let reset = match field.shape() {
        FieldShape::Primitive(_) => MemberFlags::RESETS_TO_ZERO,
        _ => MemberFlags::RESETS_TO_ABSENT,
    };
    BuilderMember::for_field(
        MemberKind::Clearer,
        field,
        MemberFlags::CLEARS_PRESENCE | reset,
    )
}

/// Two fields can derive the same method name (`x` and `all_x` both give `add_all_x`).
fn check_member_names(input: &DeriveInput, members: &[BuilderMember]) -> syn::Result<()> {
    let mut seen: HashMap<String, &BuilderMember> = HashMap::new();
    for member in members {
        let name = member.name.to_string();
        if let Some(previous) = seen.insert(name.clone(), member) {
            return Err(syn::Error::new_spanned(
                &input.ident,
                format!(
                    "fields produce conflicting builder methods named `{}` ({} and {})",
                    name, previous.kind, member.kind
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::Representation;
    use quote::quote;

    fn plan(tokens: proc_macro2::TokenStream) -> BuilderPlan {
        plan_builder(&syn::parse2(tokens).unwrap()).unwrap()
    }

    fn names(plan: &BuilderPlan) -> Vec<String> {
        plan.members.iter().map(|m| m.name.to_string()).collect()
    }

    #[test]
    fn test_member_order_and_names() {
        let plan = plan(quote! {
            pub struct Person {
                age: u32,
                name: String,
                tags: Vec<String>,
                attrs: HashMap<String, String>,
            }
        });
        assert_eq!(plan.builder, "PersonBuilder");
        assert_eq!(
            names(&plan),
            vec![
                "of", "from", "set_age", "set_name", "add_tags", "add_all_tags", "put_attrs",
                "put_all_attrs", "has_age", "has_name", "has_tags", "has_attrs", "get_age",
                "get_name", "get_tags", "get_attrs", "clear_age", "clear_name", "clear_tags",
                "clear_attrs", "build",
            ]
        );
    }

    #[test]
    fn test_primitive_policy() {
        let plan = plan(quote! { struct T { count: i64 } });
        let setter = plan.member_for(0, MemberKind::Setter).unwrap();
        assert_eq!(setter.flags, MemberFlags::SETS_PRESENCE);
        let getter = plan.member_for(0, MemberKind::Getter).unwrap();
        assert_eq!(getter.flags, MemberFlags::RAW_RETURN);
        let clearer = plan.member_for(0, MemberKind::Clearer).unwrap();
        assert!(clearer.flags.contains(MemberFlags::RESETS_TO_ZERO | MemberFlags::CLEARS_PRESENCE));
    }

    #[test]
    fn test_reference_policy_by_nullability() {
        let plan = plan(quote! {
            struct T {
                required: String,
                optional: Option<String>,
                optional_count: Option<u8>,
            }
        });
        let required = plan.member_for(0, MemberKind::Setter).unwrap();
        assert!(required.flags.contains(MemberFlags::CHECKS_ARGUMENT));
        assert!(plan
            .member_for(0, MemberKind::Getter)
            .unwrap()
            .flags
            .contains(MemberFlags::REQUIRES_VALUE));

        for ordinal in [1, 2] {
            let setter = plan.member_for(ordinal, MemberKind::Setter).unwrap();
            assert_eq!(setter.flags, MemberFlags::SETS_PRESENCE);
            let getter = plan.member_for(ordinal, MemberKind::Getter).unwrap();
            assert_eq!(getter.flags, MemberFlags::RAW_RETURN);
            let clearer = plan.member_for(ordinal, MemberKind::Clearer).unwrap();
            assert!(clearer.flags.contains(MemberFlags::RESETS_TO_ABSENT));
        }
    }

    #[test]
    fn test_collection_policy() {
        let plan = plan(quote! {
            struct T {
                strict: Vec<String>,
                loose: Option<Box<[Option<String>]>>,
            }
        });
        assert!(plan.member_for(0, MemberKind::Setter).is_none());

        let add = plan.member_for(0, MemberKind::Adder).unwrap();
        assert!(add.flags.contains(MemberFlags::CHECKS_ARGUMENT | MemberFlags::LAZY_INIT));
        let add_all = plan.member_for(0, MemberKind::AllAdder).unwrap();
        assert!(add_all.flags.contains(MemberFlags::CHECKS_SOURCE | MemberFlags::SETS_PRESENCE));
        let get = plan.member_for(0, MemberKind::Getter).unwrap();
        assert_eq!(get.flags, MemberFlags::REQUIRES_VALUE | MemberFlags::BYPASSES_VIEW);

        let add_loose = plan.member_for(1, MemberKind::Adder).unwrap();
        assert!(!add_loose.flags.contains(MemberFlags::CHECKS_ARGUMENT));
        let get_loose = plan.member_for(1, MemberKind::Getter).unwrap();
        assert_eq!(get_loose.flags, MemberFlags::RAW_RETURN);
    }

    #[test]
    fn test_map_policy_checks_key_and_value_separately() {
        let plan = plan(quote! {
            struct T {
                attrs: BTreeMap<String, Option<u32>>,
            }
        });
        let put = plan.member_for(0, MemberKind::Putter).unwrap();
        assert!(put.flags.contains(MemberFlags::CHECKS_KEY));
        assert!(!put.flags.contains(MemberFlags::CHECKS_VALUE));
        assert!(plan.member_for(0, MemberKind::AllPutter).is_some());
        assert!(plan.member_for(0, MemberKind::Setter).is_none());
    }

    #[test]
    fn test_presence_plan_follows_field_count() {
        let fields: Vec<proc_macro2::TokenStream> = (0..65usize)
            .map(|i| {
                let name = format_ident!("f{}", i);
                quote! { #name: bool }
            })
            .collect();
        let plan = plan(quote! { struct Wide { #(#fields,)* } });
        assert_eq!(plan.presence.representation(), Representation::WordArray { words: 2 });
        assert_eq!(plan.members.len(), 65 * 4 + 3);
    }

    #[test]
    fn test_conflicting_method_names_are_rejected() {
        let input: DeriveInput = syn::parse2(quote! {
            struct T {
                x: Vec<u8>,
                all_x: Vec<u8>,
            }
        })
        .unwrap();
        let err = plan_builder(&input).unwrap_err();
        assert!(err.to_string().contains("add_all_x"));
    }

    #[test]
    fn test_ineligible_schema_is_rejected() {
        let input: DeriveInput = syn::parse2(quote! { struct T(u8); }).unwrap();
        assert!(plan_builder(&input).is_err());
    }
}
