//! Code generation for synthesized builders.
//!
//! This module uses the `quote` crate to render a [`BuilderPlan`] as the builder
//! struct, its inherent methods, and the `From`/`Default` impls.

use crate::classify::{FieldDescriptor, FieldShape, TypeKind};
use crate::nullability::echo_marker;
use crate::presence::{check_op, clear_op, set_op};
use crate::signature::{backing_signature, bare_signature, storage_signature, value_signature};
use crate::synthesize::{plan_builder, BuilderMember, BuilderPlan, MemberFlags, MemberKind};
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use syn::{parse_quote, DeriveInput, Type};

/// Generates the complete builder implementation for a struct.
pub fn impl_builder(input: &DeriveInput) -> syn::Result<TokenStream> {
    let plan = plan_builder(input)?;
    Ok(emit(&plan))
}

/// Renders a synthesized plan.
pub fn emit(plan: &BuilderPlan) -> TokenStream {
    let builder_struct = generate_builder_struct(plan);
    let builder_constructor = generate_builder_constructor(plan);
    let methods = plan.members.iter().map(|member| generate_member(plan, member));
    let from_impl = generate_from_impl(plan);
    let default_impl = generate_default_impl(plan);

    let builder = &plan.builder;
    let (impl_generics, ty_generics, where_clause) = plan.generics.split_for_impl();

    quote! {
        #builder_struct

        #builder_constructor

        impl #impl_generics #builder #ty_generics #where_clause {
            #(#methods)*
        }

        #from_impl

        #default_impl
    }
}

fn record_type(plan: &BuilderPlan) -> TokenStream {
    let record = &plan.record;
    let (_, ty_generics, _) = plan.generics.split_for_impl();
    quote! { #record #ty_generics }
}

fn builder_type(plan: &BuilderPlan) -> TokenStream {
    let builder = &plan.builder;
    let (_, ty_generics, _) = plan.generics.split_for_impl();
    quote! { #builder #ty_generics }
}

/// Generates the builder struct definition.
fn generate_builder_struct(plan: &BuilderPlan) -> TokenStream {
    let builder = &plan.builder;
    let vis = &plan.vis;
    let generics = &plan.generics;
    let where_clause = &generics.where_clause;
    let presence_field = format_ident!("{}", crate::classify::PRESENCE_FIELD);
    let presence_ty = plan.presence.storage_type();
    let doc = format!(
        "Incrementally assembles a [`{}`]; tracks which fields were explicitly assigned.",
        plan.record
    );

    let builder_fields = plan.fields.iter().map(|field| {
        let name = &field.name;
        let storage = storage_signature(field);
        quote! { #name: #storage }
    });

    quote! {
        #[doc = #doc]
        #vis struct #builder #generics #where_clause {
            #(#builder_fields,)*
            #presence_field: #presence_ty,
        }
    }
}

/// Generates the builder() constructor method on the original struct.
fn generate_builder_constructor(plan: &BuilderPlan) -> TokenStream {
    let record = &plan.record;
    let builder = builder_type(plan);
    let vis = &plan.vis;
    let (impl_generics, ty_generics, where_clause) = plan.generics.split_for_impl();

    quote! {
        impl #impl_generics #record #ty_generics #where_clause {
            /// Returns an empty builder.
            #vis fn builder() -> #builder {
                <#builder>::of()
            }
        }
    }
}

fn generate_member(plan: &BuilderPlan, member: &BuilderMember) -> TokenStream {
    let field = member.field.map(|ordinal| plan.field(ordinal));
    match (member.kind, field) {
        (MemberKind::StaticEmpty, _) => generate_of(plan, member),
        (MemberKind::StaticFromSource, _) => TokenStream::new(),
        (MemberKind::Assembler, _) => generate_build_method(plan, member),
        (MemberKind::Setter, Some(field)) => generate_setter(plan, member, field),
        (MemberKind::Adder, Some(field)) => generate_adder(plan, member, field),
        (MemberKind::AllAdder, Some(field)) => generate_all_adder(plan, member, field),
        (MemberKind::Putter, Some(field)) => generate_putter(plan, member, field),
        (MemberKind::AllPutter, Some(field)) => generate_all_putter(plan, member, field),
        (MemberKind::Getter, Some(field)) => generate_getter(plan, member, field),
        (MemberKind::HasCheck, Some(field)) => generate_has_check(plan, member, field),
        (MemberKind::Clearer, Some(field)) => generate_clearer(plan, member, field),
        (_, None) => TokenStream::new(),
    }
}

fn presence_set(plan: &BuilderPlan, member: &BuilderMember, field: &FieldDescriptor) -> TokenStream {
    if member.flags.contains(MemberFlags::SETS_PRESENCE) {
        let op = set_op(field.ordinal, plan.presence.field_count());
        quote! { #op }
    } else {
        TokenStream::new()
    }
}

/// The store of a container field, created on first use.
fn lazy_store(field: &FieldDescriptor) -> TokenStream {
    let name = &field.name;
    quote! { self.#name.get_or_insert_with(::core::default::Default::default) }
}

fn missing_value(plan: &BuilderPlan, field: &FieldDescriptor) -> TokenStream {
    let record = Literal::string(&plan.record.to_string());
    let label = Literal::string(&field.label());
    quote! { ::record_builder::BuilderError::missing(#record, #label) }
}

fn generate_of(plan: &BuilderPlan, member: &BuilderMember) -> TokenStream {
    let name = &member.name;
    let presence_field = format_ident!("{}", crate::classify::PRESENCE_FIELD);
    let empty_presence = plan.presence.empty_value();
    let initializers = plan.fields.iter().map(|field| {
        let field_name = &field.name;
        let value = empty_value(field);
        quote! { #field_name: #value }
    });

    quote! {
        /// Returns a builder with no field set.
        pub fn #name() -> Self {
            Self {
                #(#initializers,)*
                #presence_field: #empty_presence,
            }
        }
    }
}

/// Value a field holds in a fresh or cleared builder.
fn empty_value(field: &FieldDescriptor) -> TokenStream {
    match field.shape() {
        FieldShape::Primitive(primitive) => primitive.zero_value(),
        _ if field.is_declared_nullable() => quote! { ::core::default::Default::default() },
        _ => quote! { ::core::option::Option::None },
    }
}

fn generate_setter(
    plan: &BuilderPlan,
    member: &BuilderMember,
    field: &FieldDescriptor,
) -> TokenStream {
    let name = &member.name;
    let field_name = &field.name;
    let param_ty = value_signature(&field.ty);
    let value = if member.flags.contains(MemberFlags::CHECKS_ARGUMENT) {
        quote! { ::core::option::Option::Some(value) }
    } else {
        quote! { value }
    };
    let mark = presence_set(plan, member, field);
    let doc = format!("Sets `{}`.", field.label());

    quote! {
        #[doc = #doc]
        pub fn #name(mut self, value: #param_ty) -> Self {
            self.#field_name = #value;
            #mark
            self
        }
    }
}

fn generate_adder(
    plan: &BuilderPlan,
    member: &BuilderMember,
    field: &FieldDescriptor,
) -> TokenStream {
    let FieldShape::Collection { element, shape } = field.shape() else {
        return TokenStream::new();
    };
    let name = &member.name;
    let element_ty = value_signature(element);
    let insert = shape.store().insert_method();
    let store = lazy_store(field);
    let mark = presence_set(plan, member, field);
    let doc = format!("Appends one element to `{}`.", field.label());

    quote! {
        #[doc = #doc]
        pub fn #name(mut self, item: #element_ty) -> Self {
            #store.#insert(item);
            #mark
            self
        }
    }
}

fn generate_all_adder(
    plan: &BuilderPlan,
    member: &BuilderMember,
    field: &FieldDescriptor,
) -> TokenStream {
    let FieldShape::Collection { element, .. } = field.shape() else {
        return TokenStream::new();
    };
    let name = &member.name;
    let element_ty = value_signature(element);
    let store = lazy_store(field);
    let mark = presence_set(plan, member, field);
    let doc = format!(
        "Appends every element of `items` to `{}`; an empty iterator still marks it as set.",
        field.label()
    );

    quote! {
        #[doc = #doc]
        pub fn #name(mut self, items: impl ::core::iter::IntoIterator<Item = #element_ty>) -> Self {
            ::core::iter::Extend::extend(#store, items);
            #mark
            self
        }
    }
}

fn generate_putter(
    plan: &BuilderPlan,
    member: &BuilderMember,
    field: &FieldDescriptor,
) -> TokenStream {
    let FieldShape::Map { key, value, shape } = field.shape() else {
        return TokenStream::new();
    };
    let name = &member.name;
    let key_ty = value_signature(key);
    let value_ty = value_signature(value);
    let insert = shape.store().insert_method();
    let store = lazy_store(field);
    let mark = presence_set(plan, member, field);
    let doc = format!("Inserts one entry into `{}`.", field.label());

    quote! {
        #[doc = #doc]
        pub fn #name(mut self, key: #key_ty, value: #value_ty) -> Self {
            #store.#insert(key, value);
            #mark
            self
        }
    }
}

fn generate_all_putter(
    plan: &BuilderPlan,
    member: &BuilderMember,
    field: &FieldDescriptor,
) -> TokenStream {
    let FieldShape::Map { key, value, .. } = field.shape() else {
        return TokenStream::new();
    };
    let name = &member.name;
    let key_ty = value_signature(key);
    let value_ty = value_signature(value);
    let store = lazy_store(field);
    let mark = presence_set(plan, member, field);
    let doc = format!(
        "Inserts every entry of `entries` into `{}`; an empty iterator still marks it as set.",
        field.label()
    );

    quote! {
        #[doc = #doc]
        pub fn #name(
            mut self,
            entries: impl ::core::iter::IntoIterator<Item = (#key_ty, #value_ty)>,
        ) -> Self {
            ::core::iter::Extend::extend(#store, entries);
            #mark
            self
        }
    }
}

fn generate_getter(
    plan: &BuilderPlan,
    member: &BuilderMember,
    field: &FieldDescriptor,
) -> TokenStream {
    let name = &member.name;
    let field_name = &field.name;

    let (return_ty, body): (Type, TokenStream) = if member.flags.contains(MemberFlags::REQUIRES_VALUE) {
        let target = getter_target(field);
        let missing = missing_value(plan, field);
        (
            parse_quote!(::core::result::Result<&#target, ::record_builder::BuilderError>),
            quote! { self.#field_name.as_ref().ok_or_else(|| #missing) },
        )
    } else if !member.flags.contains(MemberFlags::RAW_RETURN) {
        return TokenStream::new();
    } else if let FieldShape::Primitive(_) = field.shape() {
        (value_signature(&field.ty), quote! { self.#field_name })
    } else if field.is_declared_nullable() {
        let declared = &field.declared;
        (parse_quote!(&#declared), quote! { &self.#field_name })
    } else if let TypeKind::Primitive(_) = field.ty.kind {
        // Option<u32> and friends are Copy.
        (value_signature(&field.ty), quote! { self.#field_name })
    } else {
        let target = getter_target(field);
        let marker = echo_marker(field.ty.marker.as_ref());
        (
            marker.wrap(parse_quote!(&#target)),
            quote! { self.#field_name.as_ref() },
        )
    };
    let doc = if member.flags.contains(MemberFlags::REQUIRES_VALUE) {
        format!(
            "Returns the stored `{}`, or `BuilderError::MissingValue` while it holds nothing.",
            field.label()
        )
    } else {
        format!("Returns the stored `{}`.", field.label())
    };

    quote! {
        #[doc = #doc]
        pub fn #name(&self) -> #return_ty {
            #body
        }
    }
}

/// What a getter borrows: the store for containers, the bare value otherwise.
fn getter_target(field: &FieldDescriptor) -> Type {
    match field.shape() {
        FieldShape::Collection { .. } | FieldShape::Map { .. } => backing_signature(&field.ty),
        _ => bare_signature(&field.ty),
    }
}

fn generate_has_check(
    plan: &BuilderPlan,
    member: &BuilderMember,
    field: &FieldDescriptor,
) -> TokenStream {
    let name = &member.name;
    let check = check_op(field.ordinal, plan.presence.field_count());
    let doc = format!(
        "Whether `{}` was assigned since the builder was created or last cleared.",
        field.label()
    );

    quote! {
        #[doc = #doc]
        pub fn #name(&self) -> bool {
            #check
        }
    }
}

fn generate_clearer(
    plan: &BuilderPlan,
    member: &BuilderMember,
    field: &FieldDescriptor,
) -> TokenStream {
    let name = &member.name;
    let field_name = &field.name;
    let reset = if member.flags.contains(MemberFlags::RESETS_TO_ZERO) {
        let zero = match field.shape() {
            FieldShape::Primitive(primitive) => primitive.zero_value(),
            _ => quote! { ::core::default::Default::default() },
        };
        quote! { self.#field_name = #zero; }
    } else if member.flags.contains(MemberFlags::RESETS_TO_ABSENT) {
        let absent = empty_value(field);
        quote! { self.#field_name = #absent; }
    } else {
        TokenStream::new()
    };
    let unmark = if member.flags.contains(MemberFlags::CLEARS_PRESENCE) {
        let op = clear_op(field.ordinal, plan.presence.field_count());
        quote! { #op }
    } else {
        TokenStream::new()
    };
    let doc = format!("Resets `{}` and marks it as not set.", field.label());

    quote! {
        #[doc = #doc]
        pub fn #name(mut self) -> Self {
            #reset
            #unmark
            self
        }
    }
}

/// Generates the build() method that constructs the original struct.
///
/// Reads stored values only; the presence bitmap plays no part. Each field is
/// moved out the way its getter hands it out: a raw-return getter means the
/// stored value may be absent, and a view-bypassing getter means the store is
/// already the declared container.
fn generate_build_method(plan: &BuilderPlan, member: &BuilderMember) -> TokenStream {
    let name = &member.name;
    let record = &plan.record;
    let record_ty = record_type(plan);

    let field_assignments = plan.fields.iter().map(|field| {
        let field_name = &field.name;
        let getter = plan
            .member_for(field.ordinal, MemberKind::Getter)
            .map_or(MemberFlags::empty(), |getter| getter.flags);
        let raw = getter.contains(MemberFlags::RAW_RETURN);
        let value = match field.shape() {
            FieldShape::Primitive(_) => quote! { self.#field_name },
            FieldShape::Reference if raw => quote! { self.#field_name },
            FieldShape::Reference => {
                let missing = missing_value(plan, field);
                quote! { self.#field_name.ok_or_else(|| #missing)? }
            }
            FieldShape::Collection { .. } | FieldShape::Map { .. } => {
                match (getter.contains(MemberFlags::BYPASSES_VIEW), raw) {
                    (true, true) => quote! { self.#field_name },
                    (true, false) => quote! { self.#field_name.unwrap_or_default() },
                    (false, true) => {
                        quote! { self.#field_name.map(::core::iter::FromIterator::from_iter) }
                    }
                    (false, false) => quote! {
                        ::core::iter::FromIterator::from_iter(self.#field_name.unwrap_or_default())
                    },
                }
            }
        };
        quote! { #field_name: #value }
    });

    quote! {
        /// Assembles the record from the stored values.
        pub fn #name(self) -> ::core::result::Result<#record_ty, ::record_builder::BuilderError> {
            ::core::result::Result::Ok(#record {
                #(#field_assignments,)*
            })
        }
    }
}

/// Generates `From<Record>` for the builder.
///
/// The source is taken by value, so it is never absent. Fields are moved out
/// one by one, which rules out records that implement `Drop`.
fn generate_from_impl(plan: &BuilderPlan) -> TokenStream {
    let Some(from) = plan
        .members
        .iter()
        .find(|member| member.kind == MemberKind::StaticFromSource)
    else {
        return TokenStream::new();
    };
    let record_ty = record_type(plan);
    let builder_ty = builder_type(plan);
    let (impl_generics, _, where_clause) = plan.generics.split_for_impl();
    let method = &from.name;

    let transfers = plan.fields.iter().map(|field| {
        let field_name = &field.name;
        let mutator = [MemberKind::Setter, MemberKind::AllAdder, MemberKind::AllPutter]
            .into_iter()
            .find_map(|kind| plan.member_for(field.ordinal, kind));
        let Some(mutator) = mutator else {
            return TokenStream::new();
        };
        let mutator = &mutator.name;

        match field.shape() {
            FieldShape::Primitive(_) => quote! {
                builder = builder.#mutator(source.#field_name);
            },
            FieldShape::Reference if field.is_nullable => quote! {
                if source.#field_name.is_some() {
                    builder = builder.#mutator(source.#field_name);
                }
            },
            FieldShape::Reference => quote! {
                builder = builder.#mutator(source.#field_name);
            },
            FieldShape::Collection { .. } | FieldShape::Map { .. } if field.is_nullable => quote! {
                if let ::core::option::Option::Some(items) = source.#field_name {
                    builder = builder.#mutator(items);
                }
            },
            FieldShape::Collection { .. } | FieldShape::Map { .. } => quote! {
                builder = builder.#mutator(source.#field_name);
            },
        }
    });

    quote! {
        impl #impl_generics ::core::convert::From<#record_ty> for #builder_ty #where_clause {
            /// Returns a builder holding every present value of `source`.
            #[allow(unused_mut, unused_variables)]
            fn #method(source: #record_ty) -> Self {
                let mut builder = <#builder_ty>::of();
                #(#transfers)*
                builder
            }
        }
    }
}

fn generate_default_impl(plan: &BuilderPlan) -> TokenStream {
    let builder_ty = builder_type(plan);
    let (impl_generics, _, where_clause) = plan.generics.split_for_impl();

    quote! {
        impl #impl_generics ::core::default::Default for #builder_ty #where_clause {
            fn default() -> Self {
                Self::of()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::ToTokens;
    use syn::{ImplItem, ImplItemFn, Item};

    fn expand(tokens: TokenStream) -> syn::File {
        let input: DeriveInput = syn::parse2(tokens).unwrap();
        syn::parse2(impl_builder(&input).unwrap()).unwrap()
    }

    fn method<'a>(file: &'a syn::File, name: &str) -> &'a ImplItemFn {
        file.items
            .iter()
            .filter_map(|item| match item {
                Item::Impl(item_impl) => Some(item_impl),
                _ => None,
            })
            .flat_map(|item_impl| item_impl.items.iter())
            .find_map(|item| match item {
                ImplItem::Fn(f) if f.sig.ident == name => Some(f),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no method named {}", name))
    }

    fn text<T: ToTokens>(node: &T) -> String {
        node.to_token_stream().to_string()
    }

    /// Prints `tokens` the way syn prints a parsed type.
    fn normalized(tokens: TokenStream) -> String {
        text(&syn::parse2::<Type>(tokens).unwrap())
    }

    fn return_type(f: &ImplItemFn) -> String {
        match &f.sig.output {
            syn::ReturnType::Type(_, ty) => text(ty),
            syn::ReturnType::Default => String::new(),
        }
    }

    fn argument_types(f: &ImplItemFn) -> Vec<String> {
        f.sig
            .inputs
            .iter()
            .filter_map(|arg| match arg {
                syn::FnArg::Typed(pat) => Some(text(&pat.ty)),
                syn::FnArg::Receiver(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_impl_builder_generates_code() {
        let input: DeriveInput = syn::parse2(quote! {
            pub struct TestStruct {
                pub field1: String,
                pub field2: i32,
            }
        })
        .unwrap();

        let result = impl_builder(&input);
        assert!(result.is_ok());
    }

    #[test]
    fn test_impl_builder_rejects_enum() {
        let input: DeriveInput = syn::parse2(quote! {
            pub enum TestEnum {
                Variant1,
                Variant2,
            }
        })
        .unwrap();

        let result = impl_builder(&input);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_struct_layout() {
        let file = expand(quote! {
            pub struct Person {
                age: u32,
                name: String,
            }
        });
        let Some(Item::Struct(builder)) = file.items.first() else {
            panic!("expected the builder struct first");
        };
        assert_eq!(builder.ident, "PersonBuilder");
        let fields: Vec<String> = builder
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.ident.as_ref().unwrap(), text(&f.ty)))
            .collect();
        assert_eq!(
            fields,
            vec![
                "age: u32".to_string(),
                format!("name: {}", normalized(quote! { ::core::option::Option<String> })),
                "__presence: u32".to_string(),
            ]
        );
    }

    #[test]
    fn test_setter_signatures_follow_nullability() {
        let file = expand(quote! {
            struct T {
                count: u8,
                name: String,
                nick: std::option::Option<String>,
            }
        });
        assert_eq!(argument_types(method(&file, "set_count")), vec!["u8"]);
        assert_eq!(argument_types(method(&file, "set_name")), vec!["String"]);
        assert_eq!(
            argument_types(method(&file, "set_nick")),
            vec![normalized(quote! { std::option::Option<String> })]
        );
        let body = text(&method(&file, "set_name").block);
        assert!(body.contains("Some (value)"));
    }

    #[test]
    fn test_getter_return_types() {
        let file = expand(quote! {
            struct T {
                count: u8,
                maybe_count: Option<u16>,
                name: String,
                nick: Option<String>,
                #[record_builder(nullable)]
                alias: MaybeName,
                tags: Vec<String>,
                boxed: Box<[u8]>,
            }
        });
        assert_eq!(return_type(method(&file, "get_count")), "u8");
        assert_eq!(
            return_type(method(&file, "get_maybe_count")),
            normalized(quote! { Option<u16> })
        );
        assert_eq!(
            return_type(method(&file, "get_name")),
            normalized(quote! {
                ::core::result::Result<&String, ::record_builder::BuilderError>
            })
        );
        assert_eq!(
            return_type(method(&file, "get_nick")),
            normalized(quote! { Option<&String> })
        );
        assert_eq!(return_type(method(&file, "get_alias")), normalized(quote! { &MaybeName }));
        assert_eq!(
            return_type(method(&file, "get_tags")),
            normalized(quote! {
                ::core::result::Result<&Vec<String>, ::record_builder::BuilderError>
            })
        );
        assert_eq!(
            return_type(method(&file, "get_boxed")),
            normalized(quote! {
                ::core::result::Result<&::std::vec::Vec<u8>, ::record_builder::BuilderError>
            })
        );
    }

    #[test]
    fn test_nested_map_marker_only_on_innermost_element() {
        let file = expand(quote! {
            struct T {
                index: HashMap<String, Vec<Option<String>>>,
            }
        });
        assert_eq!(
            argument_types(method(&file, "put_index")),
            vec![
                "String".to_string(),
                normalized(quote! { Vec<Option<String>> })
            ]
        );
        let getter = return_type(method(&file, "get_index"));
        assert_eq!(
            getter,
            normalized(quote! {
                ::core::result::Result<&HashMap<String, Vec<Option<String>>>, ::record_builder::BuilderError>
            })
        );
        assert_eq!(getter.matches("Option").count(), 1);
    }

    #[test]
    fn test_adders_use_store_insert_method() {
        let file = expand(quote! {
            struct T {
                queue: VecDeque<u8>,
                set: BTreeSet<u8>,
                list: Vec<u8>,
            }
        });
        assert!(text(&method(&file, "add_queue").block).contains("push_back (item)"));
        assert!(text(&method(&file, "add_set").block).contains("insert (item)"));
        assert!(text(&method(&file, "add_list").block).contains("push (item)"));
        assert!(text(&method(&file, "add_all_list").block).contains("Extend :: extend"));
    }

    #[test]
    fn test_build_never_reads_presence() {
        let file = expand(quote! {
            struct T {
                count: u8,
                name: String,
                tags: Vec<String>,
                boxed: Option<Box<[u8]>>,
            }
        });
        let body = text(&method(&file, "build").block);
        assert!(!body.contains("__presence"));
        assert!(body.contains("unwrap_or_default"));
        assert!(body.contains("FromIterator :: from_iter"));
        assert!(body.contains("missing (\"T\" , \"name\")"));
    }

    #[test]
    fn test_rendering_follows_member_flags() {
        let input: DeriveInput = syn::parse2(quote! {
            struct T {
                name: String,
                tags: Vec<String>,
            }
        })
        .unwrap();
        let mut plan = plan_builder(&input).unwrap();

        let file: syn::File = syn::parse2(emit(&plan)).unwrap();
        let build = text(&method(&file, "build").block);
        assert!(build.contains("missing (\"T\" , \"name\")"), "{}", build);
        assert!(!build.contains("FromIterator"), "{}", build);
        assert!(text(&method(&file, "clear_tags").block).contains("tags = :: core :: option :: Option :: None"));

        for member in plan.members.iter_mut() {
            match (member.kind, member.field) {
                (MemberKind::Getter, Some(0)) => member.flags = MemberFlags::RAW_RETURN,
                (MemberKind::Getter, Some(1)) => member.flags.remove(MemberFlags::BYPASSES_VIEW),
                (MemberKind::Clearer, Some(1)) => member.flags.remove(MemberFlags::RESETS_TO_ABSENT),
                _ => {}
            }
        }
        let file: syn::File = syn::parse2(emit(&plan)).unwrap();
        let build = text(&method(&file, "build").block);
        assert!(build.contains("name : self . name"), "{}", build);
        assert!(!build.contains("missing"), "{}", build);
        assert!(build.contains("FromIterator :: from_iter"), "{}", build);
        assert_eq!(
            return_type(method(&file, "get_name")),
            normalized(quote! { ::core::option::Option<&String> })
        );
        let clear = text(&method(&file, "clear_tags").block);
        assert!(!clear.contains("tags ="), "{}", clear);
        assert!(clear.contains("__presence"), "{}", clear);
    }

    #[test]
    fn test_all_putter_is_documented() {
        let file = expand(quote! {
            struct T {
                scores: BTreeMap<String, u32>,
            }
        });
        let docs = method(&file, "put_all_scores")
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("doc"))
            .count();
        assert_eq!(docs, 1);
    }

    #[test]
    fn test_wide_presence_ops() {
        let fields: Vec<TokenStream> = (0..65usize)
            .map(|i| {
                let name = format_ident!("f{}", i);
                quote! { #name: bool }
            })
            .collect();
        let file = expand(quote! { struct Flags { #(#fields,)* } });
        let set = text(&method(&file, "set_f64").block);
        assert!(set.contains("__presence [1] |= (1u64 << 0)"), "{}", set);
        let has = text(&method(&file, "has_f3").block);
        assert!(has.contains("__presence [0] & (1u64 << 3)"), "{}", has);
    }

    #[test]
    fn test_generics_are_carried() {
        let file = expand(quote! {
            pub struct Pair<K: Ord, V> where V: Clone {
                key: K,
                values: Vec<V>,
            }
        });
        let Some(Item::Struct(builder)) = file.items.first() else {
            panic!("expected the builder struct first");
        };
        assert_eq!(builder.generics.params.len(), 2);
        assert!(builder.generics.where_clause.is_some());
        assert_eq!(
            return_type(method(&file, "build")),
            normalized(quote! {
                ::core::result::Result<Pair<K, V>, ::record_builder::BuilderError>
            })
        );
    }

    #[test]
    fn test_raw_identifier_field() {
        let file = expand(quote! {
            struct Token {
                r#type: String,
            }
        });
        let _ = method(&file, "set_type");
        let body = text(&method(&file, "build").block);
        assert!(body.contains("r#type"));
    }
}
