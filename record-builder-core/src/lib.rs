//! # record-builder-core
//!
//! The builder synthesis engine behind `#[derive(RecordBuilder)]`.
//!
//! A record schema (a struct with named fields) is resolved into field
//! descriptors, each field is classified, and a [`BuilderPlan`] lists the
//! members its builder gets. [`emit`] renders a plan as tokens.
//!
//! ```
//! use record_builder_core::{plan_builder, MemberKind};
//!
//! let input: syn::DeriveInput = syn::parse_quote! {
//!     pub struct Person {
//!         age: u32,
//!         tags: Vec<String>,
//!     }
//! };
//! let plan = plan_builder(&input).unwrap();
//! assert_eq!(plan.builder, "PersonBuilder");
//! assert!(plan.member_for(1, MemberKind::Adder).is_some());
//! assert!(plan.member_for(1, MemberKind::Setter).is_none());
//! ```

pub mod classify;
pub mod emit;
pub mod nullability;
pub mod parse;
pub mod presence;
pub mod signature;
pub mod synthesize;

pub use classify::{classify, FieldDescriptor, FieldShape, TypeDescriptor, TypeKind};
pub use emit::{emit, impl_builder};
pub use nullability::NullabilityMarker;
pub use presence::{PresencePlan, Representation};
pub use synthesize::{
    plan_builder, synthesize_members, BuilderMember, BuilderPlan, MemberFlags, MemberKind,
};
