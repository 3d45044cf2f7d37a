//! Presence bitmap planning.
//!
//! Every builder tracks which fields were explicitly assigned in a packed bitmap,
//! one bit per field at the field's ordinal. The representation depends only on
//! the field count, and every bit operation is a pure function of
//! `(ordinal, field_count)`.

use crate::classify::PRESENCE_FIELD;
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote, ToTokens};
use std::fmt;

/// Largest field count stored in a single `u32`.
pub const SINGLE_WORD_LIMIT: usize = 32;
/// Largest field count stored in a single `u64`.
pub const WIDE_WORD_LIMIT: usize = 64;
pub const BITS_PER_WORD: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// `u32`
    SingleWord,
    /// `u64`
    WideWord,
    /// `[u64; words]`
    WordArray { words: usize },
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::SingleWord => write!(f, "single-word (u32)"),
            Representation::WideWord => write!(f, "wide-word (u64)"),
            Representation::WordArray { words } => write!(f, "word-array ({} x u64)", words),
        }
    }
}

/// Where one field's bit lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitIndex {
    Word(u32),
    Element { word: usize, offset: u32 },
}

impl BitIndex {
    pub fn offset(self) -> u32 {
        match self {
            BitIndex::Word(offset) | BitIndex::Element { offset, .. } => offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresencePlan {
    field_count: usize,
    representation: Representation,
}

/// Chooses the bitmap representation for a schema with `field_count` fields.
pub fn plan(field_count: usize) -> PresencePlan {
    let representation = if field_count <= SINGLE_WORD_LIMIT {
        Representation::SingleWord
    } else if field_count <= WIDE_WORD_LIMIT {
        Representation::WideWord
    } else {
        Representation::WordArray {
            words: field_count.div_ceil(BITS_PER_WORD),
        }
    };
    PresencePlan {
        field_count,
        representation,
    }
}

impl PresencePlan {
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    pub fn representation(&self) -> Representation {
        self.representation
    }

    pub fn bit_index_of(&self, ordinal: usize) -> BitIndex {
        debug_assert!(ordinal < self.field_count.max(1));
        match self.representation {
            Representation::SingleWord | Representation::WideWord => BitIndex::Word(ordinal as u32),
            Representation::WordArray { .. } => BitIndex::Element {
                word: ordinal / BITS_PER_WORD,
                offset: (ordinal % BITS_PER_WORD) as u32,
            },
        }
    }

    /// Type of the builder's bitmap field.
    pub fn storage_type(&self) -> TokenStream {
        match self.representation {
            Representation::SingleWord => quote! { u32 },
            Representation::WideWord => quote! { u64 },
            Representation::WordArray { words } => {
                let words = Literal::usize_unsuffixed(words);
                quote! { [u64; #words] }
            }
        }
    }

    /// Bitmap value with every bit clear.
    pub fn empty_value(&self) -> TokenStream {
        match self.representation {
            Representation::SingleWord | Representation::WideWord => quote! { 0 },
            Representation::WordArray { words } => {
                let words = Literal::usize_unsuffixed(words);
                quote! { [0; #words] }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitAction {
    Set,
    Check,
    Clear,
}

/// One bit operation against the builder's bitmap field.
///
/// Renders as a statement for [`BitAction::Set`] and [`BitAction::Clear`] and as
/// a `bool` expression for [`BitAction::Check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitOp {
    pub action: BitAction,
    pub index: BitIndex,
    /// `u64` words instead of a single `u32`.
    pub wide: bool,
}

impl BitOp {
    fn new(action: BitAction, ordinal: usize, field_count: usize) -> Self {
        let plan = plan(field_count);
        BitOp {
            action,
            index: plan.bit_index_of(ordinal),
            wide: plan.representation != Representation::SingleWord,
        }
    }

    pub fn mask(&self) -> u64 {
        1u64 << self.index.offset()
    }
}

pub fn set_op(ordinal: usize, field_count: usize) -> BitOp {
    BitOp::new(BitAction::Set, ordinal, field_count)
}

pub fn check_op(ordinal: usize, field_count: usize) -> BitOp {
    BitOp::new(BitAction::Check, ordinal, field_count)
}

pub fn clear_op(ordinal: usize, field_count: usize) -> BitOp {
    BitOp::new(BitAction::Clear, ordinal, field_count)
}

impl ToTokens for BitOp {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let field = format_ident!("{}", PRESENCE_FIELD);
        let target = match self.index {
            BitIndex::Word(_) => quote! { self.#field },
            BitIndex::Element { word, .. } => {
                let word = Literal::usize_unsuffixed(word);
                quote! { self.#field[#word] }
            }
        };
        let offset = Literal::u32_unsuffixed(self.index.offset());
        let mask = if self.wide {
            quote! { (1u64 << #offset) }
        } else {
            quote! { (1u32 << #offset) }
        };
        tokens.extend(match self.action {
            BitAction::Set => quote! { #target |= #mask; },
            BitAction::Check => quote! { (#target & #mask) != 0 },
            BitAction::Clear => quote! { #target &= !#mask; },
        });
    }
}
