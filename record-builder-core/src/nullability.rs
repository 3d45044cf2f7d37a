//! Nullability markers.
//!
//! A type position may hold "absent" when it is wrapped in `Option`. The wrapper
//! can be spelled several equivalent ways, and the spelling found at a position is
//! echoed back into every generated signature that mentions that position.

use syn::{parse_quote, GenericArgument, Path, PathArguments, PathSegment, Type, TypePath};

/// Equivalent spellings of the `Option` wrapper, in resolution order.
///
/// A leading `::` is ignored when matching.
pub const MARKER_VOCABULARY: &[&[&str]] = &[
    &["Option"],
    &["option", "Option"],
    &["std", "option", "Option"],
    &["core", "option", "Option"],
    &["std", "prelude", "v1", "Option"],
    &["core", "prelude", "v1", "Option"],
    &["std", "prelude", "rust_2021", "Option"],
    &["core", "prelude", "rust_2021", "Option"],
];

/// A nullability marker recorded at one type position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullabilityMarker {
    path: Path,
}

impl NullabilityMarker {
    /// The spelling used when no marker instance can be echoed.
    pub fn canonical() -> Self {
        NullabilityMarker {
            path: parse_quote!(::core::option::Option),
        }
    }

    fn from_declared(path: &Path) -> Self {
        let mut path = path.clone();
        for segment in path.segments.iter_mut() {
            segment.arguments = PathArguments::None;
        }
        NullabilityMarker { path }
    }

    /// The marker path without generic arguments.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Position of this spelling in [`MARKER_VOCABULARY`].
    pub fn vocabulary_index(&self) -> Option<usize> {
        vocabulary_index(&self.path)
    }

    /// The marker as written, e.g. `::core::option::Option`.
    pub fn spelling(&self) -> String {
        let segments: Vec<String> = self
            .path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        let joined = segments.join("::");
        if self.path.leading_colon.is_some() {
            format!("::{}", joined)
        } else {
            joined
        }
    }

    /// Wraps `inner` in this marker: `inner` becomes `Marker<inner>`.
    pub fn wrap(&self, inner: Type) -> Type {
        let mut path = self.path.clone();
        if let Some(last) = path.segments.last_mut() {
            last.arguments = PathArguments::AngleBracketed(parse_quote!(<#inner>));
        }
        Type::Path(TypePath { qself: None, path })
    }
}

/// Removes invisible groups and parentheses around a type.
pub(crate) fn peel(ty: &Type) -> &Type {
    match ty {
        Type::Group(group) => peel(&group.elem),
        Type::Paren(paren) => peel(&paren.elem),
        _ => ty,
    }
}

fn vocabulary_index(path: &Path) -> Option<usize> {
    let idents: Vec<String> = path
        .segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect();
    MARKER_VOCABULARY.iter().position(|spelling| {
        spelling.len() == idents.len()
            && spelling.iter().zip(&idents).all(|(want, have)| *want == have.as_str())
    })
}

/// Splits a marked type into its marker and the type it wraps.
///
/// Only one level is stripped: `Option<Option<T>>` yields the outer marker and
/// `Option<T>` as the wrapped type.
pub fn strip_marker(ty: &Type) -> Option<(NullabilityMarker, &Type)> {
    let Type::Path(type_path) = peel(ty) else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    vocabulary_index(&type_path.path)?;

    let segments: Vec<&PathSegment> = type_path.path.segments.iter().collect();
    let (last, leading) = segments.split_last()?;
    if leading
        .iter()
        .any(|segment| !matches!(segment.arguments, PathArguments::None))
    {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first() {
        Some(GenericArgument::Type(inner)) => {
            Some((NullabilityMarker::from_declared(&type_path.path), inner))
        }
        _ => None,
    }
}

/// Whether a marker is attached at the outermost position of `ty`.
pub fn is_marked(ty: &Type) -> bool {
    strip_marker(ty).is_some()
}

/// Picks the marker to echo for a position: the recorded instance if there is
/// one, the canonical spelling otherwise.
pub fn echo_marker(recorded: Option<&NullabilityMarker>) -> NullabilityMarker {
    recorded.cloned().unwrap_or_else(NullabilityMarker::canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::{quote, ToTokens};

    #[test]
    fn test_every_vocabulary_spelling_is_a_marker() {
        let spellings = [
            quote! { Option<u8> },
            quote! { option::Option<u8> },
            quote! { std::option::Option<u8> },
            quote! { ::core::option::Option<u8> },
            quote! { std::prelude::v1::Option<u8> },
            quote! { core::prelude::v1::Option<u8> },
            quote! { ::std::prelude::rust_2021::Option<u8> },
            quote! { core::prelude::rust_2021::Option<u8> },
        ];
        for tokens in spellings {
            let ty: Type = syn::parse2(tokens).unwrap();
            assert!(is_marked(&ty), "{}", ty.to_token_stream());
        }
    }

    #[test]
    fn test_lookalikes_are_not_markers() {
        for tokens in [
            quote! { Optional<u8> },
            quote! { my::Option<u8> },
            quote! { Option },
            quote! { Vec<Option<u8>> },
        ] {
            let ty: Type = syn::parse2(tokens).unwrap();
            assert!(!is_marked(&ty));
        }
    }

    #[test]
    fn test_arguments_off_the_last_segment_are_not_markers() {
        for tokens in [
            quote! { std::option<u8>::Option<u8> },
            quote! { core<T>::option::Option<u8> },
            quote! { Option<u8, u8> },
            quote! { Option<'a> },
        ] {
            let ty: Type = syn::parse2(tokens).unwrap();
            assert!(strip_marker(&ty).is_none(), "{}", ty.to_token_stream());
        }
    }

    #[test]
    fn test_strip_keeps_declared_spelling() {
        let ty: Type = syn::parse2(quote! { std::option::Option<String> }).unwrap();
        let (marker, inner) = strip_marker(&ty).unwrap();
        assert_eq!(marker.spelling(), "std::option::Option");
        assert_eq!(marker.vocabulary_index(), Some(2));
        assert_eq!(
            inner.to_token_stream().to_string(),
            quote! { String }.to_string()
        );
    }

    #[test]
    fn test_strip_removes_one_level_only() {
        let ty: Type = syn::parse2(quote! { Option<Option<u8>> }).unwrap();
        let (_, inner) = strip_marker(&ty).unwrap();
        assert!(is_marked(inner));
    }

    #[test]
    fn test_echo_falls_back_to_canonical() {
        assert_eq!(echo_marker(None).spelling(), "::core::option::Option");

        let ty: Type = syn::parse2(quote! { Option<u8> }).unwrap();
        let (marker, _) = strip_marker(&ty).unwrap();
        assert_eq!(echo_marker(Some(&marker)).spelling(), "Option");
    }

    #[test]
    fn test_wrap_uses_marker_spelling() {
        let marker = NullabilityMarker::canonical();
        let wrapped = marker.wrap(syn::parse2(quote! { String }).unwrap());
        assert_eq!(
            wrapped.to_token_stream().to_string(),
            quote! { ::core::option::Option<String> }.to_string()
        );
    }
}
