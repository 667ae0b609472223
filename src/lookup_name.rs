// Copyright (C) 2024 Parity Technologies (UK) Ltd. (admin@parity.io)
// This file is a part of the scale-metadata-codec crate.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//         http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A [`LookupName`] is a concrete type name, as found in pre-V14 metadata, which is resolved
//! against a [`crate::TypeRegistry`] to find out the shape of the type.
//!
//! Legacy metadata type names are Rust source snippets, so besides plain names, tuples and
//! arrays, a few other forms are understood and normalized:
//!
//! - `T::Balance` and `<T as Trait<I>>::Balance` are both just `Balance`.
//! - `&'static [T]` and `[T]` are both `Vec<T>`, and `&'static str` is `str`.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use smallstr::SmallString;

pub use parser::{ParseError, ParseErrorKind};

/// A type name to resolve. Construct one with [`LookupName::parse()`].
///
/// # Example
///
/// ```rust
/// use scale_metadata_codec::LookupName;
///
/// let balances = LookupName::parse("Vec<(AccountId, Balance)>").unwrap();
/// assert_eq!(balances.to_string(), "Vec<(AccountId, Balance)>");
///
/// // Slices and references are named by what they encode as:
/// let slice = LookupName::parse("&'static [u8]").unwrap();
/// assert_eq!(slice.to_string(), "Vec<u8>");
///
/// // Associated types are named by the associated type alone:
/// let assoc = LookupName::parse("<T as Trait<I>>::Balance").unwrap();
/// assert_eq!(assoc.to_string(), "Balance");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LookupName {
    def: LookupNameDef,
    // Types registered for this pallet are preferred when resolving.
    pallet: Option<String>,
}

impl core::fmt::Debug for LookupName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.def)
    }
}

impl core::fmt::Display for LookupName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.def)
    }
}

impl core::str::FromStr for LookupName {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for LookupName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.def)
    }
}

impl<'de> serde::Deserialize<'de> for LookupName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <Cow<'de, str>>::deserialize(deserializer)?;
        LookupName::parse(&s).map_err(|e| {
            serde::de::Error::custom(format!("'{s}' is not a valid type name to look up: {e}"))
        })
    }
}

impl LookupName {
    /// Parse a type name like `Vec<T::Balance>` or `[u8; 32]`.
    pub fn parse(input: &str) -> Result<LookupName, ParseError> {
        let def = parser::parse_complete(input)?;
        Ok(LookupName { def, pallet: None })
    }

    /// Resolve this name from within the given pallet, so that types registered for that
    /// pallet are found first.
    pub fn in_pallet(mut self, pallet: impl Into<String>) -> LookupName {
        self.pallet = Some(pallet.into());
        self
    }

    /// The pallet this name is resolved from within, if any.
    pub fn pallet(&self) -> Option<&str> {
        self.pallet.as_deref()
    }

    pub(crate) fn take_pallet(&mut self) -> Option<String> {
        self.pallet.take()
    }

    /// A [`LookupName`] with the given definition and no pallet scope.
    pub fn from_def(def: LookupNameDef) -> LookupName {
        LookupName { def, pallet: None }
    }

    /// The parsed name.
    pub fn def(&self) -> &LookupNameDef {
        &self.def
    }

    /// Build a [`LookupName`] from a definition, in the same pallet scope as this one.
    pub(crate) fn with_def(&self, def: LookupNameDef) -> LookupName {
        LookupName { def, pallet: self.pallet.clone() }
    }

    /// Replace every parameterless name `ident` with `replacement`, eg to turn `Vec<T>` into
    /// `Vec<u32>`.
    pub(crate) fn with_substitution(self, ident: &str, replacement: &LookupNameDef) -> Self {
        self.with_substitutions(&[(ident, replacement)])
    }

    /// Like [`LookupName::with_substitution()`], but replaces several idents at once. The
    /// replacements are not themselves searched for idents.
    pub(crate) fn with_substitutions(mut self, mapping: &[(&str, &LookupNameDef)]) -> Self {
        if !mapping.is_empty() {
            self.def = self.def.substitute(mapping);
        }
        self
    }
}

// Internal string type; most type names are short.
type NameStr = SmallString<[u8; 16]>;

/// A parsed type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupNameDef {
    /// A path with optional generics, like `u8`, `Foo` or `a::b::Bar<A, B>`.
    Named {
        /// The path, eg `Vec` or `a::b::Bar`.
        name: NameStr,
        /// Generic parameters.
        params: Vec<LookupNameDef>,
    },
    /// A tuple like `()` or `(Foo, Bar<A>)`.
    Unnamed {
        /// The tuple elements.
        params: Vec<LookupNameDef>,
    },
    /// A fixed length array like `[u8; 32]`.
    Array {
        /// The element type.
        param: alloc::boxed::Box<LookupNameDef>,
        /// How many elements.
        length: usize,
    },
}

impl LookupNameDef {
    /// A named type with no generic parameters.
    pub fn named(name: &str) -> Self {
        LookupNameDef::Named { name: NameStr::from_str(name), params: Vec::new() }
    }

    /// A named type with some generic parameters.
    pub fn generic(name: &str, params: Vec<LookupNameDef>) -> Self {
        LookupNameDef::Named { name: NameStr::from_str(name), params }
    }

    /// A tuple type.
    pub fn tuple(params: Vec<LookupNameDef>) -> Self {
        LookupNameDef::Unnamed { params }
    }

    /// A fixed length array type.
    pub fn array(param: LookupNameDef, length: usize) -> Self {
        LookupNameDef::Array { param: alloc::boxed::Box::new(param), length }
    }

    /// The name, if this is a named type.
    pub fn name(&self) -> Option<&str> {
        match self {
            LookupNameDef::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    fn substitute(self, mapping: &[(&str, &LookupNameDef)]) -> LookupNameDef {
        let sub_all = |params: Vec<LookupNameDef>| {
            params.into_iter().map(|p| p.substitute(mapping)).collect()
        };
        match self {
            LookupNameDef::Named { name, params } if params.is_empty() => {
                match mapping.iter().find(|(ident, _)| name.as_str() == *ident) {
                    Some((_, replacement)) => (*replacement).clone(),
                    None => LookupNameDef::Named { name, params },
                }
            }
            LookupNameDef::Named { name, params } => {
                LookupNameDef::Named { name, params: sub_all(params) }
            }
            LookupNameDef::Unnamed { params } => LookupNameDef::Unnamed { params: sub_all(params) },
            LookupNameDef::Array { param, length } => LookupNameDef::Array {
                param: alloc::boxed::Box::new(param.substitute(mapping)),
                length,
            },
        }
    }
}

impl core::fmt::Display for LookupNameDef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fn write_params(
            f: &mut core::fmt::Formatter<'_>,
            params: &[LookupNameDef],
        ) -> core::fmt::Result {
            for (idx, param) in params.iter().enumerate() {
                if idx != 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{param}")?;
            }
            Ok(())
        }

        match self {
            LookupNameDef::Named { name, params } => {
                write!(f, "{name}")?;
                if !params.is_empty() {
                    write!(f, "<")?;
                    write_params(f, params)?;
                    write!(f, ">")?;
                }
            }
            LookupNameDef::Unnamed { params } => {
                write!(f, "(")?;
                write_params(f, params)?;
                write!(f, ")")?;
            }
            LookupNameDef::Array { param, length } => {
                write!(f, "[{param}; {length}]")?;
            }
        }
        Ok(())
    }
}

mod parser {
    use super::*;
    use alloc::boxed::Box;
    use yap::{types::StrTokens, IntoTokens, TokenLocation, Tokens};

    /// Where and why a string could not be parsed into a [`LookupName`].
    #[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
    #[display(fmt = "Cannot parse type name (at character {loc}): {err}")]
    pub struct ParseError {
        /// The character offset at which parsing failed.
        pub loc: usize,
        /// What went wrong.
        pub err: ParseErrorKind,
    }

    #[cfg(feature = "std")]
    impl std::error::Error for ParseError {}

    impl ParseError {
        pub(crate) fn new_at(err: ParseErrorKind, loc: usize) -> Self {
            ParseError { loc, err }
        }
    }

    /// The reason a [`LookupName`] could not be parsed.
    #[allow(missing_docs)]
    #[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
    pub enum ParseErrorKind {
        #[display(fmt = "Expected a type name.")]
        InvalidName,
        #[display(fmt = "Tuple is missing its closing `)`.")]
        ClosingParenMissing,
        #[display(fmt = "Generic parameters are missing their closing `>`.")]
        ClosingAngleBracketMissing,
        #[display(fmt = "Array or slice is missing its closing `]`.")]
        ClosingSquareBracketMissing,
        #[display(fmt = "Array length must be an unsigned integer.")]
        InvalidUnsignedInt,
        #[display(fmt = "Expected `as` in a qualified path like `<T as Trait>::Name`.")]
        ExpectedAs,
        #[display(fmt = "Expected `::Name` after a qualified path like `<T as Trait>`.")]
        ExpectedAssociatedName,
        #[display(fmt = "Unexpected characters after the type name.")]
        TrailingInput,
    }

    type Parsed = Option<Result<LookupNameDef, ParseError>>;

    pub fn parse_complete(input: &str) -> Result<LookupNameDef, ParseError> {
        let mut tokens = input.into_tokens();
        skip_whitespace(&mut tokens);
        let def = parse_type_name(&mut tokens)?;
        skip_whitespace(&mut tokens);
        match tokens.remaining() {
            "" => Ok(def),
            _ => Err(ParseError::new_at(ParseErrorKind::TrailingInput, offset(&tokens))),
        }
    }

    fn parse_type_name(input: &mut StrTokens<'_>) -> Result<LookupNameDef, ParseError> {
        let at = offset(input);
        try_parse_type_name(input)
            .unwrap_or_else(|| Err(ParseError::new_at(ParseErrorKind::InvalidName, at)))
    }

    // None if the input doesn't start like any type name.
    fn try_parse_type_name(input: &mut StrTokens<'_>) -> Parsed {
        yap::one_of!(input;
            parse_tuple(input),
            parse_array_or_slice(input),
            parse_reference(input),
            parse_qualified_path(input),
            parse_named(input),
        )
    }

    // `bool`, `T::Balance`, `Vec<u8>`, `a::b::Foo<A, B>`.
    fn parse_named(input: &mut StrTokens<'_>) -> Parsed {
        let path = parse_path(input);
        if path.is_empty() {
            return None;
        }
        let name = path.strip_prefix("T::").unwrap_or(path);

        skip_whitespace(input);
        if !input.token('<') {
            return Some(Ok(LookupNameDef::named(name)));
        }
        let params = parse_list(input, '>', ParseErrorKind::ClosingAngleBracketMissing);
        Some(params.map(|params| LookupNameDef::generic(name, params)))
    }

    // `()`, `(A,)`, `(A, B<C>)`.
    fn parse_tuple(input: &mut StrTokens<'_>) -> Parsed {
        if !input.token('(') {
            return None;
        }
        let params = parse_list(input, ')', ParseErrorKind::ClosingParenMissing);
        Some(params.map(LookupNameDef::tuple))
    }

    // `[T; N]` is an array. A slice `[T]` encodes like `Vec<T>`, so it becomes one.
    fn parse_array_or_slice(input: &mut StrTokens<'_>) -> Parsed {
        if !input.token('[') {
            return None;
        }
        Some(array_or_slice_body(input))
    }

    fn array_or_slice_body(input: &mut StrTokens<'_>) -> Result<LookupNameDef, ParseError> {
        skip_whitespace(input);
        let param = parse_type_name(input)?;
        skip_whitespace(input);
        if input.token(']') {
            return Ok(LookupNameDef::generic("Vec", alloc::vec![param]));
        }

        expect(input, ";", ParseErrorKind::ClosingSquareBracketMissing)?;
        skip_whitespace(input);
        let at = offset(input);
        let digits = str_slice_from(input, |toks| {
            toks.skip_while(|c| c.is_ascii_digit());
        });
        let length = digits
            .parse::<usize>()
            .map_err(|_| ParseError::new_at(ParseErrorKind::InvalidUnsignedInt, at))?;

        skip_whitespace(input);
        expect(input, "]", ParseErrorKind::ClosingSquareBracketMissing)?;
        Ok(LookupNameDef::Array { param: Box::new(param), length })
    }

    // `&T`, `&'a T`, `&'static [u8]`. These encode as `T`.
    fn parse_reference(input: &mut StrTokens<'_>) -> Parsed {
        if !input.token('&') {
            return None;
        }
        skip_whitespace(input);
        if input.token('\'') {
            input.skip_while(|c| c.is_alphanumeric() || *c == '_');
            skip_whitespace(input);
        }
        Some(parse_type_name(input))
    }

    // `<T as Trait<I>>::Balance` is just `Balance`.
    fn parse_qualified_path(input: &mut StrTokens<'_>) -> Parsed {
        if !input.token('<') {
            return None;
        }
        Some(qualified_path_body(input))
    }

    fn qualified_path_body(input: &mut StrTokens<'_>) -> Result<LookupNameDef, ParseError> {
        skip_whitespace(input);
        parse_type_name(input)?;
        skip_whitespace(input);
        expect(input, "as", ParseErrorKind::ExpectedAs)?;
        skip_whitespace(input);
        parse_type_name(input)?;
        skip_whitespace(input);
        expect(input, ">", ParseErrorKind::ClosingAngleBracketMissing)?;

        let at = offset(input);
        expect(input, "::", ParseErrorKind::ExpectedAssociatedName)?;
        parse_named(input)
            .unwrap_or_else(|| Err(ParseError::new_at(ParseErrorKind::ExpectedAssociatedName, at)))
    }

    // Comma separated type names up to and including `close`. A trailing comma is fine.
    fn parse_list(
        input: &mut StrTokens<'_>,
        close: char,
        missing: ParseErrorKind,
    ) -> Result<Vec<LookupNameDef>, ParseError> {
        let mut items = Vec::new();
        loop {
            skip_whitespace(input);
            if input.token(close) {
                return Ok(items);
            }
            match try_parse_type_name(input) {
                Some(item) => items.push(item?),
                None => return Err(ParseError::new_at(missing, offset(input))),
            }
            skip_whitespace(input);
            if !input.token(',') {
                let mut close_str = [0u8; 4];
                return expect(input, close.encode_utf8(&mut close_str), missing).map(|_| items);
            }
        }
    }

    // An identifier, or several joined with `::`. Empty if there is none here.
    fn parse_path<'a>(input: &mut StrTokens<'a>) -> &'a str {
        fn starts_ident(toks: &mut StrTokens<'_>) -> bool {
            toks.peek().map_or(false, |c| c.is_alphabetic() || c == '_')
        }
        str_slice_from(input, |toks| {
            while starts_ident(toks) {
                toks.skip_while(|c| c.is_alphanumeric() || *c == '_');
                let before_sep = toks.location();
                if !toks.tokens("::".chars()) {
                    break;
                }
                if !starts_ident(toks) {
                    toks.set_location(before_sep);
                    break;
                }
            }
        })
    }

    fn expect(input: &mut StrTokens<'_>, s: &str, kind: ParseErrorKind) -> Result<(), ParseError> {
        let at = offset(input);
        if input.tokens(s.chars()) {
            Ok(())
        } else {
            Err(ParseError::new_at(kind, at))
        }
    }

    fn offset(input: &StrTokens<'_>) -> usize {
        input.location().offset()
    }

    fn skip_whitespace(input: &mut StrTokens<'_>) {
        input.skip_while(|c| c.is_whitespace());
    }

    // The slice of input consumed by `f`.
    fn str_slice_from<'a, F>(input: &mut StrTokens<'a>, f: F) -> &'a str
    where
        F: FnOnce(&mut StrTokens<'a>),
    {
        let all = input.remaining();
        f(input);
        &all[..all.len() - input.remaining().len()]
    }
}
