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

//! This module provides the name used to insert types in a [`crate::TypeRegistry`]. Unlike a
//! [`crate::LookupName`], an [`InsertName`] has generic parameters which are placeholders
//! (like `T` in `Vec<T>`) to be substituted with concrete types when looked up.

use alloc::borrow::{Cow, ToOwned};
use alloc::format;
use alloc::string::String;
use smallvec::SmallVec;

/// The ways in which a string might fail to be an [`InsertName`].
#[allow(missing_docs)]
#[derive(Debug, derive_more::Display)]
pub enum ParseError {
    #[display(fmt = "Not a valid type name; names look like 'Foo', 'a::b::Foo' or 'Foo<A, B>'")]
    Invalid,
    #[display(fmt = "Generic parameters must be plain names like 'T', not paths, arrays or tuples")]
    ExpectingNamedParam,
    #[display(fmt = "Generic parameters must start with an uppercase letter")]
    ExpectingUppercaseParams,
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

/// The name that a [`crate::TypeShape`] is registered under in a [`crate::TypeRegistry`].
///
/// ```rust
/// use scale_metadata_codec::InsertName;
///
/// let plain = InsertName::parse("AccountId").unwrap();
/// let generic = InsertName::parse("BoundedVec<T, S>").unwrap();
///
/// assert_eq!(plain.params().len(), 0);
/// assert_eq!(generic.params().collect::<Vec<_>>(), ["T", "S"]);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InsertName {
    pub(crate) name: String,
    pub(crate) params: SmallVec<[String; 4]>,
    pub(crate) pallet: Option<String>,
}

impl InsertName {
    /// Parse an [`InsertName`] from a string.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        use crate::lookup_name::{LookupName, LookupNameDef};

        let mut parsed = LookupName::parse(s).map_err(|_| ParseError::Invalid)?;
        let pallet = parsed.take_pallet();

        let LookupNameDef::Named { name, params } = parsed.def() else {
            return Err(ParseError::Invalid);
        };

        let mut names = SmallVec::with_capacity(params.len());
        for param in params {
            match param {
                LookupNameDef::Named { name, params } if params.is_empty() => {
                    if !name.starts_with(|c: char| c.is_uppercase()) {
                        return Err(ParseError::ExpectingUppercaseParams);
                    }
                    names.push(name.as_str().to_owned());
                }
                _ => return Err(ParseError::ExpectingNamedParam),
            }
        }

        Ok(InsertName { name: name.as_str().to_owned(), params: names, pallet })
    }

    /// The name of the type, like `Vec` or `path::to::Foo`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The generic parameter names, like `T` in `Vec<T>`.
    pub fn params(&self) -> impl ExactSizeIterator<Item = &str> {
        self.params.iter().map(|p| p.as_str())
    }

    /// The pallet this type is scoped to, if any.
    pub fn pallet(&self) -> Option<&str> {
        self.pallet.as_deref()
    }

    /// Register the type for use only by lookups made from within the given pallet.
    pub fn in_pallet(mut self, pallet: impl Into<String>) -> InsertName {
        self.pallet = Some(pallet.into());
        self
    }
}

impl core::str::FromStr for InsertName {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl core::fmt::Debug for InsertName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

impl core::fmt::Display for InsertName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name)?;
        let mut params = self.params.iter();
        if let Some(first) = params.next() {
            write!(f, "<{first}")?;
            for param in params {
                write!(f, ", {param}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl serde::Serialize for InsertName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for InsertName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <Cow<'de, str>>::deserialize(deserializer)?;
        InsertName::parse(&s).map_err(|e| {
            serde::de::Error::custom(format!("'{s}' is not a valid type name to insert: {e}"))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    #[test]
    fn parses_names_and_generic_params() {
        let name = InsertName::parse("Foo<A, B>").unwrap();
        assert_eq!(name.name(), "Foo");
        assert_eq!(name.params().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(name.to_string(), "Foo<A, B>");

        let name = InsertName::parse("bitvec::order::Lsb0").unwrap().in_pallet("p");
        assert_eq!(name.name(), "bitvec::order::Lsb0");
        assert_eq!(name.params().len(), 0);
        assert_eq!(name.pallet(), Some("p"));
    }

    #[test]
    fn rejects_non_generic_params() {
        assert!(matches!(InsertName::parse("Foo<u8>"), Err(ParseError::ExpectingUppercaseParams)));
        assert!(matches!(InsertName::parse("Foo<(A, B)>"), Err(ParseError::ExpectingNamedParam)));
        assert!(matches!(InsertName::parse("Foo<Vec<T>>"), Err(ParseError::ExpectingNamedParam)));
        assert!(matches!(InsertName::parse("[u8; 32]"), Err(ParseError::Invalid)));
        assert!(matches!(InsertName::parse("Foo<"), Err(ParseError::Invalid)));
    }

    #[test]
    fn deserializes_from_strings() {
        let name: InsertName = serde_json::from_str(r#""Vec<T>""#).unwrap();
        assert_eq!(name, InsertName::parse("Vec<T>").unwrap());
        assert!(serde_json::from_str::<InsertName>(r#""(A, B)""#).is_err());
    }
}
