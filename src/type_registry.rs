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

//! This module provides a [`TypeRegistry`], which can be used to store and resolve
//! type information for legacy types based on their names.

use crate::insert_name::{self, InsertName};
use crate::lookup_name::{LookupName, LookupNameDef};
use crate::lowering::LegacyTypeError;
use crate::type_shape::{Primitive, TypeShape, Variant, VariantDesc};
use alloc::borrow::ToOwned;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// A registry of named legacy types. Names can have generic parameters, which are substituted
/// with the concrete types given when they are looked up.
///
/// # Example
///
/// ```rust
/// use scale_metadata_codec::{LookupName, TypeRegistry, TypeShape};
///
/// let mut registry = TypeRegistry::basic();
/// registry
///     .insert_str("Pair<A>", TypeShape::TupleOf(vec![
///         LookupName::parse("A").unwrap(),
///         LookupName::parse("Vec<A>").unwrap(),
///     ]))
///     .unwrap();
///
/// let shape = registry.resolve(&LookupName::parse("Pair<u8>").unwrap()).unwrap().unwrap();
/// assert_eq!(shape, TypeShape::TupleOf(vec![
///     LookupName::parse("u8").unwrap(),
///     LookupName::parse("Vec<u8>").unwrap(),
/// ]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<RegistryKey, TypeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RegistryKey {
    name: String,
    pallet: Option<String>,
}

#[derive(Debug, Clone)]
struct TypeInfo {
    // The generic param names that may be used in the shape below.
    params: SmallVec<[String; 4]>,
    shape: TypeShape,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry containing the primitives and standard library types (`Vec`, `Option`,
    /// `BTreeMap` and so on) that legacy metadata type names are built from.
    pub fn basic() -> Self {
        let mut registry = TypeRegistry::empty();
        for (name, shape) in basic_types() {
            registry.insert(name, shape);
        }
        registry
    }

    /// The number of types in the registry.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Are there any types in the registry?
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Insert a type, overwriting any type with the same name and pallet scope.
    pub fn insert(&mut self, name: InsertName, shape: TypeShape) {
        let key = RegistryKey { name: name.name, pallet: name.pallet };
        self.types.insert(key, TypeInfo { params: name.params, shape });
    }

    /// Like [`TypeRegistry::insert()`], but parses the name from a string first.
    pub fn insert_str(
        &mut self,
        name: &str,
        shape: TypeShape,
    ) -> Result<(), insert_name::ParseError> {
        self.insert(InsertName::parse(name)?, shape);
        Ok(())
    }

    /// Add the types from another registry to this one. Types in `other` overwrite types with
    /// the same name here.
    pub fn extend(&mut self, other: TypeRegistry) {
        self.types.extend(other.types);
    }

    /// Find the shape of a named type, with its generic parameters replaced with the concrete
    /// types given in the name. Only an exact match on the name and pallet scope counts; see
    /// [`crate::TypeRegistrySet`] for lookups which fall back to the global scope.
    ///
    /// Returns `Ok(None)` if the type isn't here, and an error if it is but the number of
    /// generic parameters doesn't line up.
    pub fn resolve(&self, name: &LookupName) -> Result<Option<TypeShape>, LegacyTypeError> {
        let LookupNameDef::Named { name: ty_name, params } = name.def() else {
            return Ok(None);
        };

        let key = RegistryKey {
            name: ty_name.as_str().to_owned(),
            pallet: name.pallet().map(ToOwned::to_owned),
        };
        let Some(info) = self.types.get(&key) else {
            return Ok(None);
        };

        if info.params.len() != params.len() {
            return Err(LegacyTypeError::ParamCountMismatch {
                name: name.to_string(),
                expected: info.params.len(),
                found: params.len(),
            });
        }

        // Map generic idents to the concrete types we've been given, so that eg the `T` in
        // `Vec<T>` becomes `u32` when looking up `Vec<u32>`.
        let mapping: SmallVec<[(&str, &LookupNameDef); 4]> =
            info.params.iter().map(|p| p.as_str()).zip(params.iter()).collect();

        let shape = info.shape.clone().map_names(|n| n.with_substitutions(&mapping));
        Ok(Some(shape))
    }
}

impl core::iter::FromIterator<(InsertName, TypeShape)> for TypeRegistry {
    fn from_iter<T: IntoIterator<Item = (InsertName, TypeShape)>>(iter: T) -> Self {
        let mut registry = TypeRegistry::empty();
        for (name, shape) in iter {
            registry.insert(name, shape);
        }
        registry
    }
}

// The names of the enums built for each pallet's calls, events and errors when legacy
// metadata is parsed. Type names like `Call` resolve to these.
pub(crate) const BUILTIN_CALL: &str = "builtin::Call";
pub(crate) const BUILTIN_EVENT: &str = "builtin::Event";

fn basic_types() -> Vec<(InsertName, TypeShape)> {
    use LookupNameDef as D;

    fn n(name: &str, params: &[&str]) -> InsertName {
        InsertName {
            name: name.to_owned(),
            params: params.iter().map(|p| (*p).to_owned()).collect(),
            pallet: None,
        }
    }
    fn ln(def: LookupNameDef) -> LookupName {
        LookupName::from_def(def)
    }
    fn t() -> LookupNameDef {
        D::named("T")
    }
    fn variant(index: u8, name: &str, fields: Vec<LookupNameDef>) -> Variant {
        let fields = fields.into_iter().map(ln).collect();
        Variant { index, name: name.to_owned(), fields: VariantDesc::TupleOf(fields) }
    }
    fn bytes(length: usize) -> TypeShape {
        TypeShape::AliasOf(ln(D::array(D::named("u8"), length)))
    }

    let primitives = [
        ("bool", Primitive::Bool),
        ("char", Primitive::Char),
        ("str", Primitive::Str),
        ("String", Primitive::Str),
        ("Text", Primitive::Str),
        ("u8", Primitive::U8),
        ("u16", Primitive::U16),
        ("u32", Primitive::U32),
        ("u64", Primitive::U64),
        ("u128", Primitive::U128),
        ("u256", Primitive::U256),
        ("U256", Primitive::U256),
        ("i8", Primitive::I8),
        ("i16", Primitive::I16),
        ("i32", Primitive::I32),
        ("i64", Primitive::I64),
        ("i128", Primitive::I128),
        ("i256", Primitive::I256),
    ];

    let mut types: Vec<_> =
        primitives.into_iter().map(|(name, p)| (n(name, &[]), TypeShape::Primitive(p))).collect();

    let key_value = || D::tuple(vec![D::named("K"), D::named("V")]);
    let option = vec![variant(0, "None", vec![]), variant(1, "Some", vec![t()])];
    let result = vec![variant(0, "Ok", vec![t()]), variant(1, "Err", vec![D::named("E")])];

    types.extend([
        (n("Vec", &["T"]), TypeShape::SequenceOf(ln(t()))),
        (n("VecDeque", &["T"]), TypeShape::SequenceOf(ln(t()))),
        (n("BTreeSet", &["T"]), TypeShape::SequenceOf(ln(t()))),
        (n("BoundedVec", &["T", "S"]), TypeShape::SequenceOf(ln(t()))),
        (n("WeakBoundedVec", &["T", "S"]), TypeShape::SequenceOf(ln(t()))),
        (n("BTreeMap", &["K", "V"]), TypeShape::SequenceOf(ln(key_value()))),
        (n("BoundedBTreeMap", &["K", "V", "S"]), TypeShape::SequenceOf(ln(key_value()))),
        (n("Option", &["T"]), TypeShape::EnumOf(option)),
        (n("Result", &["T", "E"]), TypeShape::EnumOf(result)),
        (n("Box", &["T"]), TypeShape::AliasOf(ln(t()))),
        (n("Rc", &["T"]), TypeShape::AliasOf(ln(t()))),
        (n("Arc", &["T"]), TypeShape::AliasOf(ln(t()))),
        (n("Cow", &["T"]), TypeShape::AliasOf(ln(t()))),
        (n("Compact", &["T"]), TypeShape::Compact(ln(t()))),
        (n("PhantomData", &["T"]), TypeShape::TupleOf(Vec::new())),
        (n("Bytes", &[]), TypeShape::AliasOf(ln(D::generic("Vec", vec![D::named("u8")])))),
        (n("H160", &[]), bytes(20)),
        (n("H256", &[]), bytes(32)),
        (n("H512", &[]), bytes(64)),
        (n("bitvec::order::Lsb0", &[]), TypeShape::StructOf(Vec::new())),
        (n("bitvec::order::Msb0", &[]), TypeShape::StructOf(Vec::new())),
        (
            n("BitVec", &[]),
            TypeShape::BitSequence {
                order: ln(D::named("bitvec::order::Lsb0")),
                store: ln(D::named("u8")),
            },
        ),
        (n("Call", &[]), TypeShape::AliasOf(ln(D::named(BUILTIN_CALL)))),
        (n("RuntimeCall", &[]), TypeShape::AliasOf(ln(D::named(BUILTIN_CALL)))),
        (n("Event", &[]), TypeShape::AliasOf(ln(D::named(BUILTIN_EVENT)))),
        (n("RuntimeEvent", &[]), TypeShape::AliasOf(ln(D::named(BUILTIN_EVENT)))),
    ]);

    types
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::type_shape::Field;

    fn ln(name: &str) -> LookupName {
        LookupName::parse(name).unwrap()
    }

    #[test]
    fn substitutes_generic_params() {
        let mut registry = TypeRegistry::empty();
        registry
            .insert_str(
                "Foo<A, B>",
                TypeShape::StructOf(vec![
                    Field { name: "a".into(), value: ln("Vec<A>") },
                    Field { name: "b".into(), value: ln("u32") },
                    Field { name: "c".into(), value: ln("(A, B)") },
                ]),
            )
            .unwrap();

        let shape = registry.resolve(&ln("Foo<Bar<u32>, Vec<String>>")).unwrap().unwrap();
        assert_eq!(
            shape,
            TypeShape::StructOf(vec![
                Field { name: "a".into(), value: ln("Vec<Bar<u32>>") },
                Field { name: "b".into(), value: ln("u32") },
                Field { name: "c".into(), value: ln("(Bar<u32>, Vec<String>)") },
            ])
        );
    }

    #[test]
    fn param_count_must_match() {
        let registry = TypeRegistry::basic();
        let err = registry.resolve(&ln("Vec<u8, u16>")).unwrap_err();
        let name = "Vec<u8, u16>".into();
        assert_eq!(err, LegacyTypeError::ParamCountMismatch { name, expected: 1, found: 2 });
    }

    #[test]
    fn pallet_scope_must_match_exactly() {
        let mut registry = TypeRegistry::empty();
        registry.insert(
            InsertName::parse("Balance").unwrap().in_pallet("balances"),
            TypeShape::Primitive(Primitive::U128),
        );

        assert_eq!(registry.resolve(&ln("Balance")).unwrap(), None);
        assert_eq!(
            registry.resolve(&ln("Balance").in_pallet("balances")).unwrap(),
            Some(TypeShape::Primitive(Primitive::U128))
        );
        assert_eq!(registry.resolve(&ln("Balance").in_pallet("assets")).unwrap(), None);
    }

    #[test]
    fn basic_types_resolve() {
        let registry = TypeRegistry::basic();
        let resolve = |name: &str| registry.resolve(&ln(name)).unwrap();
        assert_eq!(resolve("u64"), Some(TypeShape::Primitive(Primitive::U64)));
        assert_eq!(resolve("BTreeMap<u8, bool>"), Some(TypeShape::SequenceOf(ln("(u8, bool)"))));
        assert_eq!(resolve("H256"), Some(TypeShape::AliasOf(ln("[u8; 32]"))));
        assert_eq!(resolve("Call"), Some(TypeShape::AliasOf(ln(BUILTIN_CALL))));
        // Tuples and arrays are structural, so are never in the registry.
        assert_eq!(resolve("(u8, bool)"), None);
        assert_eq!(resolve("[u8; 4]"), None);
    }

    #[test]
    fn later_inserts_overwrite() {
        let mut registry = TypeRegistry::basic();
        let mut other = TypeRegistry::empty();
        other.insert_str("u8", TypeShape::Primitive(Primitive::U16)).unwrap();
        registry.extend(other);
        let shape = registry.resolve(&ln("u8")).unwrap();
        assert_eq!(shape, Some(TypeShape::Primitive(Primitive::U16)));
    }
}
