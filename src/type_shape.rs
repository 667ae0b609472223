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

//! This module provides a [`TypeShape`] enum, which describes the shape of a named legacy type,
//! or in other words, how it should be SCALE encoded/decoded. Shapes refer to other types by
//! [`LookupName`], and are lowered into [`crate::Shape`]s when legacy metadata is parsed.

use crate::lookup_name::LookupName;
use alloc::{string::String, vec::Vec};

pub use scale_type_resolver::Primitive;

/// How a named legacy type is laid out on the wire. Any types it contains are referred to by
/// name and looked up again when the shape is lowered.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    /// A struct with named fields.
    StructOf(Vec<Field>),
    /// A tuple of types.
    TupleOf(Vec<LookupName>),
    /// An enum. Variant indexes need not be contiguous.
    EnumOf(Vec<Variant>),
    /// A compact length prefix followed by that many items.
    SequenceOf(LookupName),
    /// A `bitvec::BitVec<store, order>`.
    BitSequence {
        /// Should name `bitvec::order::Lsb0` or `bitvec::order::Msb0`.
        order: LookupName,
        /// Should name one of `u8`, `u16`, `u32` or `u64`.
        store: LookupName,
    },
    /// `Compact<T>` for the named `T`.
    Compact(LookupName),
    /// A primitive type.
    Primitive(Primitive),
    /// Exactly the same as another type, eg `AccountId => [u8; 32]`.
    AliasOf(LookupName),
}

/// A named field in a struct or enum variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The field name.
    pub name: String,
    /// The type of the field.
    pub value: LookupName,
}

/// One variant of a [`TypeShape::EnumOf`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// The byte that this variant is encoded with.
    pub index: u8,
    /// The variant name.
    pub name: String,
    /// Any fields the variant has.
    pub fields: VariantDesc,
}

/// The fields of a [`Variant`].
#[derive(Debug, Clone, PartialEq)]
pub enum VariantDesc {
    /// Named fields.
    StructOf(Vec<Field>),
    /// Unnamed fields, including no fields at all.
    TupleOf(Vec<LookupName>),
}

impl TypeShape {
    /// Call the given function on every type name this shape refers to.
    pub(crate) fn map_names(self, mut f: impl FnMut(LookupName) -> LookupName) -> TypeShape {
        fn fields(fields: Vec<Field>, f: &mut dyn FnMut(LookupName) -> LookupName) -> Vec<Field> {
            fields
                .into_iter()
                .map(|field| Field { name: field.name, value: f(field.value) })
                .collect()
        }
        fn names(
            names: Vec<LookupName>,
            f: &mut dyn FnMut(LookupName) -> LookupName,
        ) -> Vec<LookupName> {
            names.into_iter().map(f).collect()
        }

        match self {
            TypeShape::StructOf(fs) => TypeShape::StructOf(fields(fs, &mut f)),
            TypeShape::TupleOf(ns) => TypeShape::TupleOf(names(ns, &mut f)),
            TypeShape::EnumOf(variants) => TypeShape::EnumOf(
                variants
                    .into_iter()
                    .map(|v| Variant {
                        index: v.index,
                        name: v.name,
                        fields: match v.fields {
                            VariantDesc::StructOf(fs) => VariantDesc::StructOf(fields(fs, &mut f)),
                            VariantDesc::TupleOf(ns) => VariantDesc::TupleOf(names(ns, &mut f)),
                        },
                    })
                    .collect(),
            ),
            TypeShape::SequenceOf(name) => TypeShape::SequenceOf(f(name)),
            TypeShape::BitSequence { order, store } => {
                TypeShape::BitSequence { order: f(order), store: f(store) }
            }
            TypeShape::Compact(name) => TypeShape::Compact(f(name)),
            TypeShape::Primitive(p) => TypeShape::Primitive(p),
            TypeShape::AliasOf(name) => TypeShape::AliasOf(f(name)),
        }
    }
}
