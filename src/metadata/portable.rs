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

//! Decoding the `scale-info` portable type registry which V14 and V15 metadata embed.

use super::MetadataParseError;
use crate::type_graph::{
    Field, Parameter, Primitive, Shape, TypeDefinition, TypeGraph, TypeId, Variant,
};
use crate::wire::Cursor;
use alloc::string::String;
use alloc::vec::Vec;
use parity_scale_codec::Decode;

/// The portable registry as it appears on the wire.
#[derive(Decode)]
pub(super) struct PortableRegistry {
    types: Vec<PortableType>,
}

#[derive(Decode)]
struct PortableType {
    id: TypeId,
    ty: PortableDefinition,
}

#[derive(Decode)]
struct PortableDefinition {
    path: Vec<String>,
    params: Vec<Parameter>,
    def: PortableShape,
    docs: Vec<String>,
}

#[derive(Decode)]
enum PortableShape {
    Composite(Vec<Field>),
    Variant(Vec<Variant>),
    Sequence(TypeId),
    Array { len: u32, ty: TypeId },
    Tuple(Vec<TypeId>),
    Primitive(PortablePrimitive),
    Compact(TypeId),
    BitSequence { store: TypeId, order: TypeId },
}

#[derive(Decode)]
enum PortablePrimitive {
    Bool,
    Char,
    Str,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    I8,
    I16,
    I32,
    I64,
    I128,
    I256,
}

impl PortableRegistry {
    /// Turn this into a [`TypeGraph`]. Each type must carry an ID equal to its position.
    pub(super) fn into_graph(self) -> Result<TypeGraph, MetadataParseError> {
        let mut types = Vec::with_capacity(self.types.len());
        for (expected, ty) in (0u32..).zip(self.types) {
            if ty.id.0 != expected {
                return Err(MetadataParseError::UnexpectedTypeId { expected, found: ty.id.0 });
            }
            let PortableDefinition { path, params, def, docs } = ty.ty;
            types.push(TypeDefinition { path, params, shape: def.into(), docs });
        }
        tracing::trace!(types = types.len(), "decoded portable type registry");
        Ok(TypeGraph::from_types(types))
    }
}

/// Decode a portable registry into a [`TypeGraph`].
pub fn decode_registry(input: &mut Cursor<'_>) -> Result<TypeGraph, MetadataParseError> {
    input.decode::<PortableRegistry>()?.into_graph()
}

impl From<PortableShape> for Shape {
    fn from(shape: PortableShape) -> Self {
        match shape {
            PortableShape::Composite(fields) => Shape::Composite(fields),
            PortableShape::Variant(variants) => Shape::Variant(variants),
            PortableShape::Sequence(ty) => Shape::Sequence(ty),
            PortableShape::Array { len, ty } => Shape::Array(ty, len),
            PortableShape::Tuple(tys) => Shape::Tuple(tys),
            PortableShape::Primitive(p) => Shape::Primitive(p.into()),
            PortableShape::Compact(ty) => Shape::Compact(ty),
            PortableShape::BitSequence { store, order } => Shape::BitSequence { store, order },
        }
    }
}

impl From<PortablePrimitive> for Primitive {
    fn from(primitive: PortablePrimitive) -> Self {
        match primitive {
            PortablePrimitive::Bool => Primitive::Bool,
            PortablePrimitive::Char => Primitive::Char,
            PortablePrimitive::Str => Primitive::Str,
            PortablePrimitive::U8 => Primitive::U8,
            PortablePrimitive::U16 => Primitive::U16,
            PortablePrimitive::U32 => Primitive::U32,
            PortablePrimitive::U64 => Primitive::U64,
            PortablePrimitive::U128 => Primitive::U128,
            PortablePrimitive::U256 => Primitive::U256,
            PortablePrimitive::I8 => Primitive::I8,
            PortablePrimitive::I16 => Primitive::I16,
            PortablePrimitive::I32 => Primitive::I32,
            PortablePrimitive::I64 => Primitive::I64,
            PortablePrimitive::I128 => Primitive::I128,
            PortablePrimitive::I256 => Primitive::I256,
        }
    }
}
