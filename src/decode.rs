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

//! Decoding SCALE bytes into a [`Value`] given the [`TypeId`] of the bytes in some
//! [`TypeGraph`].
//!
//! Single field composites and single element tuples are transparent: they decode to whatever
//! their one field decodes to. Sequences and arrays of `u8` decode to [`ValueDef::Bytes`].

use crate::bits;
use crate::type_graph::{
    CompactTarget, Field, Primitive, Shape, TypeGraph, TypeGraphError, TypeId,
};
use crate::value::{Composite, DisplayPath, PathSegment, Value, ValueDef, VariantValue};
use crate::wire::{self, CompactPolicy, Cursor};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;

/// Options which tweak how values are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecodeOptions {
    /// How strictly to check compact encoded values.
    pub compact: CompactPolicy,
    /// The most items a sequence or array of zero sized values (such as `Vec<()>`) may have.
    /// These take up no bytes, so their length can't be checked against the input.
    pub max_zero_sized_items: usize,
    /// How deeply values may nest inside each other.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            compact: CompactPolicy::default(),
            max_zero_sized_items: 1 << 16,
            max_depth: 256,
        }
    }
}

/// An error decoding a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// The offset into the input at which decoding failed.
    pub offset: usize,
    /// Where in the value being decoded the error occurred, outermost first.
    pub path: Vec<PathSegment>,
    /// What went wrong.
    pub kind: DecodeErrorKind,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Error decoding value at byte {} (location {}): {}",
            self.offset,
            DisplayPath(&self.path),
            self.kind
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

impl DecodeError {
    pub(crate) fn new(offset: usize, kind: DecodeErrorKind) -> Self {
        DecodeError { offset, path: Vec::new(), kind }
    }

    // Errors are built from the innermost value outwards, so each step prepends.
    fn at(mut self, segment: PathSegment) -> Self {
        self.path.insert(0, segment);
        self
    }
}

impl From<wire::Error> for DecodeError {
    fn from(e: wire::Error) -> Self {
        let kind = match e.kind {
            wire::ErrorKind::TruncatedInput { needed, available } => {
                DecodeErrorKind::TruncatedInput { needed, available }
            }
            wire::ErrorKind::MalformedCompact(reason) => DecodeErrorKind::MalformedCompact(reason),
            wire::ErrorKind::InvalidBoolEncoding(b) => DecodeErrorKind::InvalidBoolEncoding(b),
            wire::ErrorKind::InvalidUtf8 => DecodeErrorKind::InvalidUtf8,
            wire::ErrorKind::Codec { what, error } => DecodeErrorKind::Codec { what, error },
        };
        DecodeError::new(e.offset, kind)
    }
}

/// The kind of error encountered decoding a value.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum DecodeErrorKind {
    #[display(fmt = "Type with ID {_0} not found")]
    TypeNotFound(TypeId),
    #[display(fmt = "Variant index {index} not found in type {type_id}")]
    UnknownVariantIndex { index: u8, type_id: TypeId },
    #[display(fmt = "No pallet has index {_0}")]
    UnknownPalletIndex(u8),
    #[display(fmt = "Malformed compact integer: {_0}")]
    MalformedCompact(&'static str),
    #[display(fmt = "Compact value {value} does not fit in the target type (max {max})")]
    CompactOutOfRange { value: u128, max: u128 },
    #[display(fmt = "Not enough bytes: needed {needed} but only {available} remain")]
    TruncatedInput { needed: usize, available: usize },
    #[display(fmt = "String is not valid UTF-8")]
    InvalidUtf8,
    #[display(fmt = "Expected a bool (0 or 1) but got byte {_0}")]
    InvalidBoolEncoding(u8),
    #[display(fmt = "{_0} is not a valid char")]
    InvalidChar(u32),
    #[display(fmt = "{_0}")]
    UnsupportedBitSequenceFormat(TypeGraphError),
    #[display(fmt = "{_0}")]
    InvalidType(TypeGraphError),
    #[display(fmt = "{_0} bytes were left over after decoding")]
    TrailingBytes(usize),
    #[display(fmt = "{len} zero sized items is more than the limit of {max}")]
    TooManyZeroSizedItems { len: usize, max: usize },
    #[display(fmt = "Values are nested more than {_0} deep")]
    TooDeeplyNested(usize),
    #[display(fmt = "Cannot decode {what}: {error}")]
    Codec { what: &'static str, error: parity_scale_codec::Error },
}

impl From<TypeGraphError> for DecodeErrorKind {
    fn from(e: TypeGraphError) -> Self {
        match e {
            TypeGraphError::TypeNotFound(id) => DecodeErrorKind::TypeNotFound(id),
            e @ TypeGraphError::UnsupportedBitSequenceFormat { .. } => {
                DecodeErrorKind::UnsupportedBitSequenceFormat(e)
            }
            e => DecodeErrorKind::InvalidType(e),
        }
    }
}

/// Decode a value of the given type from the cursor, leaving the cursor just after it.
pub fn decode_value(
    input: &mut Cursor<'_>,
    type_id: TypeId,
    types: &TypeGraph,
) -> Result<Value, DecodeError> {
    decode_value_with(input, type_id, types, &DecodeOptions::default())
}

/// Like [`decode_value()`], but with some [`DecodeOptions`].
pub fn decode_value_with(
    input: &mut Cursor<'_>,
    type_id: TypeId,
    types: &TypeGraph,
    options: &DecodeOptions,
) -> Result<Value, DecodeError> {
    Decoder { types, options, depth: Cell::new(0) }.decode(input, type_id)
}

/// Decode a value of the given type, expecting it to consume every one of the given bytes.
pub fn decode_value_exact(
    bytes: &[u8],
    type_id: TypeId,
    types: &TypeGraph,
) -> Result<Value, DecodeError> {
    decode_value_exact_with(bytes, type_id, types, &DecodeOptions::default())
}

/// Like [`decode_value_exact()`], but with some [`DecodeOptions`].
pub fn decode_value_exact_with(
    bytes: &[u8],
    type_id: TypeId,
    types: &TypeGraph,
    options: &DecodeOptions,
) -> Result<Value, DecodeError> {
    let mut input = Cursor::new(bytes);
    let value = decode_value_with(&mut input, type_id, types, options)?;
    if !input.is_empty() {
        return Err(DecodeError::new(
            input.offset(),
            DecodeErrorKind::TrailingBytes(input.remaining_len()),
        ));
    }
    Ok(value)
}

struct Decoder<'a> {
    types: &'a TypeGraph,
    options: &'a DecodeOptions,
    depth: Cell<usize>,
}

impl<'a> Decoder<'a> {
    fn decode(&self, input: &mut Cursor<'_>, type_id: TypeId) -> Result<Value, DecodeError> {
        let depth = self.depth.get();
        if depth >= self.options.max_depth {
            let kind = DecodeErrorKind::TooDeeplyNested(self.options.max_depth);
            return Err(DecodeError::new(input.offset(), kind));
        }
        self.depth.set(depth + 1);
        let value = self.decode_at_depth(input, type_id);
        self.depth.set(depth);
        value
    }

    fn decode_at_depth(
        &self,
        input: &mut Cursor<'_>,
        type_id: TypeId,
    ) -> Result<Value, DecodeError> {
        let offset = input.offset();
        let graph_err = move |e: TypeGraphError| DecodeError::new(offset, e.into());
        let (inner_id, shape) = self.types.flatten(type_id).map_err(graph_err)?;

        let def = match shape {
            Shape::Primitive(p) => self.decode_primitive(input, *p)?,
            Shape::Compact(of) => {
                let target = self.types.compact_target(*of).map_err(graph_err)?;
                self.decode_compact(input, target)?
            }
            Shape::Sequence(elem) => {
                let len = input.read_len()?;
                self.decode_items(input, offset, *elem, len)?
            }
            Shape::Array(elem, len) => self.decode_items(input, offset, *elem, *len as usize)?,
            Shape::Tuple(ids) if ids.is_empty() => ValueDef::Unit,
            Shape::Tuple(ids) => {
                let mut items = Vec::with_capacity(ids.len());
                for (idx, id) in ids.iter().enumerate() {
                    items.push(self.decode(input, *id).map_err(|e| e.at(PathSegment::Index(idx)))?);
                }
                ValueDef::Sequence(items)
            }
            Shape::Composite(fields) if fields.is_empty() => ValueDef::Unit,
            Shape::Composite(fields) => match self.decode_fields(input, fields)? {
                Composite::Named(fields) => ValueDef::Map(fields),
                Composite::Unnamed(items) => ValueDef::Sequence(items),
            },
            Shape::Variant(variants) => {
                let index = input.read_u8()?;
                let variant = variants.iter().find(|v| v.index == index).ok_or_else(|| {
                    DecodeError::new(
                        offset,
                        DecodeErrorKind::UnknownVariantIndex { index, type_id: inner_id },
                    )
                })?;
                let fields = self
                    .decode_fields(input, &variant.fields)
                    .map_err(|e| e.at(PathSegment::Variant(variant.name.clone())))?;
                ValueDef::Variant(VariantValue {
                    name: variant.name.clone(),
                    index: Some(index),
                    fields,
                })
            }
            Shape::BitSequence { .. } => {
                let (store, order) = self.types.bit_sequence_format(inner_id).map_err(graph_err)?;
                ValueDef::BitSequence(bits::decode(input, store, order)?)
            }
        };

        Ok(Value { def, type_id: Some(type_id) })
    }

    fn decode_primitive(
        &self,
        input: &mut Cursor<'_>,
        primitive: Primitive,
    ) -> Result<ValueDef, DecodeError> {
        let def = match primitive {
            Primitive::Bool => ValueDef::Bool(input.read_bool()?),
            Primitive::Char => {
                let offset = input.offset();
                let n = input.read_u32()?;
                let c = char::from_u32(n)
                    .ok_or_else(|| DecodeError::new(offset, DecodeErrorKind::InvalidChar(n)))?;
                ValueDef::Char(c)
            }
            Primitive::Str => ValueDef::Str(String::from(input.read_str()?)),
            Primitive::U8 => ValueDef::UInt(input.read_u8()?.into()),
            Primitive::U16 => ValueDef::UInt(input.read_u16()?.into()),
            Primitive::U32 => ValueDef::UInt(input.read_u32()?.into()),
            Primitive::U64 => ValueDef::UInt(input.read_u64()?.into()),
            Primitive::U128 => ValueDef::UInt(input.read_u128()?),
            Primitive::U256 => ValueDef::BigUInt(input.read_array()?),
            Primitive::I8 => ValueDef::Int(i8::from_le_bytes(input.read_array()?).into()),
            Primitive::I16 => ValueDef::Int(i16::from_le_bytes(input.read_array()?).into()),
            Primitive::I32 => ValueDef::Int(i32::from_le_bytes(input.read_array()?).into()),
            Primitive::I64 => ValueDef::Int(i64::from_le_bytes(input.read_array()?).into()),
            Primitive::I128 => ValueDef::Int(i128::from_le_bytes(input.read_array()?)),
            Primitive::I256 => ValueDef::BigInt(input.read_array()?),
        };
        Ok(def)
    }

    fn decode_compact(
        &self,
        input: &mut Cursor<'_>,
        target: CompactTarget,
    ) -> Result<ValueDef, DecodeError> {
        // Compact encoded unit types take up no bytes at all.
        if target == CompactTarget::Unit {
            return Ok(ValueDef::Unit);
        }
        let offset = input.offset();
        let value = input.read_compact(self.options.compact)?;
        let max = target.max_value();
        if value > max {
            return Err(DecodeError::new(offset, DecodeErrorKind::CompactOutOfRange { value, max }));
        }
        Ok(ValueDef::UInt(value))
    }

    fn decode_items(
        &self,
        input: &mut Cursor<'_>,
        offset: usize,
        elem: TypeId,
        len: usize,
    ) -> Result<ValueDef, DecodeError> {
        let is_byte = matches!(self.types.flatten(elem), Ok((_, Shape::Primitive(Primitive::U8))));
        if is_byte {
            return Ok(ValueDef::Bytes(input.take(len)?.to_vec()));
        }

        // Items which take up no bytes can't run out of input, so cap how many there can be.
        let max = self.options.max_zero_sized_items;
        if len > max {
            let zero_sized = self
                .types
                .is_zero_sized(elem)
                .map_err(|e| DecodeError::new(offset, e.into()))?;
            if zero_sized {
                let kind = DecodeErrorKind::TooManyZeroSizedItems { len, max };
                return Err(DecodeError::new(offset, kind));
            }
        }

        // Don't trust the length to size the allocation; the input may be lying.
        let mut items = Vec::with_capacity(len.min(input.remaining_len()));
        for idx in 0..len {
            items.push(self.decode(input, elem).map_err(|e| e.at(PathSegment::Index(idx)))?);
        }
        Ok(ValueDef::Sequence(items))
    }

    fn decode_fields(
        &self,
        input: &mut Cursor<'_>,
        fields: &[Field],
    ) -> Result<Composite, DecodeError> {
        let all_named = !fields.is_empty() && fields.iter().all(|f| f.name.is_some());
        if all_named {
            let mut out = Vec::with_capacity(fields.len());
            for field in fields {
                let name = field.name.clone().unwrap_or_default();
                let value = self
                    .decode(input, field.ty)
                    .map_err(|e| e.at(PathSegment::Field(name.clone())))?;
                out.push((name, value));
            }
            Ok(Composite::Named(out))
        } else {
            let mut out = Vec::with_capacity(fields.len());
            for (idx, field) in fields.iter().enumerate() {
                out.push(self.decode(input, field.ty).map_err(|e| e.at(PathSegment::Index(idx)))?);
            }
            Ok(Composite::Unnamed(out))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{graph_for, Registered};
    use crate::type_graph::{TypeDefinition, TypeGraphBuilder, Variant};
    use alloc::vec;
    use parity_scale_codec::{Compact, Encode};
    use scale_info::TypeInfo;

    fn decode_as<T: TypeInfo + Encode + 'static>(value: T) -> Value {
        let (types, id) = graph_for::<T>();
        decode_value_exact(&value.encode(), id, &types).unwrap()
    }

    #[allow(dead_code)]
    #[derive(Encode, TypeInfo)]
    struct Wrapper(u64);

    #[allow(dead_code)]
    #[derive(Encode, TypeInfo)]
    enum Call {
        Transfer {
            dest: [u8; 4],
            #[codec(compact)]
            value: u128,
        },
        Remark(Vec<u8>),
        Batch(Vec<Call>),
        #[codec(index = 9)]
        Kill,
    }

    #[test]
    fn decodes_primitives() {
        assert_eq!(decode_as(true), Value::bool(true));
        assert_eq!(decode_as(String::from("hi")), Value::string("hi"));
        assert_eq!(decode_as(123u16), Value::u128(123));
        assert_eq!(decode_as(-5i64), Value::i128(-5));
        assert_eq!(decode_as(u128::MAX), Value::u128(u128::MAX));
    }

    #[test]
    fn decodes_bytes_and_sequences() {
        assert_eq!(decode_as(vec![1u8, 2, 3]), Value::bytes(vec![1, 2, 3]));
        assert_eq!(decode_as([9u8; 4]), Value::bytes([9u8; 4]));
        assert_eq!(
            decode_as(vec![true, false]),
            Value::sequence([Value::bool(true), Value::bool(false)])
        );
        assert_eq!(
            decode_as((1u8, String::from("a"))),
            Value::sequence([Value::u128(1), Value::string("a")])
        );
        assert_eq!(decode_as(()), Value::unit());
    }

    #[test]
    fn single_field_wrappers_are_transparent() {
        assert_eq!(decode_as(Wrapper(7)), Value::u128(7));
        assert_eq!(decode_as((Wrapper(7),)), Value::u128(7));
    }

    #[test]
    fn decodes_variants() {
        let call = Call::Batch(vec![
            Call::Transfer { dest: [1, 2, 3, 4], value: 1 << 40 },
            Call::Remark(b"hello".to_vec()),
            Call::Kill,
        ]);
        let value = decode_as(call);

        let expected = Value::unnamed_variant(
            "Batch",
            [Value::sequence([
                Value::named_variant(
                    "Transfer",
                    [("dest", Value::bytes([1, 2, 3, 4])), ("value", Value::u128(1 << 40))],
                ),
                Value::unnamed_variant("Remark", [Value::bytes(b"hello".to_vec())]),
                Value::unnamed_variant("Kill", []),
            ])],
        );
        assert_eq!(value, expected);
        assert_eq!(value.as_variant().and_then(|v| v.index), Some(2));
        let kill = value.at(0).and_then(|s| s.at(2)).and_then(Value::as_variant).unwrap();
        assert_eq!(kill.index, Some(9));
    }

    #[test]
    fn decodes_options_and_results() {
        assert_eq!(decode_as(Some(3u32)), Value::unnamed_variant("Some", [Value::u128(3)]));
        assert_eq!(decode_as(None::<u32>), Value::unnamed_variant("None", []));
        assert_eq!(
            decode_as(Err::<u8, bool>(true)),
            Value::unnamed_variant("Err", [Value::bool(true)])
        );
    }

    #[test]
    fn unknown_variant_index_is_an_error() {
        let (types, id) = graph_for::<Call>();
        let err = decode_value_exact(&[7], id, &types).unwrap_err();
        assert_eq!(err.offset, 0);
        assert_eq!(err.kind, DecodeErrorKind::UnknownVariantIndex { index: 7, type_id: id });
    }

    #[test]
    fn errors_carry_path_and_offset() {
        let (types, id) = graph_for::<Call>();
        // Batch([Transfer { dest, value: <truncated> }])
        let bytes = [2u8, 4, 0, 1, 2, 3, 4];
        let err = decode_value_exact(&bytes, id, &types).unwrap_err();
        assert_eq!(err.offset, 7);
        assert!(matches!(err.kind, DecodeErrorKind::TruncatedInput { needed: 1, available: 0 }));
        assert_eq!(
            err.path,
            vec![
                PathSegment::Variant("Batch".into()),
                PathSegment::Index(0),
                PathSegment::Index(0),
                PathSegment::Variant("Transfer".into()),
                PathSegment::Field("value".into()),
            ]
        );
    }

    #[test]
    fn trailing_bytes_are_rejected_by_exact_decoding() {
        let (types, id) = graph_for::<u8>();
        let err = decode_value_exact(&[1, 2], id, &types).unwrap_err();
        assert_eq!(err, DecodeError::new(1, DecodeErrorKind::TrailingBytes(1)));

        // But the cursor based API is happy to leave them.
        let mut cursor = Cursor::new(&[1, 2]);
        assert_eq!(decode_value(&mut cursor, id, &types).unwrap(), Value::u128(1));
        assert_eq!(cursor.remaining(), &[2]);
    }

    #[test]
    fn compact_values_respect_target_width_and_policy() {
        let mut reg = Registered::new();
        let compact_u8 = reg.add::<Compact<u8>>();
        let compact_u128 = reg.add::<Compact<u128>>();
        let types = reg.graph();

        // 300 fits in a compact but not a u8.
        let err = decode_value_exact(&Compact(300u16).encode(), compact_u8, &types).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::CompactOutOfRange { value: 300, max: 255 });

        let big = Compact(1u128 << 40).encode();
        assert_eq!(decode_value_exact(&big, compact_u128, &types).unwrap(), Value::u128(1 << 40));

        // 1 in two byte mode is only allowed when permissive.
        let non_canonical = [0b0000_0101, 0];
        let err = decode_value_exact(&non_canonical, compact_u128, &types).unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::MalformedCompact(_)));
        let permissive =
            DecodeOptions { compact: CompactPolicy::Permissive, ..DecodeOptions::default() };
        let value =
            decode_value_exact_with(&non_canonical, compact_u128, &types, &permissive).unwrap();
        assert_eq!(value, Value::u128(1));
    }

    #[test]
    fn compact_unit_takes_no_bytes() {
        let mut b = TypeGraphBuilder::new();
        let unit = b.add(TypeDefinition::new(Shape::Tuple(vec![])));
        let compact = b.add(TypeDefinition::new(Shape::Compact(unit)));
        let types = b.build().unwrap();
        assert_eq!(decode_value_exact(&[], compact, &types).unwrap(), Value::unit());
    }

    #[test]
    fn invalid_chars_and_bools() {
        let mut b = TypeGraphBuilder::new();
        let c = b.add(TypeDefinition::new(Shape::Primitive(Primitive::Char)));
        let flag = b.add(TypeDefinition::new(Shape::Primitive(Primitive::Bool)));
        let types = b.build().unwrap();

        let x = decode_value_exact(&('x' as u32).to_le_bytes(), c, &types).unwrap();
        assert_eq!(x, Value::char('x'));
        let err = decode_value_exact(&0xD800u32.to_le_bytes(), c, &types).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::InvalidChar(0xD800));
        let err = decode_value_exact(&[3], flag, &types).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::InvalidBoolEncoding(3));
    }

    #[test]
    fn decodes_bit_sequences() {
        let mut b = TypeGraphBuilder::new();
        let store = b.add(TypeDefinition::new(Shape::Primitive(Primitive::U8)));
        let order =
            b.add(TypeDefinition::new(Shape::Composite(vec![])).with_path("bitvec::order::Msb0"));
        let bits = b.add(TypeDefinition::new(Shape::BitSequence { store, order }));
        let types = b.build().unwrap();

        // 3 bits, Msb0: 0b1010_0000.
        let value = decode_value_exact(&[12, 0b1010_0000], bits, &types).unwrap();
        assert_eq!(value, Value::bit_sequence([true, false, true]));
    }

    #[test]
    fn missing_types_are_reported() {
        let types = TypeGraph::from_types(vec![TypeDefinition::new(Shape::Variant(vec![
            Variant::new("A", 0, vec![Field::unnamed(TypeId(5))]),
        ]))]);
        let err = decode_value_exact(&[0], TypeId(0), &types).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TypeNotFound(TypeId(5)));
        assert_eq!(err.path, vec![PathSegment::Variant("A".into()), PathSegment::Index(0)]);
    }

    #[test]
    fn variants_are_found_by_index_not_position() {
        let mut b = TypeGraphBuilder::new();
        let u8_id = b.add(TypeDefinition::new(Shape::Primitive(Primitive::U8)));
        let ty = b.add(TypeDefinition::new(Shape::Variant(vec![
            Variant::new("A", 5, vec![]),
            Variant::new("B", 2, vec![Field::unnamed(u8_id)]),
            Variant::new("C", 9, vec![Field::named("c", u8_id)]),
        ])));
        let types = b.build().unwrap();

        let a = decode_value_exact(&[5], ty, &types).unwrap();
        assert_eq!(a.as_variant().map(|v| (v.name.as_str(), v.index)), Some(("A", Some(5))));
        let b = decode_value_exact(&[2, 7], ty, &types).unwrap();
        assert_eq!(b, Value::unnamed_variant("B", [Value::u128(7)]));
        let c = decode_value_exact(&[9, 8], ty, &types).unwrap();
        assert_eq!(c, Value::named_variant("C", [("c", Value::u128(8))]));

        // Positions 0 and 1 exist, but no variant has those indexes.
        for index in [0, 1, 3] {
            let err = decode_value_exact(&[index, 0], ty, &types).unwrap_err();
            assert_eq!(err.kind, DecodeErrorKind::UnknownVariantIndex { index, type_id: ty });
        }
    }

    #[test]
    fn huge_length_prefixes_fail_without_allocating() {
        // A compact length of 2^30 - 1, followed by almost nothing.
        let bytes = [0xfe, 0xff, 0xff, 0xff, 1, 0, 0, 0];

        let (types, id) = graph_for::<Vec<u32>>();
        let err = decode_value_exact(&bytes, id, &types).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TruncatedInput { needed: 4, available: 0 });
        assert_eq!(err.path, vec![PathSegment::Index(1)]);

        let (types, id) = graph_for::<Vec<u8>>();
        let err = decode_value_exact(&bytes, id, &types).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TruncatedInput { needed: 0x3fff_ffff, available: 4 });
    }

    #[test]
    fn zero_sized_items_are_capped() {
        // Vec<()>, where each item takes no bytes at all.
        let types = TypeGraph::from_types(vec![
            TypeDefinition::new(Shape::Tuple(vec![])),
            TypeDefinition::new(Shape::Sequence(TypeId(0))),
        ]);
        let err = decode_value_exact(&[0xfe, 0xff, 0xff, 0xff], TypeId(1), &types).unwrap_err();
        let max = DecodeOptions::default().max_zero_sized_items;
        assert_eq!(err.offset, 0);
        assert_eq!(err.kind, DecodeErrorKind::TooManyZeroSizedItems { len: 0x3fff_ffff, max });

        // Within the limit they decode as normal.
        let value = decode_value_exact(&[12], TypeId(1), &types).unwrap();
        assert_eq!(value, Value::sequence([Value::unit(), Value::unit(), Value::unit()]));

        let options = DecodeOptions { max_zero_sized_items: 2, ..DecodeOptions::default() };
        let err = decode_value_exact_with(&[12], TypeId(1), &types, &options).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TooManyZeroSizedItems { len: 3, max: 2 });
    }

    #[test]
    fn self_containing_types_stop_at_the_depth_limit() {
        // struct A { a: A, b: u8 }, which validation rejects but decoding may still be handed.
        let types = TypeGraph::from_types(vec![
            TypeDefinition::new(Shape::Composite(vec![
                Field::named("a", TypeId(0)),
                Field::named("b", TypeId(1)),
            ])),
            TypeDefinition::new(Shape::Primitive(Primitive::U8)),
        ]);
        assert!(types.validate_all().is_err());

        let err = decode_value_exact(&[1, 2, 3], TypeId(0), &types).unwrap_err();
        let max = DecodeOptions::default().max_depth;
        assert_eq!(err.kind, DecodeErrorKind::TooDeeplyNested(max));
        assert_eq!(err.path.len(), max);
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn nesting_within_the_depth_limit_is_fine() {
        let (types, id) = graph_for::<Call>();
        let mut call = Call::Kill;
        for _ in 0..20 {
            call = Call::Batch(vec![call]);
        }
        let bytes = call.encode();

        assert!(decode_value_exact(&bytes, id, &types).is_ok());
        let options = DecodeOptions { max_depth: 10, ..DecodeOptions::default() };
        let err = decode_value_exact_with(&bytes, id, &types, &options).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TooDeeplyNested(10));
    }

    #[test]
    fn wire_errors_keep_their_kind() {
        let codec = parity_scale_codec::Error::from("bad option");
        let err = wire::Error {
            offset: 3,
            kind: wire::ErrorKind::Codec { what: "Option<u8>", error: codec.clone() },
        };
        let kind = DecodeErrorKind::Codec { what: "Option<u8>", error: codec };
        assert_eq!(DecodeError::from(err), DecodeError::new(3, kind));

        let err = wire::Error { offset: 0, kind: wire::ErrorKind::InvalidBoolEncoding(4) };
        assert_eq!(DecodeError::from(err).kind, DecodeErrorKind::InvalidBoolEncoding(4));
    }

    #[test]
    fn decode_options_deserialize() {
        let opts: DecodeOptions = serde_json::from_str(r#"{ "compact": "permissive" }"#).unwrap();
        assert_eq!(opts.compact, CompactPolicy::Permissive);
        let opts: DecodeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, DecodeOptions::default());
        let opts: DecodeOptions = serde_json::from_str(r#"{ "maxDepth": 8 }"#).unwrap();
        assert_eq!(opts.max_depth, 8);
        assert_eq!(opts.max_zero_sized_items, DecodeOptions::default().max_zero_sized_items);
    }
}
