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

//! SCALE encoding a [`Value`] as the [`TypeId`] of some [`TypeGraph`]. This is the inverse of
//! [`crate::decode`]: anything decoded from some type can be encoded back to the same bytes.
//!
//! Variants are picked by name, named composites are matched to fields by name (so the
//! order of fields in a [`ValueDef::Map`] doesn't matter), and everything else is positional.

use crate::bits;
use crate::type_graph::{CompactTarget, Field, Primitive, Shape, TypeGraph, TypeGraphError, TypeId};
use crate::value::{Composite, DisplayPath, PathSegment, Value, ValueDef};
use crate::wire;
use alloc::string::String;
use alloc::vec::Vec;

/// An error encoding a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    /// Where in the value being encoded the error occurred, outermost first.
    pub path: Vec<PathSegment>,
    /// What went wrong.
    pub kind: EncodeErrorKind,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Error encoding value (location {}): {}", DisplayPath(&self.path), self.kind)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

impl EncodeError {
    fn new(kind: EncodeErrorKind) -> Self {
        EncodeError { path: Vec::new(), kind }
    }

    fn at(mut self, segment: PathSegment) -> Self {
        self.path.insert(0, segment);
        self
    }
}

impl From<TypeGraphError> for EncodeError {
    fn from(e: TypeGraphError) -> Self {
        let kind = match e {
            TypeGraphError::TypeNotFound(id) => EncodeErrorKind::TypeNotFound(id),
            e @ TypeGraphError::UnsupportedBitSequenceFormat { .. } => {
                EncodeErrorKind::UnsupportedBitSequenceFormat(e)
            }
            e => EncodeErrorKind::InvalidType(e),
        };
        EncodeError::new(kind)
    }
}

/// The kind of error encountered encoding a value.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum EncodeErrorKind {
    #[display(fmt = "Type with ID {_0} not found")]
    TypeNotFound(TypeId),
    #[display(fmt = "Cannot encode a {found} value as a {expected} type")]
    WrongShape { expected: &'static str, found: &'static str },
    #[display(fmt = "Expected {expected} fields but got {found}")]
    WrongFieldCount { expected: usize, found: usize },
    #[display(fmt = "Expected {expected} items but got {found}")]
    WrongLength { expected: usize, found: usize },
    #[display(fmt = "Field '{_0}' is missing")]
    MissingField(String),
    #[display(fmt = "No variant named '{_0}'")]
    UnknownVariant(String),
    #[display(fmt = "Variant '{name}' has index {expected} but the value says {found}")]
    VariantIndexMismatch { name: String, expected: u8, found: u8 },
    #[display(fmt = "Value {value} is out of range for {target:?}")]
    IntegerOutOfRange { value: String, target: Primitive },
    #[display(fmt = "{_0}")]
    UnsupportedBitSequenceFormat(TypeGraphError),
    #[display(fmt = "{_0}")]
    InvalidType(TypeGraphError),
}

/// Encode a value as the given type.
pub fn encode_value(
    value: &Value,
    type_id: TypeId,
    types: &TypeGraph,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    encode_value_to(value, type_id, types, &mut out)?;
    Ok(out)
}

/// Encode a value as the given type, appending the bytes to `out`. If an error is returned,
/// `out` may have had some bytes appended to it.
pub fn encode_value_to(
    value: &Value,
    type_id: TypeId,
    types: &TypeGraph,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    Encoder { types }.encode(value, type_id, out)
}

struct Encoder<'a> {
    types: &'a TypeGraph,
}

impl<'a> Encoder<'a> {
    fn encode(&self, value: &Value, type_id: TypeId, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let (inner_id, shape) = self.types.flatten(type_id)?;
        let mismatch = || {
            EncodeError::new(EncodeErrorKind::WrongShape {
                expected: shape.kind_name(),
                found: value.def.kind_name(),
            })
        };

        match (shape, &value.def) {
            (Shape::Primitive(p), _) => encode_primitive(*p, &value.def, out)?,
            (Shape::Compact(of), _) => {
                let target = self.types.compact_target(*of)?;
                match (target, &value.def) {
                    (CompactTarget::Unit, ValueDef::Unit) => {}
                    (CompactTarget::Int(p), _) => {
                        let n = value.as_u128().ok_or_else(mismatch)?;
                        if n > target.max_value() {
                            return Err(out_of_range(n, p));
                        }
                        wire::encode_compact(n, out);
                    }
                    _ => return Err(mismatch()),
                }
            }
            (Shape::Sequence(elem), ValueDef::Bytes(bytes)) if self.is_byte(*elem) => {
                wire::encode_bytes(bytes, out)
            }
            (Shape::Sequence(elem), ValueDef::Sequence(items)) => {
                wire::encode_compact(items.len() as u128, out);
                self.encode_items(items, *elem, out)?;
            }
            (Shape::Array(elem, len), ValueDef::Bytes(bytes)) if self.is_byte(*elem) => {
                check_len(*len as usize, bytes.len())?;
                out.extend_from_slice(bytes);
            }
            (Shape::Array(elem, len), ValueDef::Sequence(items)) => {
                check_len(*len as usize, items.len())?;
                self.encode_items(items, *elem, out)?;
            }
            (Shape::Tuple(ids), ValueDef::Unit) if ids.is_empty() => {}
            (Shape::Tuple(ids), ValueDef::Sequence(items)) => {
                if ids.len() != items.len() {
                    return Err(EncodeError::new(EncodeErrorKind::WrongFieldCount {
                        expected: ids.len(),
                        found: items.len(),
                    }));
                }
                for (idx, (item, id)) in items.iter().zip(ids).enumerate() {
                    self.encode(item, *id, out).map_err(|e| e.at(PathSegment::Index(idx)))?;
                }
            }
            (Shape::Composite(fields), ValueDef::Unit) if fields.is_empty() => {}
            (Shape::Composite(fields), ValueDef::Map(named)) => {
                self.encode_named_fields(named, fields, out)?
            }
            (Shape::Composite(fields), ValueDef::Sequence(items)) => {
                self.encode_unnamed_fields(items, fields, out)?
            }
            (Shape::Variant(variants), ValueDef::Variant(v)) => {
                let variant = variants.iter().find(|var| var.name == v.name).ok_or_else(|| {
                    EncodeError::new(EncodeErrorKind::UnknownVariant(v.name.clone()))
                })?;
                if let Some(found) = v.index.filter(|idx| *idx != variant.index) {
                    return Err(EncodeError::new(EncodeErrorKind::VariantIndexMismatch {
                        name: v.name.clone(),
                        expected: variant.index,
                        found,
                    }));
                }
                out.push(variant.index);
                match &v.fields {
                    Composite::Named(named) => {
                        self.encode_named_fields(named, &variant.fields, out)
                    }
                    Composite::Unnamed(items) => {
                        self.encode_unnamed_fields(items, &variant.fields, out)
                    }
                }
                .map_err(|e| e.at(PathSegment::Variant(v.name.clone())))?;
            }
            (Shape::BitSequence { .. }, ValueDef::BitSequence(bits)) => {
                let (store, order) = self.types.bit_sequence_format(inner_id)?;
                bits::encode(bits, store, order, out);
            }
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    fn is_byte(&self, id: TypeId) -> bool {
        matches!(self.types.flatten(id), Ok((_, Shape::Primitive(Primitive::U8))))
    }

    fn encode_items(
        &self,
        items: &[Value],
        elem: TypeId,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        for (idx, item) in items.iter().enumerate() {
            self.encode(item, elem, out).map_err(|e| e.at(PathSegment::Index(idx)))?;
        }
        Ok(())
    }

    fn encode_named_fields(
        &self,
        named: &[(String, Value)],
        fields: &[Field],
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        if named.len() != fields.len() {
            return Err(EncodeError::new(EncodeErrorKind::WrongFieldCount {
                expected: fields.len(),
                found: named.len(),
            }));
        }
        // Unnamed fields can't be matched by name; fall back to the order given.
        if fields.iter().any(|f| f.name.is_none()) {
            for (idx, ((_, item), field)) in named.iter().zip(fields).enumerate() {
                self.encode(item, field.ty, out).map_err(|e| e.at(PathSegment::Index(idx)))?;
            }
            return Ok(());
        }
        for field in fields {
            let name = field.name.as_deref().unwrap_or_default();
            let (_, item) = named
                .iter()
                .find(|(n, _)| n == name)
                .ok_or_else(|| EncodeError::new(EncodeErrorKind::MissingField(name.into())))?;
            self.encode(item, field.ty, out).map_err(|e| e.at(PathSegment::Field(name.into())))?;
        }
        Ok(())
    }

    fn encode_unnamed_fields(
        &self,
        items: &[Value],
        fields: &[Field],
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        if items.len() != fields.len() {
            return Err(EncodeError::new(EncodeErrorKind::WrongFieldCount {
                expected: fields.len(),
                found: items.len(),
            }));
        }
        for (idx, (item, field)) in items.iter().zip(fields).enumerate() {
            self.encode(item, field.ty, out).map_err(|e| e.at(PathSegment::Index(idx)))?;
        }
        Ok(())
    }
}

fn check_len(expected: usize, found: usize) -> Result<(), EncodeError> {
    if expected == found {
        Ok(())
    } else {
        Err(EncodeError::new(EncodeErrorKind::WrongLength { expected, found }))
    }
}

fn out_of_range(value: impl core::fmt::Display, target: Primitive) -> EncodeError {
    use alloc::string::ToString;
    EncodeError::new(EncodeErrorKind::IntegerOutOfRange { value: value.to_string(), target })
}

fn primitive_name(p: Primitive) -> &'static str {
    match p {
        Primitive::Bool => "bool",
        Primitive::Char => "char",
        Primitive::Str => "str",
        Primitive::U8 => "u8",
        Primitive::U16 => "u16",
        Primitive::U32 => "u32",
        Primitive::U64 => "u64",
        Primitive::U128 => "u128",
        Primitive::U256 => "u256",
        Primitive::I8 => "i8",
        Primitive::I16 => "i16",
        Primitive::I32 => "i32",
        Primitive::I64 => "i64",
        Primitive::I128 => "i128",
        Primitive::I256 => "i256",
    }
}

fn encode_primitive(p: Primitive, def: &ValueDef, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    use Primitive::*;
    match (p, def) {
        (Bool, ValueDef::Bool(b)) => out.push(u8::from(*b)),
        (Char, ValueDef::Char(c)) => out.extend_from_slice(&u32::from(*c).to_le_bytes()),
        (Str, ValueDef::Str(s)) => wire::encode_str(s, out),
        (U256, ValueDef::BigUInt(bytes)) | (I256, ValueDef::BigInt(bytes)) => {
            out.extend_from_slice(bytes)
        }
        (U256, ValueDef::UInt(n)) => {
            out.extend_from_slice(&n.to_le_bytes());
            out.extend_from_slice(&[0; 16]);
        }
        (I256, ValueDef::Int(n)) => {
            out.extend_from_slice(&n.to_le_bytes());
            let sign = if *n < 0 { 0xff } else { 0 };
            out.extend_from_slice(&[sign; 16]);
        }
        (U8 | U16 | U32 | U64 | U128, ValueDef::UInt(n)) => encode_uint(*n, p, out)?,
        (U8 | U16 | U32 | U64 | U128, ValueDef::Int(n)) => {
            let n = u128::try_from(*n).map_err(|_| out_of_range(n, p))?;
            encode_uint(n, p, out)?
        }
        (I8 | I16 | I32 | I64 | I128, ValueDef::Int(n)) => encode_int(*n, p, out)?,
        (I8 | I16 | I32 | I64 | I128, ValueDef::UInt(n)) => {
            let n = i128::try_from(*n).map_err(|_| out_of_range(n, p))?;
            encode_int(n, p, out)?
        }
        _ => {
            return Err(EncodeError::new(EncodeErrorKind::WrongShape {
                expected: primitive_name(p),
                found: def.kind_name(),
            }))
        }
    }
    Ok(())
}

fn encode_uint(n: u128, p: Primitive, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let (width, max) = match p {
        Primitive::U8 => (1, u8::MAX as u128),
        Primitive::U16 => (2, u16::MAX as u128),
        Primitive::U32 => (4, u32::MAX as u128),
        Primitive::U64 => (8, u64::MAX as u128),
        _ => (16, u128::MAX),
    };
    if n > max {
        return Err(out_of_range(n, p));
    }
    out.extend_from_slice(&n.to_le_bytes()[..width]);
    Ok(())
}

fn encode_int(n: i128, p: Primitive, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let (width, min, max) = match p {
        Primitive::I8 => (1, i8::MIN as i128, i8::MAX as i128),
        Primitive::I16 => (2, i16::MIN as i128, i16::MAX as i128),
        Primitive::I32 => (4, i32::MIN as i128, i32::MAX as i128),
        Primitive::I64 => (8, i64::MIN as i128, i64::MAX as i128),
        _ => (16, i128::MIN, i128::MAX),
    };
    if n < min || n > max {
        return Err(out_of_range(n, p));
    }
    // Truncating the two's complement bytes keeps the sign for in range values.
    out.extend_from_slice(&n.to_le_bytes()[..width]);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::decode_value_exact;
    use crate::test_utils::graph_for;
    use crate::type_graph::{TypeDefinition, TypeGraphBuilder, Variant};
    use alloc::vec;
    use parity_scale_codec::{Compact, Encode};
    use scale_info::TypeInfo;

    #[allow(dead_code)]
    #[derive(Encode, TypeInfo, Clone)]
    enum MultiAddress {
        Id([u8; 4]),
        Index(#[codec(compact)] u32),
        Raw(Vec<u8>),
    }

    #[allow(dead_code)]
    #[derive(Encode, TypeInfo, Clone)]
    struct Transfer {
        dest: MultiAddress,
        #[codec(compact)]
        value: u128,
        tip: Option<i16>,
        tags: Vec<(u8, bool)>,
    }

    fn sample() -> Transfer {
        Transfer {
            dest: MultiAddress::Index(70_000),
            value: 1 << 40,
            tip: Some(-3),
            tags: vec![(1, true), (2, false)],
        }
    }

    #[test]
    fn hand_built_values_match_parity_scale_codec() {
        let (types, id) = graph_for::<Transfer>();
        let value = Value::map([
            // Field order doesn't matter for named composites.
            ("value", Value::u128(1 << 40)),
            ("dest", Value::unnamed_variant("Index", [Value::u128(70_000)])),
            ("tip", Value::unnamed_variant("Some", [Value::i128(-3)])),
            (
                "tags",
                Value::sequence([
                    Value::sequence([Value::u128(1), Value::bool(true)]),
                    Value::sequence([Value::u128(2), Value::bool(false)]),
                ]),
            ),
        ]);
        assert_eq!(encode_value(&value, id, &types).unwrap(), sample().encode());
    }

    #[test]
    fn decoded_values_encode_back_to_the_same_bytes() {
        let (types, id) = graph_for::<Vec<Transfer>>();
        let mut raw = sample();
        raw.dest = MultiAddress::Raw(vec![9; 70]);
        let bytes = vec![sample(), raw].encode();

        let value = decode_value_exact(&bytes, id, &types).unwrap();
        assert_eq!(encode_value(&value, id, &types).unwrap(), bytes);
    }

    #[test]
    fn every_shape_round_trips() {
        let mut b = TypeGraphBuilder::new();
        let order = |name| TypeDefinition::new(Shape::Composite(vec![])).with_path(name);
        let lsb0 = b.add(order("bitvec::order::Lsb0"));
        let msb0 = b.add(order("bitvec::order::Msb0"));

        let mut add = |shape| b.add(TypeDefinition::new(shape));
        let u8_id = add(Shape::Primitive(Primitive::U8));
        let u16_id = add(Shape::Primitive(Primitive::U16));
        let u32_id = add(Shape::Primitive(Primitive::U32));
        let u64_id = add(Shape::Primitive(Primitive::U64));
        let i128_id = add(Shape::Primitive(Primitive::I128));
        let u256_id = add(Shape::Primitive(Primitive::U256));
        let char_id = add(Shape::Primitive(Primitive::Char));
        let str_id = add(Shape::Primitive(Primitive::Str));
        let bool_id = add(Shape::Primitive(Primitive::Bool));

        let u16_array = add(Shape::Array(u16_id, 3));
        let byte_array = add(Shape::Array(u8_id, 4));
        let bools = add(Shape::Sequence(bool_id));
        let pair = add(Shape::Tuple(vec![u8_id, str_id]));
        let unit = add(Shape::Tuple(vec![]));
        let wrapper = add(Shape::Composite(vec![Field::unnamed(u64_id)]));
        let compact_wrapper = add(Shape::Compact(wrapper));
        let compact_unit = add(Shape::Compact(unit));
        let point =
            add(Shape::Composite(vec![Field::named("x", u16_id), Field::named("flags", bools)]));
        let bits_u8_msb0 = add(Shape::BitSequence { store: u8_id, order: msb0 });
        let bits_u32_lsb0 = add(Shape::BitSequence { store: u32_id, order: lsb0 });

        let x_fields = vec![Field::named("a", char_id), Field::named("b", i128_id)];
        let inner =
            add(Shape::Variant(vec![Variant::new("Y", 0, vec![]), Variant::new("X", 9, x_fields)]));
        let outer = add(Shape::Variant(vec![
            Variant::new("A", 5, vec![Field::unnamed(inner)]),
            Variant::new("B", 2, vec![]),
        ]));
        let types = b.build().unwrap();

        let ten_bits = [true, false, false, true, true, false, true, false, false, true];
        let x =
            Value::named_variant("X", [("a", Value::char('é')), ("b", Value::i128(i128::MIN))]);
        let cases = [
            (u16_array, Value::sequence([1, 2, 3].map(Value::u128)), Some([1u16, 2, 3].encode())),
            (byte_array, Value::bytes([1, 2, 3, 4]), Some([1u8, 2, 3, 4].encode())),
            (bools, Value::sequence([Value::bool(true)]), Some(vec![true].encode())),
            (pair, Value::sequence([Value::u128(1), Value::string("a")]), None),
            (unit, Value::unit(), Some(vec![])),
            (compact_wrapper, Value::u128(1 << 40), Some(Compact(1u64 << 40).encode())),
            (compact_unit, Value::unit(), Some(vec![])),
            (point, Value::map([("x", Value::u128(7)), ("flags", Value::sequence([]))]), None),
            (bits_u8_msb0, Value::bit_sequence(ten_bits), None),
            (bits_u32_lsb0, Value::bit_sequence(ten_bits), None),
            (outer, Value::unnamed_variant("A", [x]), None),
            (outer, Value::unnamed_variant("B", []), Some(vec![2])),
            (char_id, Value::char('\u{10FFFF}'), Some(0x10FFFFu32.encode())),
            (i128_id, Value::i128(-1), Some((-1i128).encode())),
            (u256_id, Value::new(ValueDef::BigUInt([7; 32])), Some(vec![7; 32])),
        ];

        for (id, value, expected) in cases {
            let bytes = encode_value(&value, id, &types)
                .unwrap_or_else(|e| panic!("encoding {value:?} as {id}: {e}"));
            if let Some(expected) = expected {
                assert_eq!(bytes, expected, "encoding {value:?} as {id}");
            }
            let decoded = decode_value_exact(&bytes, id, &types)
                .unwrap_or_else(|e| panic!("decoding {value:?} as {id}: {e}"));
            assert_eq!(decoded, value, "type {id}");
        }
    }

    #[test]
    fn variant_errors() {
        let (types, id) = graph_for::<MultiAddress>();

        let err = encode_value(&Value::unnamed_variant("Nope", []), id, &types).unwrap_err();
        assert_eq!(err.kind, EncodeErrorKind::UnknownVariant("Nope".into()));

        let mut wrong_index = Value::unnamed_variant("Raw", [Value::bytes(vec![])]);
        if let ValueDef::Variant(v) = &mut wrong_index.def {
            v.index = Some(0);
        }
        let err = encode_value(&wrong_index, id, &types).unwrap_err();
        assert_eq!(
            err.kind,
            EncodeErrorKind::VariantIndexMismatch { name: "Raw".into(), expected: 2, found: 0 }
        );

        let too_many = Value::unnamed_variant("Index", [Value::u128(1), Value::u128(2)]);
        let err = encode_value(&too_many, id, &types).unwrap_err();
        assert_eq!(err.kind, EncodeErrorKind::WrongFieldCount { expected: 1, found: 2 });
        assert_eq!(err.path, vec![PathSegment::Variant("Index".into())]);
    }

    #[test]
    fn integer_range_is_checked() {
        let (types, id) = graph_for::<u8>();
        let err = encode_value(&Value::u128(256), id, &types).unwrap_err();
        assert_eq!(
            err.kind,
            EncodeErrorKind::IntegerOutOfRange { value: "256".into(), target: Primitive::U8 }
        );
        assert_eq!(encode_value(&Value::i128(255), id, &types).unwrap(), vec![255]);

        let (types, id) = graph_for::<i8>();
        assert_eq!(encode_value(&Value::i128(-128), id, &types).unwrap(), vec![0x80]);
        assert!(encode_value(&Value::i128(-129), id, &types).is_err());
    }

    #[test]
    fn arrays_check_their_length() {
        let (types, id) = graph_for::<[u8; 4]>();
        let err = encode_value(&Value::bytes(vec![1, 2, 3]), id, &types).unwrap_err();
        assert_eq!(err.kind, EncodeErrorKind::WrongLength { expected: 4, found: 3 });
        let encoded = encode_value(&Value::bytes(vec![1, 2, 3, 4]), id, &types).unwrap();
        assert_eq!(encoded, [1, 2, 3, 4]);
    }

    #[test]
    fn missing_fields_and_wrong_shapes() {
        let (types, id) = graph_for::<Transfer>();
        let value = Value::map([
            ("dest", Value::unnamed_variant("Id", [Value::bytes([0u8; 4])])),
            ("value", Value::u128(1)),
            ("tip", Value::unnamed_variant("None", [])),
            ("nope", Value::sequence([])),
        ]);
        let err = encode_value(&value, id, &types).unwrap_err();
        assert_eq!(err.kind, EncodeErrorKind::MissingField("tags".into()));

        let err = encode_value(&Value::string("hi"), id, &types).unwrap_err();
        let expected = EncodeErrorKind::WrongShape { expected: "composite", found: "string" };
        assert_eq!(err.kind, expected);
    }

    #[test]
    fn encodes_bit_sequences_and_256_bit_ints() {
        let mut b = TypeGraphBuilder::new();
        let store = b.add(TypeDefinition::new(Shape::Primitive(Primitive::U16)));
        let order =
            b.add(TypeDefinition::new(Shape::Composite(vec![])).with_path("bitvec::order::Lsb0"));
        let bits = b.add(TypeDefinition::new(Shape::BitSequence { store, order }));
        let i256 = b.add(TypeDefinition::new(Shape::Primitive(Primitive::I256)));
        let types = b.build().unwrap();

        let value = Value::bit_sequence([true, false, true]);
        let encoded = encode_value(&value, bits, &types).unwrap();
        assert_eq!(encoded, vec![12, 0b101, 0]);

        let encoded = encode_value(&Value::i128(-1), i256, &types).unwrap();
        assert_eq!(encoded, vec![0xff; 32]);
        let decoded = decode_value_exact(&encoded, i256, &types).unwrap();
        assert_eq!(decoded.def, ValueDef::BigInt([0xff; 32]));
    }
}
