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

//! This module provides [`Value`], a dynamically typed representation of anything that can be
//! SCALE encoded. Values are produced by [`crate::decode::decode_value()`] and consumed by
//! [`crate::encode::encode_value()`].
//!
//! # Example
//!
//! ```rust
//! use scale_metadata_codec::value::Value;
//!
//! let transfer = Value::named_variant("transfer", [
//!     ("dest", Value::bytes([1u8; 32])),
//!     ("value", Value::u128(1_000_000)),
//! ]);
//! assert_eq!(transfer.variant_name(), Some("transfer"));
//! ```

use crate::type_graph::TypeId;
use alloc::string::String;
use alloc::vec::Vec;

/// A dynamic value. The [`TypeId`] it was decoded from, if any, is carried along to help with
/// diagnostics but plays no part in comparisons.
#[derive(Debug, Clone)]
pub struct Value {
    /// The value itself.
    pub def: ValueDef,
    /// The type this value was decoded from.
    pub type_id: Option<TypeId>,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.def == other.def
    }
}

/// The different kinds of [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValueDef {
    /// The unit value; empty tuples and field-less composites decode to this.
    Unit,
    /// A boolean.
    Bool(bool),
    /// A unicode character.
    Char(char),
    /// Any unsigned integer up to 128 bits.
    UInt(u128),
    /// Any signed integer up to 128 bits.
    Int(i128),
    /// A 256 bit unsigned integer as little endian bytes.
    BigUInt([u8; 32]),
    /// A 256 bit signed integer as little endian bytes.
    BigInt([u8; 32]),
    /// A string.
    Str(String),
    /// A sequence or array of bytes.
    Bytes(Vec<u8>),
    /// Sequences, arrays, tuples and composites with unnamed fields.
    Sequence(Vec<Value>),
    /// A composite with named fields, in declaration order.
    Map(Vec<(String, Value)>),
    /// A variant.
    Variant(VariantValue),
    /// A sequence of bits.
    BitSequence(Vec<bool>),
}

impl ValueDef {
    /// A short human friendly description of this kind of value, for use in errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ValueDef::Unit => "unit",
            ValueDef::Bool(_) => "bool",
            ValueDef::Char(_) => "char",
            ValueDef::UInt(_) => "unsigned integer",
            ValueDef::Int(_) => "signed integer",
            ValueDef::BigUInt(_) => "256 bit unsigned integer",
            ValueDef::BigInt(_) => "256 bit signed integer",
            ValueDef::Str(_) => "string",
            ValueDef::Bytes(_) => "bytes",
            ValueDef::Sequence(_) => "sequence",
            ValueDef::Map(_) => "map",
            ValueDef::Variant(_) => "variant",
            ValueDef::BitSequence(_) => "bit sequence",
        }
    }
}

/// A variant value. The index is filled in when decoding; when encoding it is optional, and
/// if present must agree with the index of the named variant.
///
/// A missing index compares equal to any index, so a decoded value equals one built by hand.
/// Equality is therefore not transitive, and neither this nor [`Value`] implements [`Eq`].
#[derive(Debug, Clone)]
pub struct VariantValue {
    /// The variant name.
    pub name: String,
    /// The variant index.
    pub index: Option<u8>,
    /// The variant fields.
    pub fields: Composite,
}

impl PartialEq for VariantValue {
    fn eq(&self, other: &Self) -> bool {
        let index_matches = match (self.index, other.index) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        index_matches && self.name == other.name && self.fields == other.fields
    }
}

/// The fields of a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Composite {
    /// Named fields.
    Named(Vec<(String, Value)>),
    /// Unnamed fields.
    Unnamed(Vec<Value>),
}

impl Composite {
    /// The number of fields.
    pub fn len(&self) -> usize {
        match self {
            Composite::Named(fields) => fields.len(),
            Composite::Unnamed(fields) => fields.len(),
        }
    }

    /// Are there no fields?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the field values, ignoring any names.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        let (named, unnamed): (&[(String, Value)], &[Value]) = match self {
            Composite::Named(fields) => (fields, &[]),
            Composite::Unnamed(fields) => (&[], fields),
        };
        named.iter().map(|(_, v)| v).chain(unnamed)
    }
}

impl Value {
    /// Wrap a [`ValueDef`] with no type information.
    pub fn new(def: ValueDef) -> Self {
        Value { def, type_id: None }
    }

    /// Attach the type this value corresponds to.
    pub fn with_type_id(mut self, id: TypeId) -> Self {
        self.type_id = Some(id);
        self
    }

    /// The unit value.
    pub fn unit() -> Self {
        Value::new(ValueDef::Unit)
    }

    /// A boolean value.
    pub fn bool(b: bool) -> Self {
        Value::new(ValueDef::Bool(b))
    }

    /// A character value.
    pub fn char(c: char) -> Self {
        Value::new(ValueDef::Char(c))
    }

    /// An unsigned integer value.
    pub fn u128(n: u128) -> Self {
        Value::new(ValueDef::UInt(n))
    }

    /// A signed integer value.
    pub fn i128(n: i128) -> Self {
        Value::new(ValueDef::Int(n))
    }

    /// A string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::new(ValueDef::Str(s.into()))
    }

    /// A byte string value.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::new(ValueDef::Bytes(bytes.into()))
    }

    /// A sequence of values.
    pub fn sequence(values: impl IntoIterator<Item = Value>) -> Self {
        Value::new(ValueDef::Sequence(values.into_iter().collect()))
    }

    /// A composite with named fields.
    pub fn map<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::new(ValueDef::Map(fields.into_iter().map(|(k, v)| (k.into(), v)).collect()))
    }

    /// A variant with the given fields.
    pub fn variant(name: impl Into<String>, fields: Composite) -> Self {
        Value::new(ValueDef::Variant(VariantValue { name: name.into(), index: None, fields }))
    }

    /// A variant with named fields.
    pub fn named_variant<K: Into<String>>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::variant(name, Composite::Named(fields))
    }

    /// A variant with unnamed fields.
    pub fn unnamed_variant(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = Value>,
    ) -> Self {
        Value::variant(name, Composite::Unnamed(fields.into_iter().collect()))
    }

    /// A sequence of bits.
    pub fn bit_sequence(bits: impl IntoIterator<Item = bool>) -> Self {
        Value::new(ValueDef::BitSequence(bits.into_iter().collect()))
    }

    /// The unsigned integer, if this is one.
    pub fn as_u128(&self) -> Option<u128> {
        match self.def {
            ValueDef::UInt(n) => Some(n),
            ValueDef::Int(n) => u128::try_from(n).ok(),
            _ => None,
        }
    }

    /// The signed integer, if this is one.
    pub fn as_i128(&self) -> Option<i128> {
        match self.def {
            ValueDef::Int(n) => Some(n),
            ValueDef::UInt(n) => i128::try_from(n).ok(),
            _ => None,
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self.def {
            ValueDef::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match &self.def {
            ValueDef::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The bytes, if this is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.def {
            ValueDef::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The variant, if this is one.
    pub fn as_variant(&self) -> Option<&VariantValue> {
        match &self.def {
            ValueDef::Variant(v) => Some(v),
            _ => None,
        }
    }

    /// The variant name, if this is a variant.
    pub fn variant_name(&self) -> Option<&str> {
        self.as_variant().map(|v| v.name.as_str())
    }

    /// Look up a named field of a map or of a variant with named fields.
    pub fn field(&self, name: &str) -> Option<&Value> {
        let fields = match &self.def {
            ValueDef::Map(fields) => fields,
            ValueDef::Variant(VariantValue { fields: Composite::Named(fields), .. }) => fields,
            _ => return None,
        };
        fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Look up a positional item of a sequence or of a variant with unnamed fields.
    pub fn at(&self, idx: usize) -> Option<&Value> {
        match &self.def {
            ValueDef::Sequence(items) => items.get(idx),
            ValueDef::Variant(VariantValue { fields: Composite::Unnamed(items), .. }) => {
                items.get(idx)
            }
            _ => None,
        }
    }
}

/// A step into a value, used to say where in a value an encode or decode error happened.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum PathSegment {
    /// A named field.
    #[display(fmt = ".{_0}")]
    Field(String),
    /// A positional field or item.
    #[display(fmt = "[{_0}]")]
    Index(usize),
    /// A variant.
    #[display(fmt = "::{_0}")]
    Variant(String),
}

/// Display a path into a value, eg `.dest::Id[0]`.
pub(crate) struct DisplayPath<'a>(pub &'a [PathSegment]);

impl<'a> core::fmt::Display for DisplayPath<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for segment in self.0 {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn type_ids_are_ignored_in_comparisons() {
        let a = Value::u128(3).with_type_id(TypeId(7));
        let b = Value::u128(3);
        assert_eq!(a, b);
    }

    #[test]
    fn variant_index_only_compared_when_both_present() {
        let decoded = Value::new(ValueDef::Variant(VariantValue {
            name: "Some".into(),
            index: Some(1),
            fields: Composite::Unnamed(vec![Value::bool(true)]),
        }));
        let built = Value::unnamed_variant("Some", [Value::bool(true)]);
        assert_eq!(decoded, built);

        let wrong_index = Value::new(ValueDef::Variant(VariantValue {
            name: "Some".into(),
            index: Some(2),
            fields: Composite::Unnamed(vec![Value::bool(true)]),
        }));
        assert_ne!(decoded, wrong_index);

        // Both equal the hand built value, but not each other.
        assert_eq!(built, wrong_index);
    }

    #[test]
    fn field_and_index_accessors() {
        let v = Value::map([("a", Value::u128(1)), ("b", Value::sequence([Value::bool(false)]))]);
        assert_eq!(v.field("a").and_then(Value::as_u128), Some(1));
        assert_eq!(v.field("b").and_then(|b| b.at(0)).and_then(Value::as_bool), Some(false));
        assert!(v.field("c").is_none());
    }

    #[test]
    fn paths_display_nicely() {
        let path = [
            PathSegment::Field("dest".into()),
            PathSegment::Variant("Id".into()),
            PathSegment::Index(3),
        ];
        assert_eq!(DisplayPath(&path).to_string(), ".dest::Id[3]");
        assert_eq!(DisplayPath(&[]).to_string(), "<root>");
    }
}
