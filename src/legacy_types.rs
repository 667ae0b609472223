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

//! This module provides [`LegacyTypes`], which describes the named types that pre-V14 metadata
//! refers to, and is constructed by deserializing some data into it. JSON is the expected input
//! format, though in theory others can be used too.

use crate::type_registry_set::TypeRegistrySet;
use crate::type_shape::{Field, Primitive, TypeShape, Variant, VariantDesc};
use crate::{InsertName, LookupName, TypeRegistry};
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::HashMap;
use serde::de::Deserialize;
use serde::de::Error;

/// The types used by some chain to describe legacy metadata.
///
/// Use [`LegacyTypes::for_spec_version()`] to get back a [`TypeRegistrySet`] which can be handed
/// to [`crate::Metadata::parse_with_legacy_types()`]. Use [`serde`] to deserialize something into
/// this struct (the deserialization logic is tuned to work best with `serde_json`, but any self
/// describing format should work so long as it's the right shape).
///
/// # Example
///
/// ```rust
/// use scale_metadata_codec::LegacyTypes;
///
/// let types: LegacyTypes = serde_json::from_str(r#"{
///     "global": {
///         "types": {
///             "AccountId": "[u8; 32]",
///             "Balance": "u128",
///             "Status": { "_enum": ["Free", "Reserved"] }
///         }
///     },
///     "forSpec": [
///         { "range": [null, 1000], "types": { "Balance": "u64" } }
///     ]
/// }"#).unwrap();
///
/// let for_old_runtime = types.for_spec_version(900);
/// assert!(for_old_runtime.resolve_str("Balance").unwrap().is_some());
/// ```
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LegacyTypes {
    // Builtins sit beneath everything else in each registry set we hand out.
    #[serde(skip, default = "TypeRegistry::basic")]
    basics: TypeRegistry,
    #[serde(default, deserialize_with = "global_table")]
    global: TypeRegistry,
    #[serde(default, deserialize_with = "spec_tables", rename = "forSpec")]
    for_spec: Vec<(SpecRange, TypeRegistry)>,
}

// An inclusive range of spec versions. Missing bounds are unbounded.
type SpecRange = (Option<u64>, Option<u64>);

impl Default for LegacyTypes {
    fn default() -> Self {
        LegacyTypes {
            basics: TypeRegistry::basic(),
            global: TypeRegistry::empty(),
            for_spec: Vec::new(),
        }
    }
}

impl LegacyTypes {
    /// The types to resolve names with for a runtime with the given spec version. Types from
    /// matching `forSpec` ranges win over global ones, and later ranges over earlier ones.
    pub fn for_spec_version(&self, spec_version: u64) -> TypeRegistrySet<'_> {
        let in_range = |&&((min, max), _): &&(SpecRange, TypeRegistry)| {
            min.map_or(true, |min| spec_version >= min)
                && max.map_or(true, |max| spec_version <= max)
        };
        [&self.basics, &self.global]
            .into_iter()
            .chain(self.for_spec.iter().filter(in_range).map(|(_, types)| types))
            .collect()
    }

    /// Add the given types to these. Where both define the same name, `other` wins.
    pub fn extend(&mut self, other: LegacyTypes) {
        self.global.extend(other.global);
        self.for_spec.extend(other.for_spec);
    }
}

// The rest of this module deserializes the JSON format; see the tests for examples of each part.

fn global_table<'de, D>(deserializer: D) -> Result<TypeRegistry, D::Error>
where
    D: serde::Deserializer<'de>,
{
    TypeTable::deserialize(deserializer).map(TypeTable::into_registry)
}

fn spec_tables<'de, D>(deserializer: D) -> Result<Vec<(SpecRange, TypeRegistry)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let tables = <Vec<SpecTypeTable>>::deserialize(deserializer)?;
    Ok(tables.into_iter().map(|t| (t.range, t.types.into_registry())).collect())
}

// `types` and `palletTypes`, as found in `global` and in each `forSpec` entry.
#[derive(serde::Deserialize, Default)]
struct TypeTable {
    #[serde(default)]
    types: HashMap<InsertName, ShapeDef>,
    #[serde(default, rename = "palletTypes")]
    pallet_types: HashMap<String, HashMap<InsertName, ShapeDef>>,
}

impl TypeTable {
    fn into_registry(self) -> TypeRegistry {
        let mut registry = TypeRegistry::empty();
        for (name, shape) in self.types {
            registry.insert(name, shape.into());
        }
        for (pallet, types) in self.pallet_types {
            for (name, shape) in types {
                registry.insert(name.in_pallet(pallet.as_str()), shape.into());
            }
        }
        registry
    }
}

#[derive(serde::Deserialize)]
struct SpecTypeTable {
    range: SpecRange,
    #[serde(flatten)]
    types: TypeTable,
}

// What a type name maps to in the JSON.
#[derive(Debug, PartialEq)]
enum ShapeDef {
    AliasOf(LookupName),
    StructOf(Vec<Field>),
    TupleOf(Vec<LookupName>),
    EnumOf(Vec<Variant>),
    // A `_set` of flags, encoded as an unsigned integer of some width.
    SetOf(Primitive),
}

impl From<ShapeDef> for TypeShape {
    fn from(value: ShapeDef) -> Self {
        match value {
            ShapeDef::AliasOf(a) => TypeShape::AliasOf(a),
            ShapeDef::StructOf(a) => TypeShape::StructOf(a),
            ShapeDef::EnumOf(a) => TypeShape::EnumOf(a),
            ShapeDef::TupleOf(a) => TypeShape::TupleOf(a),
            ShapeDef::SetOf(p) => TypeShape::Primitive(p),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ShapeDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ShapeDefVisitor;
        impl<'de> serde::de::Visitor<'de> for ShapeDefVisitor {
            type Value = ShapeDef;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.write_str("a type name, an object of fields or an array of types")
            }

            // "AccountId", "Vec<T>", "(u64, bool)" and so on.
            fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
                LookupName::parse(v)
                    .map(ShapeDef::AliasOf)
                    .map_err(|e| E::custom(format!("'{v}' is not a valid type name: {e}")))
            }

            // '{ _enum: ... }' for enum descriptions, '{ _set: ... }' for sets of flags, or
            // '{ a: ..., b: ... }' for struct descriptions.
            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let Some(first) = map.next_key::<String>()? else {
                    return Ok(ShapeDef::StructOf(Vec::new()));
                };
                match first.as_str() {
                    "_enum" => return Ok(ShapeDef::EnumOf(map.next_value::<EnumDef>()?.0)),
                    "_set" => return Ok(ShapeDef::SetOf(map.next_value::<SetDef>()?.0)),
                    _ => {}
                }

                let mut fields = vec![Field { name: first, value: map.next_value()? }];
                while let Some((name, value)) = map.next_entry()? {
                    fields.push(Field { name, value });
                }
                Ok(ShapeDef::StructOf(fields))
            }

            // ["Vec<T>", "bool"] is the same as "(Vec<T>, bool)".
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(ShapeDef::TupleOf(items))
            }

            // null is the same as "()".
            fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
                Ok(ShapeDef::TupleOf(Vec::new()))
            }
        }

        deserializer.deserialize_any(ShapeDefVisitor)
    }
}

// "_set" describes named bit flags. Only the width of the integer they live in matters.
struct SetDef(Primitive);

impl<'de> serde::Deserialize<'de> for SetDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let flags = <HashMap<String, u64>>::deserialize(deserializer)?;
        let primitive = match flags.get("_bitLength").copied().unwrap_or(8) {
            8 => Primitive::U8,
            16 => Primitive::U16,
            32 => Primitive::U32,
            64 => Primitive::U64,
            128 => Primitive::U128,
            other => {
                return Err(D::Error::custom(format!(
                    "a set '_bitLength' of {other} is not one of 8, 16, 32, 64 or 128"
                )))
            }
        };
        Ok(SetDef(primitive))
    }
}

// "_enum" takes either an object of variant names to fields, or an array whose items are
// variant names or explicit `{ name, index, fields }` objects.
struct EnumDef(Vec<Variant>);

impl<'de> serde::Deserialize<'de> for EnumDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct EnumDefVisitor;
        impl<'de> serde::de::Visitor<'de> for EnumDefVisitor {
            type Value = EnumDef;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.write_str("an object or array of enum variants")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut variants = Vec::new();
                while let Some((name, fields)) = map.next_entry::<String, VariantFields>()? {
                    let index = position_index(&variants)?;
                    variants.push(Variant { index, name, fields: fields.0 });
                }
                Ok(EnumDef(variants))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut variants = Vec::new();
                while let Some(entry) = seq.next_element::<VariantEntry>()? {
                    let variant = match entry {
                        VariantEntry::Name(name) => Variant {
                            index: position_index(&variants)?,
                            name,
                            fields: VariantDesc::TupleOf(Vec::new()),
                        },
                        VariantEntry::Explicit(v) => Variant {
                            index: v.index,
                            name: v.name,
                            fields: v.fields.map_or(VariantDesc::TupleOf(Vec::new()), |f| f.0),
                        },
                    };
                    variants.push(variant);
                }
                Ok(EnumDef(variants))
            }
        }

        deserializer.deserialize_any(EnumDefVisitor)
    }
}

fn position_index<E: Error>(variants: &[Variant]) -> Result<u8, E> {
    u8::try_from(variants.len()).map_err(|_| E::custom("an enum can have at most 256 variants"))
}

struct VariantFields(VariantDesc);

impl<'de> serde::Deserialize<'de> for VariantFields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match ShapeDef::deserialize(deserializer)? {
            ShapeDef::AliasOf(name) => Ok(VariantFields(VariantDesc::TupleOf(vec![name]))),
            ShapeDef::StructOf(fields) => Ok(VariantFields(VariantDesc::StructOf(fields))),
            ShapeDef::TupleOf(names) => Ok(VariantFields(VariantDesc::TupleOf(names))),
            ShapeDef::EnumOf(_) | ShapeDef::SetOf(_) => {
                Err(D::Error::custom("enum variant fields cannot be an enum or set"))
            }
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum VariantEntry {
    Name(String),
    Explicit(ExplicitVariant),
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ExplicitVariant {
    index: u8,
    name: String,
    #[serde(default)]
    fields: Option<VariantFields>,
}
