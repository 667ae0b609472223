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

//! This crate parses Substrate runtime metadata (versions 9 to 15) into a single [`Metadata`]
//! model, and uses the type information within it to SCALE encode and decode dynamic [`Value`]s,
//! build storage keys and check that types are shaped the way we expect.
//!
//! - [`Metadata::parse()`] decodes a metadata blob. Modern (V14+) metadata carries its own
//!   portable type registry, while older metadata only names its types. To parse older
//!   metadata, those names are resolved against a [`TypeRegistrySet`] (see [`LegacyTypes`] for
//!   a way to load one from JSON) and use [`Metadata::parse_with_legacy_types()`].
//! - Either way, every type ends up in a [`TypeGraph`], which [`decode_value()`] and
//!   [`encode_value()`] work against.
//! - [`StorageKeyBuilder`] hashes pallet, entry and key values into storage keys.
//! - [`validate()`] checks a type in the graph against some [`Expected`] shape.
//!
//! [`TypeGraph`] also implements [`scale_type_resolver::TypeResolver`], so it can be used with
//! crates like [`scale-decode`](https://github.com/paritytech/scale-decode) too.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod bits;
mod lowering;

pub mod decode;
pub mod encode;
pub mod insert_name;
pub mod legacy_types;
pub mod lookup_name;
pub mod metadata;
pub mod storage;
pub mod type_graph;
pub mod type_registry;
pub mod type_registry_set;
pub mod type_shape;
pub mod validation;
pub mod value;
pub mod wire;

#[cfg(test)]
mod test_utils;

// Export the main types here for ease of use:
pub use {
    decode::{decode_value, decode_value_exact, DecodeError, DecodeOptions},
    encode::{encode_value, EncodeError},
    insert_name::InsertName,
    legacy_types::LegacyTypes,
    lookup_name::LookupName,
    lowering::LegacyTypeError,
    metadata::{Metadata, MetadataParseError, PalletMetadata},
    storage::{StorageHasher, StorageKey, StorageKeyBuilder, StorageKeyError},
    type_graph::{Shape, TypeGraph, TypeId},
    type_registry::TypeRegistry,
    type_registry_set::TypeRegistrySet,
    type_shape::TypeShape,
    validation::{validate, Expected, StaticShape, ValidationError},
    value::Value,
    wire::CompactPolicy,
};
