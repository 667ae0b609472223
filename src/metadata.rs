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

//! This module provides [`Metadata`], which is parsed from the bytes handed back by a node's
//! `state_getMetadata` call. Metadata versions 9 to 15 are supported. Versions 9 to 13 describe
//! their types by name, and so need some [`crate::LegacyTypes`] to be provided in order to make
//! sense of them; these names are lowered into the same [`TypeGraph`] that later versions carry
//! around, so that everything downstream of parsing treats all versions in the same way.
//!
//! ```rust
//! use scale_metadata_codec::{Metadata, MetadataParseError};
//!
//! // The magic number is followed by the version, here 8, which isn't supported.
//! let bytes = [0x6d, 0x65, 0x74, 0x61, 8];
//! let err = Metadata::parse(&bytes).unwrap_err();
//! assert_eq!(err, MetadataParseError::UnsupportedVersion(8));
//! ```

mod legacy;
mod modern;
pub(crate) mod portable;
mod v10;
mod v11;
mod v12;
mod v13;
mod v14;
mod v15;
mod v9;

use crate::decode::{decode_value_exact, DecodeError, DecodeErrorKind};
use crate::lowering::LegacyTypeError;
use crate::storage::StorageHasher;
use crate::type_graph::{Shape, TypeGraph, TypeGraphError, TypeId};
use crate::type_registry::TypeRegistry;
use crate::type_registry_set::TypeRegistrySet;
use crate::value::{Composite, Value, ValueDef, VariantValue};
use crate::wire::{self, Cursor};
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::HashMap;
use parity_scale_codec::Decode;

/// Every metadata blob starts with these bytes; `b"meta"` read as a little endian u32.
pub const MAGIC_NUMBER: u32 = 0x6174656d;

/// An error parsing metadata. No partially parsed metadata is handed back when this occurs.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum MetadataParseError {
    #[display(fmt = "Expected the metadata magic number 0x6174656d but got {_0:#010x}")]
    BadMagicNumber(u32),
    #[display(fmt = "Metadata version {_0} is not supported")]
    UnsupportedVersion(u8),
    #[display(fmt = "{_0}")]
    Wire(wire::Error),
    #[display(fmt = "Expected type ID {expected} in the type registry but found {found}")]
    UnexpectedTypeId { expected: u32, found: u32 },
    #[display(fmt = "{_0}")]
    TypeGraph(TypeGraphError),
    #[display(fmt = "Cannot resolve the type of {pallet}.{item}: {error}")]
    LegacyType { pallet: String, item: String, error: LegacyTypeError },
    #[display(fmt = "{_0} bytes were left over after decoding the metadata")]
    TrailingBytes(usize),
    #[display(fmt = "More than one pallet is named '{_0}'")]
    DuplicatePalletName(String),
    #[display(fmt = "More than one pallet has index {_0}")]
    DuplicatePalletIndex(u8),
    #[display(fmt = "The metadata has more pallets than can be indexed by a byte")]
    TooManyPallets,
    #[display(fmt = "Pallet '{pallet}' has more {what} than can be indexed by a byte")]
    TooManyVariants { pallet: String, what: &'static str },
    #[display(fmt = "The {what} type of pallet '{pallet}' is not a variant")]
    PalletTypeNotVariant { pallet: String, what: &'static str },
    #[display(fmt = "Storage entry {pallet}.{entry} has {hashers} hashers but {keys} keys")]
    StorageKeyArityMismatch { pallet: String, entry: String, hashers: usize, keys: usize },
}

#[cfg(feature = "std")]
impl std::error::Error for MetadataParseError {}

impl From<wire::Error> for MetadataParseError {
    fn from(e: wire::Error) -> Self {
        MetadataParseError::Wire(e)
    }
}

impl From<TypeGraphError> for MetadataParseError {
    fn from(e: TypeGraphError) -> Self {
        MetadataParseError::TypeGraph(e)
    }
}

/// Runtime metadata, normalized so that every supported version looks the same.
#[derive(Debug, Clone)]
pub struct Metadata {
    version: u8,
    types: TypeGraph,
    pallets: Vec<PalletMetadata>,
    pallets_by_name: HashMap<String, usize>,
    pallets_by_index: HashMap<u8, usize>,
    pallets_by_call_index: HashMap<u8, usize>,
    pallets_by_event_index: HashMap<u8, usize>,
    pallets_by_error_index: HashMap<u8, usize>,
    extrinsic: Option<ExtrinsicMetadata>,
    outer_enums: Option<OuterEnums>,
    runtime_ty: Option<TypeId>,
    custom: BTreeMap<String, CustomValue>,
    runtime_apis: Vec<RuntimeApi>,
}

impl Metadata {
    /// Parse some metadata bytes. Legacy (V9 to V13) metadata is resolved using only the
    /// basic built-in types, which is rarely enough; see [`Metadata::parse_with_legacy_types()`].
    pub fn parse(bytes: &[u8]) -> Result<Metadata, MetadataParseError> {
        let basic = TypeRegistry::basic();
        Metadata::parse_with_legacy_types(bytes, &TypeRegistrySet::from_iter([&basic]))
    }

    /// Parse some metadata bytes, resolving the type names found in legacy metadata using the
    /// given types. These are ignored for V14 metadata onwards.
    pub fn parse_with_legacy_types(
        bytes: &[u8],
        legacy_types: &TypeRegistrySet<'_>,
    ) -> Result<Metadata, MetadataParseError> {
        let mut input = Cursor::new(bytes);
        let magic = input.read_u32()?;
        if magic != MAGIC_NUMBER {
            return Err(MetadataParseError::BadMagicNumber(magic));
        }

        let version = input.read_u8()?;
        let metadata = match version {
            9..=13 => {
                let decoded = match version {
                    9 => v9::decode(&mut input)?,
                    10 => v10::decode(&mut input)?,
                    11 => v11::decode(&mut input)?,
                    12 => v12::decode(&mut input)?,
                    _ => v13::decode(&mut input)?,
                };
                expect_end(&input)?;
                legacy::normalize(decoded, version, legacy_types)?
            }
            14 | 15 => {
                let decoded = match version {
                    14 => v14::decode(&mut input)?,
                    _ => v15::decode(&mut input)?,
                };
                expect_end(&input)?;
                modern::normalize(decoded, version)?
            }
            v => return Err(MetadataParseError::UnsupportedVersion(v)),
        };

        tracing::debug!(
            version,
            pallets = metadata.pallets.len(),
            types = metadata.types.len(),
            "parsed metadata"
        );
        Ok(metadata)
    }

    /// The version of the metadata that was parsed.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// The types that everything in this metadata refers to.
    pub fn types(&self) -> &TypeGraph {
        &self.types
    }

    /// Iterate over the pallets, in the order that they were declared.
    pub fn pallets(&self) -> impl ExactSizeIterator<Item = &PalletMetadata> {
        self.pallets.iter()
    }

    /// Find a pallet by name.
    pub fn pallet_by_name(&self, name: &str) -> Option<&PalletMetadata> {
        self.pallets_by_name.get(name).map(|&i| &self.pallets[i])
    }

    /// Find a pallet by its index.
    pub fn pallet_by_index(&self, index: u8) -> Option<&PalletMetadata> {
        self.pallets_by_index.get(&index).map(|&i| &self.pallets[i])
    }

    /// Find the pallet whose calls are selected by this index in the outer call enum.
    pub fn pallet_by_call_index(&self, index: u8) -> Option<&PalletMetadata> {
        self.pallets_by_call_index.get(&index).map(|&i| &self.pallets[i])
    }

    /// Find the pallet whose events are selected by this index in the outer event enum.
    pub fn pallet_by_event_index(&self, index: u8) -> Option<&PalletMetadata> {
        self.pallets_by_event_index.get(&index).map(|&i| &self.pallets[i])
    }

    /// Find the pallet whose errors are selected by this index in the outer error enum.
    pub fn pallet_by_error_index(&self, index: u8) -> Option<&PalletMetadata> {
        self.pallets_by_error_index.get(&index).map(|&i| &self.pallets[i])
    }

    /// Find a storage entry.
    pub fn storage_entry(&self, pallet: &str, entry: &str) -> Option<&StorageEntry> {
        self.pallet_by_name(pallet)?.storage_entry(entry)
    }

    /// Find a constant.
    pub fn constant(&self, pallet: &str, constant: &str) -> Option<&ConstantMetadata> {
        self.pallet_by_name(pallet)?.constant(constant)
    }

    /// Find a custom value by name. Only V15 metadata has these.
    pub fn custom_value(&self, name: &str) -> Option<&CustomValue> {
        self.custom.get(name)
    }

    /// Iterate over the custom values, ordered by name.
    pub fn custom_values(&self) -> impl Iterator<Item = (&str, &CustomValue)> {
        self.custom.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Find a runtime API by name. Only V15 metadata has these.
    pub fn runtime_api(&self, name: &str) -> Option<&RuntimeApi> {
        self.runtime_apis.iter().find(|api| api.name == name)
    }

    /// Iterate over the runtime APIs.
    pub fn runtime_apis(&self) -> impl ExactSizeIterator<Item = &RuntimeApi> {
        self.runtime_apis.iter()
    }

    /// Details about the extrinsic format. V9 and V10 don't describe this.
    pub fn extrinsic(&self) -> Option<&ExtrinsicMetadata> {
        self.extrinsic.as_ref()
    }

    /// The outer call, event and error enums. These are handed back by V15 metadata and
    /// built up from the pallets for legacy metadata.
    pub fn outer_enums(&self) -> Option<&OuterEnums> {
        self.outer_enums.as_ref()
    }

    /// The type of the runtime, for metadata versions which carry it.
    pub fn runtime_ty(&self) -> Option<TypeId> {
        self.runtime_ty
    }

    /// Decode a call. The first byte selects the pallet, and the rest is decoded using that
    /// pallet's call type. The result is a variant named after the pallet.
    pub fn decode_call(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        self.decode_pallet_variant(bytes, Metadata::pallet_by_call_index, |p| p.call_ty)
    }

    /// Decode an event, in the same way as [`Metadata::decode_call()`].
    pub fn decode_event(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        self.decode_pallet_variant(bytes, Metadata::pallet_by_event_index, |p| p.event_ty)
    }

    /// Decode the value of some constant. Returns `None` if the constant doesn't exist.
    pub fn constant_value(
        &self,
        pallet: &str,
        constant: &str,
    ) -> Option<Result<Value, DecodeError>> {
        let constant = self.constant(pallet, constant)?;
        Some(decode_value_exact(&constant.value, constant.ty, &self.types))
    }

    /// Decode a custom value. Returns `None` if no custom value has this name.
    pub fn custom_value_decoded(&self, name: &str) -> Option<Result<Value, DecodeError>> {
        let custom = self.custom_value(name)?;
        Some(decode_value_exact(&custom.value, custom.ty, &self.types))
    }

    /// Decode the default value of some storage entry. Returns `None` if the entry doesn't
    /// exist.
    pub fn storage_default_value(
        &self,
        pallet: &str,
        entry: &str,
    ) -> Option<Result<Value, DecodeError>> {
        let entry = self.storage_entry(pallet, entry)?;
        Some(decode_value_exact(&entry.default, entry.value_ty, &self.types))
    }

    /// Decode some bytes fetched from storage as the value of the given entry. Returns `None`
    /// if the entry doesn't exist.
    pub fn decode_storage_value(
        &self,
        pallet: &str,
        entry: &str,
        bytes: &[u8],
    ) -> Option<Result<Value, DecodeError>> {
        let entry = self.storage_entry(pallet, entry)?;
        Some(decode_value_exact(bytes, entry.value_ty, &self.types))
    }

    fn decode_pallet_variant(
        &self,
        bytes: &[u8],
        find_pallet: fn(&Metadata, u8) -> Option<&PalletMetadata>,
        pallet_ty: fn(&PalletMetadata) -> Option<TypeId>,
    ) -> Result<Value, DecodeError> {
        let mut input = Cursor::new(bytes);
        let index = input.read_u8()?;
        let unknown = || DecodeError::new(0, DecodeErrorKind::UnknownPalletIndex(index));
        let pallet = find_pallet(self, index).ok_or_else(unknown)?;
        let ty = pallet_ty(pallet).ok_or_else(unknown)?;

        let inner = decode_value_exact(input.remaining(), ty, &self.types).map_err(|mut e| {
            e.offset += 1;
            e
        })?;
        Ok(Value::new(ValueDef::Variant(VariantValue {
            name: pallet.name.clone(),
            index: Some(index),
            fields: Composite::Unnamed(vec![inner]),
        })))
    }
}

fn expect_end(input: &Cursor<'_>) -> Result<(), MetadataParseError> {
    if input.is_empty() {
        Ok(())
    } else {
        Err(MetadataParseError::TrailingBytes(input.remaining_len()))
    }
}

/// Details about a single pallet.
#[derive(Debug, Clone)]
pub struct PalletMetadata {
    name: String,
    index: u8,
    call_index: u8,
    event_index: u8,
    error_index: u8,
    call_ty: Option<TypeId>,
    event_ty: Option<TypeId>,
    error_ty: Option<TypeId>,
    calls: VariantIndex,
    events: VariantIndex,
    errors: VariantIndex,
    storage_prefix: String,
    storage: Vec<StorageEntry>,
    constants: Vec<ConstantMetadata>,
    docs: Vec<String>,
}

impl PalletMetadata {
    /// The pallet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pallet index.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// The index which selects this pallet in the outer call enum. Prior to V12 metadata, this
    /// only counts pallets with calls, and so can differ from [`PalletMetadata::index()`].
    pub fn call_index(&self) -> u8 {
        self.call_index
    }

    /// The index which selects this pallet in the outer event enum.
    pub fn event_index(&self) -> u8 {
        self.event_index
    }

    /// The index which selects this pallet in the outer error enum.
    pub fn error_index(&self) -> u8 {
        self.error_index
    }

    /// The type of this pallet's calls, if it has any.
    pub fn call_ty(&self) -> Option<TypeId> {
        self.call_ty
    }

    /// The type of this pallet's events, if it has any.
    pub fn event_ty(&self) -> Option<TypeId> {
        self.event_ty
    }

    /// The type of this pallet's errors, if it has any.
    pub fn error_ty(&self) -> Option<TypeId> {
        self.error_ty
    }

    /// The variant index of the call with this name.
    pub fn call_index_of(&self, name: &str) -> Option<u8> {
        self.calls.index_of(name)
    }

    /// The name of the call with this variant index.
    pub fn call_name(&self, index: u8) -> Option<&str> {
        self.calls.name_of(index)
    }

    /// The variant index of the event with this name.
    pub fn event_index_of(&self, name: &str) -> Option<u8> {
        self.events.index_of(name)
    }

    /// The name of the event with this variant index.
    pub fn event_name(&self, index: u8) -> Option<&str> {
        self.events.name_of(index)
    }

    /// The variant index of the error with this name.
    pub fn error_index_of(&self, name: &str) -> Option<u8> {
        self.errors.index_of(name)
    }

    /// The name of the error with this variant index.
    pub fn error_name(&self, index: u8) -> Option<&str> {
        self.errors.name_of(index)
    }

    /// The prefix that this pallet's storage entries are stored under. This is usually the
    /// pallet name.
    pub fn storage_prefix(&self) -> &str {
        &self.storage_prefix
    }

    /// The storage entries.
    pub fn storage(&self) -> &[StorageEntry] {
        &self.storage
    }

    /// Find a storage entry by name.
    pub fn storage_entry(&self, name: &str) -> Option<&StorageEntry> {
        self.storage.iter().find(|e| e.name == name)
    }

    /// The constants.
    pub fn constants(&self) -> &[ConstantMetadata] {
        &self.constants
    }

    /// Find a constant by name.
    pub fn constant(&self, name: &str) -> Option<&ConstantMetadata> {
        self.constants.iter().find(|c| c.name == name)
    }

    /// Pallet documentation. Only V15 metadata has this.
    pub fn docs(&self) -> &[String] {
        &self.docs
    }
}

// Variant names to indexes and back, for one of the call, event or error types of a pallet.
#[derive(Debug, Clone, Default)]
struct VariantIndex {
    by_name: HashMap<String, u8>,
    by_index: HashMap<u8, String>,
}

impl VariantIndex {
    fn build(
        types: &TypeGraph,
        ty: Option<TypeId>,
        pallet: &str,
        what: &'static str,
    ) -> Result<VariantIndex, MetadataParseError> {
        let mut index = VariantIndex::default();
        let Some(ty) = ty else { return Ok(index) };
        let Shape::Variant(variants) = types.shape(ty)? else {
            return Err(MetadataParseError::PalletTypeNotVariant { pallet: pallet.into(), what });
        };
        for v in variants {
            index.by_name.insert(v.name.clone(), v.index);
            index.by_index.insert(v.index, v.name.clone());
        }
        Ok(index)
    }

    fn index_of(&self, name: &str) -> Option<u8> {
        self.by_name.get(name).copied()
    }

    fn name_of(&self, index: u8) -> Option<&str> {
        self.by_index.get(&index).map(|s| s.as_str())
    }
}

/// A storage entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    /// The entry name.
    pub name: String,
    /// What is handed back when nothing is stored.
    pub modifier: StorageEntryModifier,
    /// The hasher and type of each key, in order. Plain entries have no keys.
    pub keys: Vec<(StorageHasher, TypeId)>,
    /// The type of the stored value.
    pub value_ty: TypeId,
    /// The encoded default value.
    pub default: Vec<u8>,
    /// Documentation.
    pub docs: Vec<String>,
}

/// What is handed back from storage when no value exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Decode)]
pub enum StorageEntryModifier {
    /// Nothing is handed back.
    Optional,
    /// The default value is handed back.
    Default,
}

/// A pallet constant.
#[derive(Debug, Clone, PartialEq, Eq, Decode)]
pub struct ConstantMetadata {
    /// The constant name.
    pub name: String,
    /// The constant type.
    pub ty: TypeId,
    /// The encoded value.
    pub value: Vec<u8>,
    /// Documentation.
    pub docs: Vec<String>,
}

/// The extrinsic format. Which type IDs are present depends on the metadata version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtrinsicMetadata {
    /// The extrinsic format version.
    pub version: u8,
    /// The type of the whole extrinsic (V14).
    pub ty: Option<TypeId>,
    /// The type of the address (V15).
    pub address_ty: Option<TypeId>,
    /// The type of the call (V15).
    pub call_ty: Option<TypeId>,
    /// The type of the signature (V15).
    pub signature_ty: Option<TypeId>,
    /// The type of the signed extensions, all together (V15).
    pub extra_ty: Option<TypeId>,
    /// The signed extensions, in order.
    pub signed_extensions: Vec<SignedExtensionMetadata>,
}

/// A signed extension. Legacy metadata only names these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedExtensionMetadata {
    /// The extension name.
    pub identifier: String,
    /// The type included in the extrinsic.
    pub ty: Option<TypeId>,
    /// The type included in the signed payload but not the extrinsic.
    pub additional_signed: Option<TypeId>,
}

/// The outer enums that wrap every call, event and error.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Decode)]
pub struct OuterEnums {
    pub call: TypeId,
    pub event: TypeId,
    pub error: TypeId,
}

/// Some custom value.
#[derive(Debug, Clone, PartialEq, Eq, Decode)]
pub struct CustomValue {
    /// The type of the value.
    pub ty: TypeId,
    /// The encoded value.
    pub value: Vec<u8>,
}

/// A runtime API.
#[derive(Debug, Clone, PartialEq, Eq, Decode)]
pub struct RuntimeApi {
    /// The trait name, eg `Core`.
    pub name: String,
    /// The methods.
    pub methods: Vec<RuntimeApiMethod>,
    /// Documentation.
    pub docs: Vec<String>,
}

impl RuntimeApi {
    /// Find a method by name.
    pub fn method(&self, name: &str) -> Option<&RuntimeApiMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A runtime API method.
#[derive(Debug, Clone, PartialEq, Eq, Decode)]
pub struct RuntimeApiMethod {
    /// The method name.
    pub name: String,
    /// The named inputs, in order.
    pub inputs: Vec<(String, TypeId)>,
    /// The output type.
    pub output: TypeId,
    /// Documentation.
    pub docs: Vec<String>,
}

// Everything needed to build [`Metadata`], handed over by each version's normalize step.
struct MetadataParts {
    version: u8,
    types: TypeGraph,
    pallets: Vec<PalletMetadata>,
    extrinsic: Option<ExtrinsicMetadata>,
    outer_enums: Option<OuterEnums>,
    runtime_ty: Option<TypeId>,
    custom: BTreeMap<String, CustomValue>,
    runtime_apis: Vec<RuntimeApi>,
}

impl MetadataParts {
    fn into_metadata(self) -> Result<Metadata, MetadataParseError> {
        self.types.validate_all()?;

        let mut pallets = self.pallets;
        let mut pallets_by_name = HashMap::with_capacity(pallets.len());
        let mut pallets_by_index = HashMap::with_capacity(pallets.len());
        let mut pallets_by_call_index = HashMap::new();
        let mut pallets_by_event_index = HashMap::new();
        let mut pallets_by_error_index = HashMap::new();

        for (pos, pallet) in pallets.iter_mut().enumerate() {
            if pallets_by_name.insert(pallet.name.clone(), pos).is_some() {
                return Err(MetadataParseError::DuplicatePalletName(pallet.name.clone()));
            }
            if pallets_by_index.insert(pallet.index, pos).is_some() {
                return Err(MetadataParseError::DuplicatePalletIndex(pallet.index));
            }
            if pallet.call_ty.is_some() {
                pallets_by_call_index.insert(pallet.call_index, pos);
            }
            if pallet.event_ty.is_some() {
                pallets_by_event_index.insert(pallet.event_index, pos);
            }
            if pallet.error_ty.is_some() {
                pallets_by_error_index.insert(pallet.error_index, pos);
            }

            let name = &pallet.name;
            pallet.calls = VariantIndex::build(&self.types, pallet.call_ty, name, "call")?;
            pallet.events = VariantIndex::build(&self.types, pallet.event_ty, name, "event")?;
            pallet.errors = VariantIndex::build(&self.types, pallet.error_ty, name, "error")?;
        }

        Ok(Metadata {
            version: self.version,
            types: self.types,
            pallets,
            pallets_by_name,
            pallets_by_index,
            pallets_by_call_index,
            pallets_by_event_index,
            pallets_by_error_index,
            extrinsic: self.extrinsic,
            outer_enums: self.outer_enums,
            runtime_ty: self.runtime_ty,
            custom: self.custom,
            runtime_apis: self.runtime_apis,
        })
    }
}
