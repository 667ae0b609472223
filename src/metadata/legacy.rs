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

//! The records shared by V9 to V13 metadata, which name their types rather than pointing into
//! a type registry. The versions differ only in small ways: which storage hashers exist, whether
//! modules are indexed, and whether N-maps and extrinsic details are present. Each version picks
//! the records it needs and decodes them via [`decode()`].
//!
//! Normalizing these records lowers each type name into a [`crate::TypeGraph`], and builds the
//! call, event and error enums that newer metadata would hand over directly.

use super::{
    ConstantMetadata, ExtrinsicMetadata, Metadata, MetadataParseError, MetadataParts,
    OuterEnums, PalletMetadata, SignedExtensionMetadata, StorageEntry, StorageEntryModifier,
};
use crate::lowering::Lowering;
use crate::storage::StorageHasher;
use crate::type_graph::{Field, Shape, TypeDefinition, TypeId, Variant};
use crate::type_registry::{BUILTIN_CALL, BUILTIN_EVENT};
use crate::type_registry_set::TypeRegistrySet;
use crate::wire::Cursor;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use parity_scale_codec::Decode;

pub(super) struct LegacyMetadata {
    pub modules: Vec<Module>,
    pub extrinsic: Option<Extrinsic>,
}

/// A module, normalized across versions. Only V12 onwards give modules an explicit index.
pub(super) struct Module {
    pub name: String,
    pub storage: Option<Storage>,
    pub calls: Option<Vec<Item>>,
    pub events: Option<Vec<Item>>,
    pub constants: Vec<Constant>,
    pub errors: Vec<Item>,
    pub index: Option<u8>,
}

pub(super) struct Storage {
    pub prefix: String,
    pub entries: Vec<Entry>,
}

pub(super) struct Entry {
    pub name: String,
    pub modifier: StorageEntryModifier,
    pub ty: EntryType,
    pub default: Vec<u8>,
    pub docs: Vec<String>,
}

pub(super) enum EntryType {
    Plain(String),
    Map { hasher: StorageHasher, key: String, value: String },
    DoubleMap {
        hasher: StorageHasher,
        key1: String,
        key2: String,
        value: String,
        key2_hasher: StorageHasher,
    },
    NMap { keys: Vec<String>, hashers: Vec<StorageHasher>, value: String },
}

/// A call, event or error. Event arguments have no names, and errors have no arguments.
pub(super) struct Item {
    pub name: String,
    pub args: Vec<(Option<String>, String)>,
    pub docs: Vec<String>,
}

#[derive(Decode)]
pub(super) struct Constant {
    pub name: String,
    pub ty: String,
    pub value: Vec<u8>,
    pub docs: Vec<String>,
}

#[derive(Decode)]
pub(super) struct Extrinsic {
    pub version: u8,
    pub signed_extensions: Vec<String>,
}

/// A module as V9 to V11 encode it. `E` is the version's storage entry type.
#[derive(Decode)]
pub(super) struct ModuleRecord<E> {
    name: String,
    storage: Option<StorageRecord<E>>,
    calls: Option<Vec<CallRecord>>,
    events: Option<Vec<EventRecord>>,
    constants: Vec<Constant>,
    errors: Vec<ErrorRecord>,
}

/// V12 onwards follow each module with its index.
#[derive(Decode)]
pub(super) struct Indexed<M> {
    module: M,
    index: u8,
}

#[derive(Decode)]
pub(super) struct StorageRecord<E> {
    prefix: String,
    entries: Vec<EntryRecord<E>>,
}

#[derive(Decode)]
pub(super) struct EntryRecord<E> {
    name: String,
    modifier: StorageEntryModifier,
    ty: E,
    default: Vec<u8>,
    docs: Vec<String>,
}

/// Storage entry types up to V12. `H` is the version's storage hasher.
#[derive(Decode)]
pub(super) enum MapEntry<H> {
    Plain(String),
    // V9 and V10 call the flag "is_linked", and later versions leave it unused. Linked maps
    // store the same value type, so it makes no difference here.
    Map { hasher: H, key: String, value: String, _linked: bool },
    DoubleMap { hasher: H, key1: String, key2: String, value: String, key2_hasher: H },
}

/// Storage entry types in V13, which adds N-maps.
#[derive(Decode)]
pub(super) enum NMapEntry {
    Plain(String),
    Map { hasher: StorageHasher, key: String, value: String, _unused: bool },
    DoubleMap {
        hasher: StorageHasher,
        key1: String,
        key2: String,
        value: String,
        key2_hasher: StorageHasher,
    },
    NMap { keys: Vec<String>, hashers: Vec<StorageHasher>, value: String },
}

#[derive(Decode)]
pub(super) struct CallRecord {
    name: String,
    args: Vec<(String, String)>,
    docs: Vec<String>,
}

#[derive(Decode)]
pub(super) struct EventRecord {
    name: String,
    args: Vec<String>,
    docs: Vec<String>,
}

#[derive(Decode)]
pub(super) struct ErrorRecord {
    name: String,
    docs: Vec<String>,
}

/// Decode the modules of some legacy metadata, given the version's module record `M`, and
/// then the extrinsic details if the version has them (V11 onwards).
pub(super) fn decode<M: Decode + Into<Module>>(
    input: &mut Cursor<'_>,
    with_extrinsic: bool,
) -> Result<LegacyMetadata, MetadataParseError> {
    let modules = input.decode::<Vec<M>>()?.into_iter().map(Into::into).collect();
    let extrinsic = if with_extrinsic { Some(input.decode::<Extrinsic>()?) } else { None };
    Ok(LegacyMetadata { modules, extrinsic })
}

impl<E: Into<EntryType>> From<ModuleRecord<E>> for Module {
    fn from(m: ModuleRecord<E>) -> Self {
        let storage = m.storage.map(|s| Storage {
            prefix: s.prefix,
            entries: s.entries.into_iter().map(Into::into).collect(),
        });
        let calls = m.calls.map(|calls| calls.into_iter().map(Into::into).collect());
        let events = m.events.map(|events| events.into_iter().map(Into::into).collect());
        Module {
            name: m.name,
            storage,
            calls,
            events,
            constants: m.constants,
            errors: m.errors.into_iter().map(Into::into).collect(),
            index: None,
        }
    }
}

impl<M: Into<Module>> From<Indexed<M>> for Module {
    fn from(indexed: Indexed<M>) -> Self {
        Module { index: Some(indexed.index), ..indexed.module.into() }
    }
}

impl<E: Into<EntryType>> From<EntryRecord<E>> for Entry {
    fn from(e: EntryRecord<E>) -> Self {
        Entry {
            name: e.name,
            modifier: e.modifier,
            ty: e.ty.into(),
            default: e.default,
            docs: e.docs,
        }
    }
}

impl<H: Into<StorageHasher>> From<MapEntry<H>> for EntryType {
    fn from(entry: MapEntry<H>) -> Self {
        match entry {
            MapEntry::Plain(value) => EntryType::Plain(value),
            MapEntry::Map { hasher, key, value, .. } => {
                EntryType::Map { hasher: hasher.into(), key, value }
            }
            MapEntry::DoubleMap { hasher, key1, key2, value, key2_hasher } => {
                EntryType::DoubleMap {
                    hasher: hasher.into(),
                    key1,
                    key2,
                    value,
                    key2_hasher: key2_hasher.into(),
                }
            }
        }
    }
}

impl From<NMapEntry> for EntryType {
    fn from(entry: NMapEntry) -> Self {
        match entry {
            NMapEntry::Plain(value) => EntryType::Plain(value),
            NMapEntry::Map { hasher, key, value, .. } => EntryType::Map { hasher, key, value },
            NMapEntry::DoubleMap { hasher, key1, key2, value, key2_hasher } => {
                EntryType::DoubleMap { hasher, key1, key2, value, key2_hasher }
            }
            NMapEntry::NMap { keys, hashers, value } => EntryType::NMap { keys, hashers, value },
        }
    }
}

impl From<CallRecord> for Item {
    fn from(call: CallRecord) -> Self {
        let args = call.args.into_iter().map(|(name, ty)| (Some(name), ty)).collect();
        Item { name: call.name, args, docs: call.docs }
    }
}

impl From<EventRecord> for Item {
    fn from(event: EventRecord) -> Self {
        let args = event.args.into_iter().map(|ty| (None, ty)).collect();
        Item { name: event.name, args, docs: event.docs }
    }
}

impl From<ErrorRecord> for Item {
    fn from(error: ErrorRecord) -> Self {
        Item { name: error.name, args: Vec::new(), docs: error.docs }
    }
}

/// Turn legacy metadata into [`Metadata`], resolving every type name using the given types.
pub(super) fn normalize(
    metadata: LegacyMetadata,
    version: u8,
    types: &TypeRegistrySet<'_>,
) -> Result<Metadata, MetadataParseError> {
    let mut lowering = Lowering::new(types);

    // Calls and events can contain other calls (think `utility.batch`) or events, so the
    // outer enums are given IDs first and filled in once every pallet has been lowered.
    let outer_call = lowering.builder().reserve();
    let outer_event = lowering.builder().reserve();
    let outer_error = lowering.builder().reserve();
    lowering.bind(BUILTIN_CALL, outer_call);
    lowering.bind(BUILTIN_EVENT, outer_event);

    let mut pallets = Vec::with_capacity(metadata.modules.len());
    let mut outer_calls = Vec::new();
    let mut outer_events = Vec::new();
    let mut outer_errors = Vec::new();
    let mut counters = OuterIndexes::default();

    for (position, module) in metadata.modules.into_iter().enumerate() {
        let position = u8::try_from(position).map_err(|_| MetadataParseError::TooManyPallets)?;
        let indexes = counters.next(&module, position)?;
        let name = module.name;

        let call_ty = match module.calls {
            Some(calls) => Some(lower_items(&mut lowering, &name, "calls", calls)?),
            None => None,
        };
        let event_ty = match module.events {
            Some(events) => Some(lower_items(&mut lowering, &name, "events", events)?),
            None => None,
        };
        let error_ty = if module.errors.is_empty() {
            None
        } else {
            Some(lower_items(&mut lowering, &name, "errors", module.errors)?)
        };

        let (storage_prefix, storage) = match module.storage {
            Some(storage) => {
                let entries = storage
                    .entries
                    .into_iter()
                    .map(|entry| lower_entry(&mut lowering, &name, entry))
                    .collect::<Result<_, _>>()?;
                (storage.prefix, entries)
            }
            None => (name.clone(), Vec::new()),
        };

        let constants = module
            .constants
            .into_iter()
            .map(|c| {
                let ty = lower(&mut lowering, &name, &c.name, &c.ty)?;
                Ok(ConstantMetadata { name: c.name, ty, value: c.value, docs: c.docs })
            })
            .collect::<Result<_, MetadataParseError>>()?;

        if let Some(ty) = call_ty {
            outer_calls.push(Variant::new(name.clone(), indexes.call, vec![Field::unnamed(ty)]));
        }
        if let Some(ty) = event_ty {
            outer_events.push(Variant::new(name.clone(), indexes.event, vec![Field::unnamed(ty)]));
        }
        if let Some(ty) = error_ty {
            outer_errors.push(Variant::new(name.clone(), indexes.error, vec![Field::unnamed(ty)]));
        }

        pallets.push(PalletMetadata {
            name,
            index: indexes.pallet,
            call_index: indexes.call,
            event_index: indexes.event,
            error_index: indexes.error,
            call_ty,
            event_ty,
            error_ty,
            calls: Default::default(),
            events: Default::default(),
            errors: Default::default(),
            storage_prefix,
            storage,
            constants,
            docs: Vec::new(),
        });
    }

    let builder = lowering.builder();
    builder.set(
        outer_call,
        TypeDefinition::new(Shape::Variant(outer_calls)).with_path(BUILTIN_CALL),
    );
    builder.set(
        outer_event,
        TypeDefinition::new(Shape::Variant(outer_events)).with_path(BUILTIN_EVENT),
    );
    builder.set(
        outer_error,
        TypeDefinition::new(Shape::Variant(outer_errors)).with_path("builtin::Error"),
    );

    let extrinsic = metadata.extrinsic.map(|e| ExtrinsicMetadata {
        version: e.version,
        ty: None,
        address_ty: None,
        call_ty: None,
        signature_ty: None,
        extra_ty: None,
        signed_extensions: e
            .signed_extensions
            .into_iter()
            .map(|identifier| SignedExtensionMetadata {
                identifier,
                ty: None,
                additional_signed: None,
            })
            .collect(),
    });

    MetadataParts {
        version,
        types: lowering.finish()?,
        pallets,
        extrinsic,
        outer_enums: Some(OuterEnums { call: outer_call, event: outer_event, error: outer_error }),
        runtime_ty: None,
        custom: BTreeMap::new(),
        runtime_apis: Vec::new(),
    }
    .into_metadata()
}

struct PalletIndexes {
    pallet: u8,
    call: u8,
    event: u8,
    error: u8,
}

// Before V12, pallets had no explicit index. Their position in the outer call (event) enum is
// then the number of pallets before them which also have calls (events).
#[derive(Default)]
struct OuterIndexes {
    calls: usize,
    events: usize,
}

impl OuterIndexes {
    fn next(&mut self, module: &Module, position: u8) -> Result<PalletIndexes, MetadataParseError> {
        if let Some(index) = module.index {
            return Ok(PalletIndexes { pallet: index, call: index, event: index, error: index });
        }

        let to_u8 = |n: usize| u8::try_from(n).map_err(|_| MetadataParseError::TooManyPallets);
        let call = to_u8(self.calls)?;
        let event = to_u8(self.events)?;
        if module.calls.is_some() {
            self.calls += 1;
        }
        if module.events.is_some() {
            self.events += 1;
        }
        Ok(PalletIndexes { pallet: position, call, event, error: position })
    }
}

fn lower(
    lowering: &mut Lowering<'_, '_>,
    pallet: &str,
    item: &str,
    ty: &str,
) -> Result<TypeId, MetadataParseError> {
    lowering.lower_str(ty, Some(pallet)).map_err(|error| MetadataParseError::LegacyType {
        pallet: pallet.into(),
        item: item.into(),
        error,
    })
}

// Build the enum of a pallet's calls, events or errors. Variant indexes are positions.
fn lower_items(
    lowering: &mut Lowering<'_, '_>,
    pallet: &str,
    what: &'static str,
    items: Vec<Item>,
) -> Result<TypeId, MetadataParseError> {
    let mut variants = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let index = u8::try_from(index)
            .map_err(|_| MetadataParseError::TooManyVariants { pallet: pallet.into(), what })?;

        let mut fields = Vec::with_capacity(item.args.len());
        for (name, ty) in item.args {
            let id = lower(lowering, pallet, &item.name, &ty)?;
            fields.push(Field { name, ty: id, type_name: Some(ty), docs: Vec::new() });
        }
        variants.push(Variant { docs: item.docs, ..Variant::new(item.name, index, fields) });
    }

    let path = format!("builtin::{pallet}::{what}");
    let definition = TypeDefinition::new(Shape::Variant(variants)).with_path(&path);
    Ok(lowering.builder().add(definition))
}

fn lower_entry(
    lowering: &mut Lowering<'_, '_>,
    pallet: &str,
    entry: Entry,
) -> Result<StorageEntry, MetadataParseError> {
    let (keys, value) = match entry.ty {
        EntryType::Plain(value) => (Vec::new(), value),
        EntryType::Map { hasher, key, value } => (vec![(hasher, key)], value),
        EntryType::DoubleMap { hasher, key1, key2, value, key2_hasher } => {
            (vec![(hasher, key1), (key2_hasher, key2)], value)
        }
        EntryType::NMap { keys, hashers, value } => {
            if keys.len() != hashers.len() {
                return Err(MetadataParseError::StorageKeyArityMismatch {
                    pallet: pallet.into(),
                    entry: entry.name,
                    hashers: hashers.len(),
                    keys: keys.len(),
                });
            }
            (hashers.into_iter().zip(keys).collect(), value)
        }
    };

    let keys = keys
        .into_iter()
        .map(|(hasher, key)| Ok((hasher, lower(lowering, pallet, &entry.name, &key)?)))
        .collect::<Result<_, MetadataParseError>>()?;
    let value_ty = lower(lowering, pallet, &entry.name, &value)?;

    Ok(StorageEntry {
        name: entry.name,
        modifier: entry.modifier,
        keys,
        value_ty,
        default: entry.default,
        docs: entry.docs,
    })
}
