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

//! The records shared by V14 and V15 metadata, which point into a portable type registry rather
//! than naming their types. Normalizing them is mostly a case of building indexes, and splitting
//! the tuple key of an N-map into one key type per hasher.

use super::portable::PortableRegistry;
use super::{
    ConstantMetadata, CustomValue, ExtrinsicMetadata, Metadata, MetadataParseError,
    MetadataParts, OuterEnums, PalletMetadata, RuntimeApi, SignedExtensionMetadata, StorageEntry,
    StorageEntryModifier,
};
use crate::storage::StorageHasher;
use crate::type_graph::{Shape, TypeGraph, TypeId};
use crate::wire::Cursor;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use parity_scale_codec::Decode;

pub(super) struct ModernMetadata {
    pub types: TypeGraph,
    pub pallets: Vec<Pallet>,
    pub extrinsic: ExtrinsicMetadata,
    pub runtime_ty: TypeId,
    pub runtime_apis: Vec<RuntimeApi>,
    pub outer_enums: Option<OuterEnums>,
    pub custom: BTreeMap<String, CustomValue>,
}

/// A pallet as V14 encodes it. V15 appends docs, which are otherwise left empty.
#[derive(Decode)]
pub(super) struct Pallet {
    pub name: String,
    pub storage: Option<Storage>,
    pub calls: Option<TypeId>,
    pub event: Option<TypeId>,
    pub constants: Vec<ConstantMetadata>,
    pub error: Option<TypeId>,
    pub index: u8,
    #[codec(skip)]
    pub docs: Vec<String>,
}

#[derive(Decode)]
pub(super) struct Storage {
    pub prefix: String,
    pub entries: Vec<Entry>,
}

#[derive(Decode)]
pub(super) struct Entry {
    pub name: String,
    pub modifier: StorageEntryModifier,
    pub ty: EntryType,
    pub default: Vec<u8>,
    pub docs: Vec<String>,
}

#[derive(Decode)]
pub(super) enum EntryType {
    Plain(TypeId),
    Map { hashers: Vec<StorageHasher>, key: TypeId, value: TypeId },
}

#[derive(Decode)]
pub(super) struct SignedExtension {
    identifier: String,
    ty: TypeId,
    additional_signed: TypeId,
}

impl From<SignedExtension> for SignedExtensionMetadata {
    fn from(ext: SignedExtension) -> Self {
        SignedExtensionMetadata {
            identifier: ext.identifier,
            ty: Some(ext.ty),
            additional_signed: Some(ext.additional_signed),
        }
    }
}

/// Decode the registry which opens V14 and V15 metadata, followed by the pallets.
pub(super) fn decode_types_and_pallets<P: Decode + Into<Pallet>>(
    input: &mut Cursor<'_>,
) -> Result<(TypeGraph, Vec<Pallet>), MetadataParseError> {
    let types = input.decode::<PortableRegistry>()?.into_graph()?;
    let pallets = input.decode::<Vec<P>>()?.into_iter().map(Into::into).collect();
    Ok((types, pallets))
}

/// Turn V14 or V15 metadata into [`Metadata`].
pub(super) fn normalize(
    metadata: ModernMetadata,
    version: u8,
) -> Result<Metadata, MetadataParseError> {
    let types = metadata.types;
    let pallets = metadata
        .pallets
        .into_iter()
        .map(|pallet| normalize_pallet(&types, pallet))
        .collect::<Result<_, _>>()?;

    MetadataParts {
        version,
        types,
        pallets,
        extrinsic: Some(metadata.extrinsic),
        outer_enums: metadata.outer_enums,
        runtime_ty: Some(metadata.runtime_ty),
        custom: metadata.custom,
        runtime_apis: metadata.runtime_apis,
    }
    .into_metadata()
}

fn normalize_pallet(
    types: &TypeGraph,
    pallet: Pallet,
) -> Result<PalletMetadata, MetadataParseError> {
    let (storage_prefix, storage) = match pallet.storage {
        Some(storage) => {
            let entries = storage
                .entries
                .into_iter()
                .map(|entry| normalize_entry(types, &pallet.name, entry))
                .collect::<Result<_, _>>()?;
            (storage.prefix, entries)
        }
        None => (pallet.name.clone(), Vec::new()),
    };

    Ok(PalletMetadata {
        name: pallet.name,
        index: pallet.index,
        call_index: pallet.index,
        event_index: pallet.index,
        error_index: pallet.index,
        call_ty: pallet.calls,
        event_ty: pallet.event,
        error_ty: pallet.error,
        calls: Default::default(),
        events: Default::default(),
        errors: Default::default(),
        storage_prefix,
        storage,
        constants: pallet.constants,
        docs: pallet.docs,
    })
}

fn normalize_entry(
    types: &TypeGraph,
    pallet: &str,
    entry: Entry,
) -> Result<StorageEntry, MetadataParseError> {
    let (keys, value_ty) = match entry.ty {
        EntryType::Plain(value) => (Vec::new(), value),
        EntryType::Map { hashers, key, value } => {
            (split_keys(types, pallet, &entry.name, hashers, key)?, value)
        }
    };
    Ok(StorageEntry {
        name: entry.name,
        modifier: entry.modifier,
        keys,
        value_ty,
        default: entry.default,
        docs: entry.docs,
    })
}

// A map with one hasher has a single key of whatever type. With more hashers, the key is a
// tuple with one element per hasher.
fn split_keys(
    types: &TypeGraph,
    pallet: &str,
    entry: &str,
    hashers: Vec<StorageHasher>,
    key: TypeId,
) -> Result<Vec<(StorageHasher, TypeId)>, MetadataParseError> {
    if let [hasher] = hashers[..] {
        return Ok(vec![(hasher, key)]);
    }

    let keys = match types.shape(key)? {
        Shape::Tuple(ids) if !hashers.is_empty() => ids.clone(),
        _ => vec![key],
    };
    if keys.len() != hashers.len() {
        return Err(MetadataParseError::StorageKeyArityMismatch {
            pallet: pallet.into(),
            entry: entry.into(),
            hashers: hashers.len(),
            keys: keys.len(),
        });
    }
    Ok(hashers.into_iter().zip(keys).collect())
}
