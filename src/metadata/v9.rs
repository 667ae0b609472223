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

//! V9 metadata. Pallets (modules) have no explicit index, there is no extrinsic information,
//! and only five storage hashers exist.

use super::legacy::{self, LegacyMetadata, MapEntry, ModuleRecord};
use super::MetadataParseError;
use crate::storage::StorageHasher;
use crate::wire::Cursor;
use parity_scale_codec::Decode;

/// The V9 storage hashers, in tag order.
#[derive(Decode)]
enum Hasher {
    Blake2_128,
    Blake2_256,
    Twox128,
    Twox256,
    Twox64Concat,
}

impl From<Hasher> for StorageHasher {
    fn from(hasher: Hasher) -> Self {
        match hasher {
            Hasher::Blake2_128 => StorageHasher::Blake2_128,
            Hasher::Blake2_256 => StorageHasher::Blake2_256,
            Hasher::Twox128 => StorageHasher::Twox128,
            Hasher::Twox256 => StorageHasher::Twox256,
            Hasher::Twox64Concat => StorageHasher::Twox64Concat,
        }
    }
}

pub(super) fn decode(input: &mut Cursor<'_>) -> Result<LegacyMetadata, MetadataParseError> {
    legacy::decode::<ModuleRecord<MapEntry<Hasher>>>(input, false)
}
