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

//! V10 metadata. This is V9 with an extra `Blake2_128Concat` storage hasher.

use super::legacy::{self, LegacyMetadata, MapEntry, ModuleRecord};
use super::MetadataParseError;
use crate::storage::StorageHasher;
use crate::wire::Cursor;
use parity_scale_codec::Decode;

/// The V10 storage hashers, in tag order. `Identity` arrives in V11.
#[derive(Decode)]
enum Hasher {
    Blake2_128,
    Blake2_256,
    Blake2_128Concat,
    Twox128,
    Twox256,
    Twox64Concat,
}

impl From<Hasher> for StorageHasher {
    fn from(hasher: Hasher) -> Self {
        match hasher {
            Hasher::Blake2_128 => StorageHasher::Blake2_128,
            Hasher::Blake2_256 => StorageHasher::Blake2_256,
            Hasher::Blake2_128Concat => StorageHasher::Blake2_128Concat,
            Hasher::Twox128 => StorageHasher::Twox128,
            Hasher::Twox256 => StorageHasher::Twox256,
            Hasher::Twox64Concat => StorageHasher::Twox64Concat,
        }
    }
}

pub(super) fn decode(input: &mut Cursor<'_>) -> Result<LegacyMetadata, MetadataParseError> {
    legacy::decode::<ModuleRecord<MapEntry<Hasher>>>(input, false)
}
