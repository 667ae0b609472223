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

//! V13 metadata. Storage entries can now be N-maps, with any number of hashed keys.

use super::legacy::{self, Indexed, LegacyMetadata, ModuleRecord, NMapEntry};
use super::MetadataParseError;
use crate::wire::Cursor;

pub(super) fn decode(input: &mut Cursor<'_>) -> Result<LegacyMetadata, MetadataParseError> {
    legacy::decode::<Indexed<ModuleRecord<NMapEntry>>>(input, true)
}
