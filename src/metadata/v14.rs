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

//! V14 metadata, the first version to carry a portable type registry.

use super::modern::{self, ModernMetadata, Pallet, SignedExtension};
use super::{ExtrinsicMetadata, MetadataParseError};
use crate::type_graph::TypeId;
use crate::wire::Cursor;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use parity_scale_codec::Decode;

/// Everything after the pallets.
#[derive(Decode)]
struct Trailer {
    extrinsic_ty: TypeId,
    extrinsic_version: u8,
    signed_extensions: Vec<SignedExtension>,
    runtime_ty: TypeId,
}

pub(super) fn decode(input: &mut Cursor<'_>) -> Result<ModernMetadata, MetadataParseError> {
    let (types, pallets) = modern::decode_types_and_pallets::<Pallet>(input)?;
    let trailer: Trailer = input.decode()?;

    let extrinsic = ExtrinsicMetadata {
        version: trailer.extrinsic_version,
        ty: Some(trailer.extrinsic_ty),
        address_ty: None,
        call_ty: None,
        signature_ty: None,
        extra_ty: None,
        signed_extensions: trailer.signed_extensions.into_iter().map(Into::into).collect(),
    };

    Ok(ModernMetadata {
        types,
        pallets,
        extrinsic,
        runtime_ty: trailer.runtime_ty,
        runtime_apis: Vec::new(),
        outer_enums: None,
        custom: BTreeMap::new(),
    })
}
