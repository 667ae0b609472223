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

//! V15 metadata. Compared to V14, this adds runtime APIs, the outer enums, custom values, pallet
//! docs and more detail about the extrinsic format.

use super::modern::{self, ModernMetadata, Pallet, SignedExtension};
use super::{CustomValue, ExtrinsicMetadata, MetadataParseError, OuterEnums, RuntimeApi};
use crate::type_graph::TypeId;
use crate::wire::Cursor;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use parity_scale_codec::Decode;

#[derive(Decode)]
struct DocumentedPallet {
    pallet: Pallet,
    docs: Vec<String>,
}

impl From<DocumentedPallet> for Pallet {
    fn from(p: DocumentedPallet) -> Self {
        Pallet { docs: p.docs, ..p.pallet }
    }
}

#[derive(Decode)]
struct Extrinsic {
    version: u8,
    address_ty: TypeId,
    call_ty: TypeId,
    signature_ty: TypeId,
    extra_ty: TypeId,
    signed_extensions: Vec<SignedExtension>,
}

/// Everything after the pallets.
#[derive(Decode)]
struct Trailer {
    extrinsic: Extrinsic,
    runtime_ty: TypeId,
    apis: Vec<RuntimeApi>,
    outer_enums: OuterEnums,
    custom: BTreeMap<String, CustomValue>,
}

pub(super) fn decode(input: &mut Cursor<'_>) -> Result<ModernMetadata, MetadataParseError> {
    let (types, pallets) = modern::decode_types_and_pallets::<DocumentedPallet>(input)?;
    let Trailer { extrinsic, runtime_ty, apis, outer_enums, custom } = input.decode()?;

    let extrinsic = ExtrinsicMetadata {
        version: extrinsic.version,
        ty: None,
        address_ty: Some(extrinsic.address_ty),
        call_ty: Some(extrinsic.call_ty),
        signature_ty: Some(extrinsic.signature_ty),
        extra_ty: Some(extrinsic.extra_ty),
        signed_extensions: extrinsic.signed_extensions.into_iter().map(Into::into).collect(),
    };

    Ok(ModernMetadata {
        types,
        pallets,
        extrinsic,
        runtime_ty,
        runtime_apis: apis,
        outer_enums: Some(outer_enums),
        custom,
    })
}
