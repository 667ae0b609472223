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

//! V12 metadata. Modules now carry an explicit index, which is what selects them in the outer
//! call, event and error enums.

use super::legacy::{self, Indexed, LegacyMetadata, MapEntry, ModuleRecord};
use super::MetadataParseError;
use crate::storage::StorageHasher;
use crate::wire::Cursor;

pub(super) fn decode(input: &mut Cursor<'_>) -> Result<LegacyMetadata, MetadataParseError> {
    legacy::decode::<Indexed<ModuleRecord<MapEntry<StorageHasher>>>>(input, true)
}

#[cfg(test)]
mod test {
    use crate::metadata::{Metadata, MetadataParseError};
    use crate::test_utils::legacy::*;
    use crate::test_utils::modern::with_header;
    use crate::Value;
    use alloc::vec;
    use alloc::vec::Vec;

    fn indexed(name: &str, index: u8, calls: Option<Vec<Call>>) -> IndexedModule {
        IndexedModule {
            name: s(name),
            storage: None,
            calls,
            event: None,
            constants: vec![],
            errors: vec![],
            index,
        }
    }

    fn bytes(modules: Vec<IndexedModule>) -> Vec<u8> {
        let extrinsic = Extrinsic { version: 4, signed_extensions: vec![] };
        with_header(12, (modules, extrinsic))
    }

    #[test]
    fn module_indexes_select_calls() {
        let remark = Call {
            name: s("remark"),
            args: vec![Arg { name: s("remark"), ty: s("Vec<u8>") }],
            docs: vec![],
        };
        let metadata = Metadata::parse(&bytes(vec![
            indexed("System", 0, Some(vec![remark])),
            indexed("Sudo", 9, None),
        ]))
        .unwrap();

        assert_eq!(metadata.pallet_by_index(9).unwrap().name(), "Sudo");
        assert_eq!(metadata.pallet_by_call_index(0).unwrap().name(), "System");
        assert!(metadata.pallet_by_call_index(9).is_none());

        let value = metadata.decode_call(&[0, 0, 4, 7]).unwrap();
        assert_eq!(
            value,
            Value::unnamed_variant(
                "System",
                [Value::named_variant("remark", [("remark", Value::bytes([7]))])]
            )
        );
    }

    #[test]
    fn duplicate_module_indexes_are_rejected() {
        let same_index = bytes(vec![indexed("A", 1, None), indexed("B", 1, None)]);
        let err = Metadata::parse(&same_index).unwrap_err();
        assert_eq!(err, MetadataParseError::DuplicatePalletIndex(1));

        let same_name = bytes(vec![indexed("A", 1, None), indexed("A", 2, None)]);
        let err = Metadata::parse(&same_name).unwrap_err();
        assert_eq!(err, MetadataParseError::DuplicatePalletName(s("A")));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = bytes(vec![indexed("A", 1, None)]);
        bytes.extend([1, 2, 3]);
        assert_eq!(Metadata::parse(&bytes).unwrap_err(), MetadataParseError::TrailingBytes(3));
    }
}
