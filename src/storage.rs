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

//! Building the keys that storage values live at.
//!
//! A storage key is `twox_128(pallet prefix) ++ twox_128(entry name)`, followed by each of the
//! entry's keys, SCALE encoded and then hashed with the hasher declared for that key. Some
//! hashers ("concatenating" ones) append the encoded key after the hash, which is what allows
//! [`StorageKeyBuilder::decode_key()`] to recover key values from a storage key.

use crate::decode::{decode_value, DecodeError};
use crate::encode::{encode_value_to, EncodeError};
use crate::metadata::{Metadata, StorageEntry};
use crate::value::Value;
use crate::wire::Cursor;
use alloc::string::String;
use alloc::vec::Vec;
use parity_scale_codec::Decode;

/// Something which can hash the encoded bytes of a storage key.
pub trait Hasher {
    /// The name of the hasher, eg `Blake2_128Concat`.
    fn name(&self) -> &str;

    /// Does this hasher append the input to its output?
    fn is_concatenating(&self) -> bool;

    /// How many bytes the hash is, not counting any appended input.
    fn output_len(&self) -> usize;

    /// Hash some bytes, returning only the hash.
    fn hash(&self, bytes: &[u8]) -> Vec<u8>;

    /// Hash some bytes, appending them to the output if this is a concatenating hasher. This is
    /// what ends up in storage keys.
    fn hash_key(&self, bytes: &[u8]) -> Vec<u8> {
        let mut out = self.hash(bytes);
        if self.is_concatenating() {
            out.extend_from_slice(bytes);
        }
        out
    }
}

/// The hashers that storage keys can be declared with.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, Decode)]
pub enum StorageHasher {
    Blake2_128,
    Blake2_256,
    Blake2_128Concat,
    Twox128,
    Twox256,
    Twox64Concat,
    Identity,
}

impl Hasher for StorageHasher {
    fn name(&self) -> &str {
        match self {
            StorageHasher::Blake2_128 => "Blake2_128",
            StorageHasher::Blake2_256 => "Blake2_256",
            StorageHasher::Blake2_128Concat => "Blake2_128Concat",
            StorageHasher::Twox128 => "Twox128",
            StorageHasher::Twox256 => "Twox256",
            StorageHasher::Twox64Concat => "Twox64Concat",
            StorageHasher::Identity => "Identity",
        }
    }

    fn is_concatenating(&self) -> bool {
        matches!(
            self,
            StorageHasher::Blake2_128Concat | StorageHasher::Twox64Concat | StorageHasher::Identity
        )
    }

    fn output_len(&self) -> usize {
        match self {
            StorageHasher::Blake2_128 | StorageHasher::Blake2_128Concat => 16,
            StorageHasher::Blake2_256 => 32,
            StorageHasher::Twox128 => 16,
            StorageHasher::Twox256 => 32,
            StorageHasher::Twox64Concat => 8,
            StorageHasher::Identity => 0,
        }
    }

    fn hash(&self, bytes: &[u8]) -> Vec<u8> {
        use sp_crypto_hashing as hashing;
        match self {
            StorageHasher::Blake2_128 | StorageHasher::Blake2_128Concat => {
                hashing::blake2_128(bytes).to_vec()
            }
            StorageHasher::Blake2_256 => hashing::blake2_256(bytes).to_vec(),
            StorageHasher::Twox128 => hashing::twox_128(bytes).to_vec(),
            StorageHasher::Twox256 => hashing::twox_256(bytes).to_vec(),
            StorageHasher::Twox64Concat => hashing::twox_64(bytes).to_vec(),
            StorageHasher::Identity => Vec::new(),
        }
    }
}

/// Hands out the hashers used to build storage keys. Implement this to swap in different hash
/// functions, for instance on chains which hash differently.
pub trait HasherProvider {
    /// The hasher type handed back.
    type Hasher: Hasher;

    /// The 128 bit hasher used for the pallet and entry names at the start of every key.
    fn prefix_hasher(&self) -> Self::Hasher;

    /// The hasher to use for a key declared with the given [`StorageHasher`].
    fn key_hasher(&self, hasher: StorageHasher) -> Self::Hasher;
}

/// The standard Substrate hashers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHashers;

impl HasherProvider for DefaultHashers {
    type Hasher = StorageHasher;

    fn prefix_hasher(&self) -> StorageHasher {
        StorageHasher::Twox128
    }

    fn key_hasher(&self, hasher: StorageHasher) -> StorageHasher {
        hasher
    }
}

/// An error building or decoding a storage key.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum StorageKeyError {
    #[display(fmt = "Pallet '{_0}' not found")]
    PalletNotFound(String),
    #[display(fmt = "Storage entry '{pallet}.{entry}' not found")]
    EntryNotFound { pallet: String, entry: String },
    #[display(fmt = "Wrong number of keys: expected {expected} but got {found}")]
    BadPathArity { expected: usize, found: usize },
    #[display(fmt = "Cannot encode key {index}: {error}")]
    Encode { index: usize, error: EncodeError },
    #[display(fmt = "Cannot decode key {index}: {error}")]
    Decode { index: usize, error: DecodeError },
    #[display(fmt = "The storage key does not start with the prefix for this entry")]
    PrefixMismatch,
    #[display(fmt = "The prefix hasher must output 16 bytes, but gave {found}")]
    PrefixHashLength { found: usize },
    #[display(fmt = "{_0} bytes were left over after decoding every key")]
    TrailingBytes(usize),
}

#[cfg(feature = "std")]
impl std::error::Error for StorageKeyError {}

/// A storage key, with the prefix and each hashed key kept separate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    /// The hashed pallet prefix followed by the hashed entry name.
    pub prefix: [u8; 32],
    /// Each hashed key, in order.
    pub components: Vec<Vec<u8>>,
}

impl StorageKey {
    /// The bytes of the whole key.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = 32 + self.components.iter().map(Vec::len).sum::<usize>();
        let mut out = Vec::with_capacity(len);
        out.extend_from_slice(&self.prefix);
        for component in &self.components {
            out.extend_from_slice(component);
        }
        out
    }
}

/// One key recovered from a storage key by [`StorageKeyBuilder::decode_key()`].
#[derive(Debug, Clone, PartialEq)]
pub struct StorageKeyPart {
    /// The hasher declared for this key.
    pub hasher: StorageHasher,
    /// The hash of the key, not including any appended key bytes.
    pub hash: Vec<u8>,
    /// The key itself, if the hasher is a concatenating one.
    pub value: Option<Value>,
}

/// Builds storage keys for the entries in some [`Metadata`].
///
/// ```rust,ignore
/// let builder = StorageKeyBuilder::new(&metadata);
/// let key = builder.key("System", "Account", &[Value::bytes([0u8; 32])])?;
/// let bytes = key.to_bytes();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StorageKeyBuilder<'m, P = DefaultHashers> {
    metadata: &'m Metadata,
    hashers: P,
}

impl<'m> StorageKeyBuilder<'m, DefaultHashers> {
    /// Build keys using the standard hashers.
    pub fn new(metadata: &'m Metadata) -> Self {
        StorageKeyBuilder { metadata, hashers: DefaultHashers }
    }
}

impl<'m, P: HasherProvider> StorageKeyBuilder<'m, P> {
    /// Build keys using some other hashers.
    pub fn with_hashers<Q: HasherProvider>(self, hashers: Q) -> StorageKeyBuilder<'m, Q> {
        StorageKeyBuilder { metadata: self.metadata, hashers }
    }

    /// The 32 byte prefix that every key of this entry starts with.
    pub fn prefix(&self, pallet: &str, entry: &str) -> Result<[u8; 32], StorageKeyError> {
        let (prefix, _) = self.find(pallet, entry)?;
        self.hash_prefix(prefix, entry)
    }

    /// Build the key to a single value. Exactly as many keys as the entry declares must be
    /// given, and only entries with 0, 1 or 2 keys are supported.
    pub fn key(
        &self,
        pallet: &str,
        entry: &str,
        keys: &[Value],
    ) -> Result<StorageKey, StorageKeyError> {
        let (prefix, storage) = self.find(pallet, entry)?;
        let expected = storage.keys.len();
        if expected > 2 || keys.len() != expected {
            return Err(StorageKeyError::BadPathArity { expected, found: keys.len() });
        }
        self.build(prefix, storage, keys)
    }

    /// Build a key which is a prefix of the keys of every value whose first keys are the ones
    /// given. With no keys, this is the prefix of every value in the entry.
    pub fn iter_prefix(
        &self,
        pallet: &str,
        entry: &str,
        keys: &[Value],
    ) -> Result<StorageKey, StorageKeyError> {
        let (prefix, storage) = self.find(pallet, entry)?;
        let declared = storage.keys.len();
        if keys.len() > declared {
            return Err(StorageKeyError::BadPathArity { expected: declared, found: keys.len() });
        }
        self.build(prefix, storage, keys)
    }

    /// Recover the keys from a full storage key for the given entry. Keys hashed with a
    /// concatenating hasher come back with their values; others just with their hashes.
    pub fn decode_key(
        &self,
        pallet: &str,
        entry: &str,
        bytes: &[u8],
    ) -> Result<Vec<StorageKeyPart>, StorageKeyError> {
        let (prefix, storage) = self.find(pallet, entry)?;
        let expected_prefix = self.hash_prefix(prefix, entry)?;
        if bytes.get(..32) != Some(&expected_prefix[..]) {
            return Err(StorageKeyError::PrefixMismatch);
        }

        let types = self.metadata.types();
        let mut input = Cursor::new(&bytes[32..]);
        let mut parts = Vec::with_capacity(storage.keys.len());
        for (index, &(hasher, ty)) in storage.keys.iter().enumerate() {
            let key_hasher = self.hashers.key_hasher(hasher);
            let decode_err = |error: DecodeError| StorageKeyError::Decode { index, error };

            let hash = input.take(key_hasher.output_len()).map_err(|e| decode_err(e.into()))?;
            let value = if key_hasher.is_concatenating() {
                Some(decode_value(&mut input, ty, types).map_err(decode_err)?)
            } else {
                None
            };
            parts.push(StorageKeyPart { hasher, hash: hash.to_vec(), value });
        }

        if !input.is_empty() {
            return Err(StorageKeyError::TrailingBytes(input.remaining_len()));
        }
        Ok(parts)
    }

    fn find(
        &self,
        pallet: &str,
        entry: &str,
    ) -> Result<(&'m str, &'m StorageEntry), StorageKeyError> {
        let metadata: &'m Metadata = self.metadata;
        let p = metadata
            .pallet_by_name(pallet)
            .ok_or_else(|| StorageKeyError::PalletNotFound(pallet.into()))?;
        let e = p.storage_entry(entry).ok_or_else(|| StorageKeyError::EntryNotFound {
            pallet: pallet.into(),
            entry: entry.into(),
        })?;
        Ok((p.storage_prefix(), e))
    }

    fn hash_prefix(&self, prefix: &str, entry: &str) -> Result<[u8; 32], StorageKeyError> {
        let hasher = self.hashers.prefix_hasher();
        let mut out = [0u8; 32];
        for (half, name) in out.chunks_mut(16).zip([prefix, entry]) {
            let hash = hasher.hash(name.as_bytes());
            if hash.len() != half.len() {
                return Err(StorageKeyError::PrefixHashLength { found: hash.len() });
            }
            half.copy_from_slice(&hash);
        }
        Ok(out)
    }

    // Callers have checked that there are no more keys than the entry declares.
    fn build(
        &self,
        prefix: &str,
        storage: &StorageEntry,
        keys: &[Value],
    ) -> Result<StorageKey, StorageKeyError> {
        let types = self.metadata.types();
        let mut components = Vec::with_capacity(keys.len());
        let mut encoded = Vec::new();
        for (index, (value, &(hasher, ty))) in keys.iter().zip(&storage.keys).enumerate() {
            encoded.clear();
            encode_value_to(value, ty, types, &mut encoded)
                .map_err(|error| StorageKeyError::Encode { index, error })?;
            components.push(self.hashers.key_hasher(hasher).hash_key(&encoded));
        }

        let prefix_hash = self.hash_prefix(prefix, &storage.name)?;
        tracing::trace!(prefix, entry = %storage.name, keys = keys.len(), "built storage key");
        Ok(StorageKey { prefix: prefix_hash, components })
    }
}
