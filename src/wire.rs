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

//! The primitive SCALE wire format. A [`Cursor`] walks a byte slice, keeping track of how far
//! into the input it is so that errors can point at the offending byte. It implements
//! [`parity_scale_codec::Input`], so anything deriving [`Decode`] can be read through it, and
//! adds the few readers that the dynamic value codec needs on top: compact integers checked
//! against a [`CompactPolicy`], borrowed byte strings, and primitives which report exactly how
//! many bytes were missing.
//!
//! Nothing in here knows about types; both the metadata parser and the dynamic value codec
//! are built on top of it.

use alloc::vec::Vec;
use parity_scale_codec::Decode;

/// How strictly compact integers are checked when decoding them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompactPolicy {
    /// Reject compact integers which are not encoded in the shortest possible form.
    #[default]
    Canonical,
    /// Accept any compact encoding which decodes to a value that fits.
    Permissive,
}

/// An error reading from a [`Cursor`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display(fmt = "Error at byte {offset}: {kind}")]
pub struct Error {
    /// The offset into the input at which the error occurred.
    pub offset: usize,
    /// What went wrong.
    pub kind: ErrorKind,
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// The kind of error encountered reading from a [`Cursor`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ErrorKind {
    #[display(fmt = "Not enough bytes: needed {needed} but only {available} remain")]
    TruncatedInput { needed: usize, available: usize },
    #[display(fmt = "Malformed compact integer: {_0}")]
    MalformedCompact(&'static str),
    #[display(fmt = "Expected a bool (0 or 1) but got byte {_0}")]
    InvalidBoolEncoding(u8),
    #[display(fmt = "String is not valid UTF-8")]
    InvalidUtf8,
    #[display(fmt = "Cannot decode {what}: {error}")]
    Codec { what: &'static str, error: parity_scale_codec::Error },
}

/// A cursor over some SCALE encoded bytes.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Start reading from the beginning of the given bytes.
    pub fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, offset: 0 }
    }

    /// How many bytes have been consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The bytes which have not been consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }

    /// The number of bytes which have not been consumed yet.
    pub fn remaining_len(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Have all of the bytes been consumed?
    pub fn is_empty(&self) -> bool {
        self.remaining_len() == 0
    }

    pub(crate) fn error(&self, kind: ErrorKind) -> Error {
        Error { offset: self.offset, kind }
    }

    /// Decode some `T` using its [`Decode`] impl. On failure, the error points at the byte
    /// the decoder had got up to, and names the type being decoded.
    pub fn decode<T: Decode>(&mut self) -> Result<T, Error> {
        T::decode(self).map_err(|error| {
            self.error(ErrorKind::Codec { what: core::any::type_name::<T>(), error })
        })
    }

    /// Consume exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        self.ensure(n)?;
        let bytes = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    fn ensure(&self, needed: usize) -> Result<(), Error> {
        let available = self.remaining_len();
        if needed > available {
            return Err(self.error(ErrorKind::TruncatedInput { needed, available }));
        }
        Ok(())
    }

    /// Consume exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        self.read_fixed()
    }

    // Fixed width values can only fail to decode by running out of bytes, which is checked
    // up front so that the error says how many were missing.
    fn read_fixed<T: Decode>(&mut self) -> Result<T, Error> {
        self.ensure(core::mem::size_of::<T>())?;
        self.decode()
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.read_fixed()
    }

    /// Read a little endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        self.read_fixed()
    }

    /// Read a little endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.read_fixed()
    }

    /// Read a little endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64, Error> {
        self.read_fixed()
    }

    /// Read a little endian `u128`.
    pub fn read_u128(&mut self) -> Result<u128, Error> {
        self.read_fixed()
    }

    /// Read a boolean, which must be encoded as exactly `0` or `1`.
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        let start = self.offset;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(Error { offset: start, kind: ErrorKind::InvalidBoolEncoding(n) }),
        }
    }

    /// Read a compact encoded integer of up to 128 bits.
    ///
    /// [`parity_scale_codec::Compact`] always insists on the shortest encoding, so this is
    /// read by hand in order to support [`CompactPolicy::Permissive`].
    pub fn read_compact(&mut self, policy: CompactPolicy) -> Result<u128, Error> {
        let start = self.offset;
        let malformed = |reason| Error { offset: start, kind: ErrorKind::MalformedCompact(reason) };
        let canonical = policy == CompactPolicy::Canonical;

        let first = self.read_u8()?;
        let value = match first & 0b11 {
            0b00 => u128::from(first >> 2),
            0b01 => {
                let second = self.read_u8()?;
                let value = u128::from(u16::from_le_bytes([first, second]) >> 2);
                if canonical && value < 1 << 6 {
                    return Err(malformed("value should have been encoded in single byte mode"));
                }
                value
            }
            0b10 => {
                let rest = self.read_array::<3>()?;
                let value =
                    u128::from(u32::from_le_bytes([first, rest[0], rest[1], rest[2]]) >> 2);
                if canonical && value < 1 << 14 {
                    return Err(malformed("value should have been encoded in two byte mode"));
                }
                value
            }
            _ => {
                let len = usize::from(first >> 2) + 4;
                if len > 16 {
                    return Err(malformed("big integer mode value does not fit in 128 bits"));
                }
                let bytes = self.take(len)?;
                let mut buf = [0u8; 16];
                buf[..len].copy_from_slice(bytes);
                let value = u128::from_le_bytes(buf);
                if canonical && (value < 1 << 30 || (len > 4 && bytes[len - 1] == 0)) {
                    return Err(malformed("big integer mode value has superfluous bytes"));
                }
                value
            }
        };
        Ok(value)
    }

    /// Read a compact encoded `u32`.
    pub fn read_compact_u32(&mut self, policy: CompactPolicy) -> Result<u32, Error> {
        let start = self.offset;
        let value = self.read_compact(policy)?;
        u32::try_from(value).map_err(|_| Error {
            offset: start,
            kind: ErrorKind::MalformedCompact("value does not fit in a u32"),
        })
    }

    /// Read a canonically compact encoded length prefix.
    pub fn read_len(&mut self) -> Result<usize, Error> {
        self.read_compact_u32(CompactPolicy::Canonical).map(|n| n as usize)
    }

    /// Read a length prefixed byte string, borrowing it from the input.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_len()?;
        self.take(len)
    }

    /// Read a length prefixed UTF-8 string, borrowing it from the input.
    pub fn read_str(&mut self) -> Result<&'a str, Error> {
        let start = self.offset;
        let bytes = self.read_bytes()?;
        core::str::from_utf8(bytes)
            .map_err(|_| Error { offset: start, kind: ErrorKind::InvalidUtf8 })
    }
}

impl parity_scale_codec::Input for Cursor<'_> {
    fn remaining_len(&mut self) -> Result<Option<usize>, parity_scale_codec::Error> {
        Ok(Some(Cursor::remaining_len(self)))
    }

    fn read(&mut self, into: &mut [u8]) -> Result<(), parity_scale_codec::Error> {
        let bytes = self.take(into.len()).map_err(|_| "Not enough data to fill buffer")?;
        into.copy_from_slice(bytes);
        Ok(())
    }
}

/// Compact encode some value onto the end of `out`, using the shortest encoding.
pub fn encode_compact(value: u128, out: &mut Vec<u8>) {
    if value < 1 << 6 {
        out.push((value as u8) << 2);
    } else if value < 1 << 14 {
        out.extend_from_slice(&(((value as u16) << 2) | 0b01).to_le_bytes());
    } else if value < 1 << 30 {
        out.extend_from_slice(&(((value as u32) << 2) | 0b10).to_le_bytes());
    } else {
        let bits = 128 - value.leading_zeros() as usize;
        let len = ((bits + 7) / 8).max(4);
        out.push((((len - 4) as u8) << 2) | 0b11);
        out.extend_from_slice(&value.to_le_bytes()[..len]);
    }
}

/// Encode some bytes with a compact length prefix onto the end of `out`.
pub fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    encode_compact(bytes.len() as u128, out);
    out.extend_from_slice(bytes);
}

/// Encode a string with a compact length prefix onto the end of `out`.
pub fn encode_str(s: &str, out: &mut Vec<u8>) {
    encode_bytes(s.as_bytes(), out)
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::string::String;
    use alloc::vec;
    use parity_scale_codec::{Compact, Encode};

    fn compact(value: u128) -> Vec<u8> {
        let mut out = Vec::new();
        encode_compact(value, &mut out);
        out
    }

    #[test]
    fn compact_encoding_matches_parity_scale_codec() {
        let values =
            [0, 1, 63, 64, 16383, 16384, (1 << 30) - 1, 1 << 30, u32::MAX as u128, 1 << 40];
        for value in values.into_iter().chain([u64::MAX as u128, u128::MAX]) {
            assert_eq!(compact(value), Compact(value).encode(), "encoding {value}");
            let bytes = compact(value);
            let mut cursor = Cursor::new(&bytes);
            assert_eq!(cursor.read_compact(CompactPolicy::Canonical).unwrap(), value);
            assert!(cursor.is_empty());
        }
    }

    #[test]
    fn compact_big_integer_mode_layout() {
        assert_eq!(compact(1 << 40), vec![0x0b, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn non_canonical_compacts_depend_on_policy() {
        // 1 encoded in two byte mode, 2^6 in four byte mode, 2^30 padded to 5 bytes.
        let cases: [&[u8]; 3] =
            [&[0b0000_0101, 0], &[0b0000_0010, 1, 0, 0], &[0b0000_0111, 0, 0, 0, 0x40, 0]];
        for bytes in cases {
            let err = Cursor::new(bytes).read_compact(CompactPolicy::Canonical).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::MalformedCompact(_)), "{bytes:?}");
            assert_eq!(err.offset, 0);
            assert!(Cursor::new(bytes).read_compact(CompactPolicy::Permissive).is_ok());
        }
    }

    #[test]
    fn compact_wider_than_128_bits_is_malformed() {
        let mut bytes = vec![0xff];
        bytes.extend([1u8; 67]);
        let err = Cursor::new(&bytes).read_compact(CompactPolicy::Permissive).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedCompact(_)));
    }

    #[test]
    fn reading_past_the_end_reports_truncation() {
        let mut cursor = Cursor::new(&[1, 2, 3]);
        cursor.read_u8().unwrap();
        let err = cursor.read_u32().unwrap_err();
        let kind = ErrorKind::TruncatedInput { needed: 4, available: 2 };
        assert_eq!(err, Error { offset: 1, kind });
    }

    #[test]
    fn bools_must_be_zero_or_one() {
        assert_eq!(Cursor::new(&[1]).read_bool(), Ok(true));
        assert_eq!(
            Cursor::new(&[2]).read_bool().unwrap_err().kind,
            ErrorKind::InvalidBoolEncoding(2)
        );
    }

    #[test]
    fn derived_types_decode_through_a_cursor() {
        let encoded = (String::from("hello"), vec![1u16, 2, 3], Some(7u8)).encode();
        let mut cursor = Cursor::new(&encoded);

        assert_eq!(cursor.read_str().unwrap(), "hello");
        assert_eq!(cursor.decode::<Vec<u16>>().unwrap(), vec![1, 2, 3]);
        assert_eq!(cursor.decode::<Option<u8>>().unwrap(), Some(7));
        assert!(cursor.is_empty());
    }

    #[test]
    fn codec_errors_point_at_where_decoding_stopped() {
        // A valid string, then an option tag of 2.
        let mut bytes = String::from("ab").encode();
        bytes.push(2);
        let mut cursor = Cursor::new(&bytes);

        let err = cursor.decode::<(String, Option<u8>)>().unwrap_err();
        assert_eq!(err.offset, 4);
        assert!(matches!(err.kind, ErrorKind::Codec { .. }), "{err:?}");

        // Lengths longer than the input are caught before anything is allocated.
        let err = Cursor::new(&[0xfe, 0xff, 0xff, 0xff]).decode::<Vec<u8>>().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Codec { .. }), "{err:?}");
    }

    #[test]
    fn invalid_utf8_is_reported_at_the_string_start() {
        let bytes = [0u8, 8, 0xff, 0xfe];
        let mut cursor = Cursor::new(&bytes);
        cursor.read_u8().unwrap();
        let err = cursor.read_str().unwrap_err();
        assert_eq!(err, Error { offset: 1, kind: ErrorKind::InvalidUtf8 });
    }

    #[test]
    fn compact_policy_deserializes_from_camel_case() {
        let policy: CompactPolicy = serde_json::from_str(r#""permissive""#).unwrap();
        assert_eq!(policy, CompactPolicy::Permissive);
        assert_eq!(CompactPolicy::default(), CompactPolicy::Canonical);
    }
}
