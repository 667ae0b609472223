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

//! Packing and unpacking bit sequences with [`bitvec`]. On the wire, a bit sequence is a
//! compact encoded number of bits followed by enough little endian words of the store type to
//! hold them. Within each word, `Lsb0` numbers bits from the least significant end and `Msb0`
//! from the most significant end.

use crate::type_graph::{BitsOrderFormat, BitsStoreFormat};
use crate::wire::{self, Cursor};
use alloc::vec::Vec;
use bitvec::prelude::{BitOrder, BitStore, BitVec, Lsb0, Msb0};
use parity_scale_codec::{Decode, Encode};

/// Read a bit sequence.
pub fn decode(
    input: &mut Cursor<'_>,
    store: BitsStoreFormat,
    order: BitsOrderFormat,
) -> Result<Vec<bool>, wire::Error> {
    use BitsOrderFormat as Order;
    use BitsStoreFormat as Store;
    match (store, order) {
        (Store::U8, Order::Lsb0) => decode_as::<u8, Lsb0>(input),
        (Store::U8, Order::Msb0) => decode_as::<u8, Msb0>(input),
        (Store::U16, Order::Lsb0) => decode_as::<u16, Lsb0>(input),
        (Store::U16, Order::Msb0) => decode_as::<u16, Msb0>(input),
        (Store::U32, Order::Lsb0) => decode_as::<u32, Lsb0>(input),
        (Store::U32, Order::Msb0) => decode_as::<u32, Msb0>(input),
        (Store::U64, Order::Lsb0) => decode_as::<u64, Lsb0>(input),
        (Store::U64, Order::Msb0) => decode_as::<u64, Msb0>(input),
    }
}

/// Write a bit sequence.
pub fn encode(bits: &[bool], store: BitsStoreFormat, order: BitsOrderFormat, out: &mut Vec<u8>) {
    use BitsOrderFormat as Order;
    use BitsStoreFormat as Store;
    match (store, order) {
        (Store::U8, Order::Lsb0) => encode_as::<u8, Lsb0>(bits, out),
        (Store::U8, Order::Msb0) => encode_as::<u8, Msb0>(bits, out),
        (Store::U16, Order::Lsb0) => encode_as::<u16, Lsb0>(bits, out),
        (Store::U16, Order::Msb0) => encode_as::<u16, Msb0>(bits, out),
        (Store::U32, Order::Lsb0) => encode_as::<u32, Lsb0>(bits, out),
        (Store::U32, Order::Msb0) => encode_as::<u32, Msb0>(bits, out),
        (Store::U64, Order::Lsb0) => encode_as::<u64, Lsb0>(bits, out),
        (Store::U64, Order::Msb0) => encode_as::<u64, Msb0>(bits, out),
    }
}

fn decode_as<T, O>(input: &mut Cursor<'_>) -> Result<Vec<bool>, wire::Error>
where
    T: BitStore + Decode,
    O: BitOrder,
{
    let bits = input.decode::<BitVec<T, O>>()?;
    Ok(bits.iter().by_vals().collect())
}

// The length prefix is written by hand since the codec impl panics past 2^29 bits.
fn encode_as<T, O>(bits: &[bool], out: &mut Vec<u8>)
where
    T: BitStore + Encode,
    O: BitOrder,
{
    let mut packed: BitVec<T, O> = bits.iter().copied().collect();
    packed.set_uninitialized(false);
    wire::encode_compact(bits.len() as u128, out);
    for word in packed.as_raw_slice() {
        word.encode_to(out);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::vec;

    fn decode_all(bytes: &[u8], store: BitsStoreFormat, order: BitsOrderFormat) -> Vec<bool> {
        let mut cursor = Cursor::new(bytes);
        let bits = decode(&mut cursor, store, order).unwrap();
        assert!(cursor.is_empty());
        bits
    }

    #[test]
    fn lsb0_and_msb0_read_the_same_byte_differently() {
        let byte = [0b0000_0101u8];
        assert_eq!(
            decode_all(&[3 << 2, byte[0]], BitsStoreFormat::U8, BitsOrderFormat::Lsb0),
            vec![true, false, true]
        );
        assert_eq!(
            decode_all(&[8 << 2, byte[0]], BitsStoreFormat::U8, BitsOrderFormat::Msb0),
            vec![false, false, false, false, false, true, false, true]
        );
    }

    #[test]
    fn words_are_little_endian() {
        // Bit 8 of a u16 word lives in the second byte.
        let bits = decode_all(&[9 << 2, 0, 1], BitsStoreFormat::U16, BitsOrderFormat::Lsb0);
        assert_eq!(bits.iter().position(|b| *b), Some(8));

        let mut out = Vec::new();
        encode(&bits, BitsStoreFormat::U16, BitsOrderFormat::Lsb0, &mut out);
        assert_eq!(out, vec![9 << 2, 0, 1]);
    }

    #[test]
    fn matches_bitvec_codec_output() {
        let bits = [true, true, false, true, false, false, false, true, true, false, true];
        let expected = BitVec::<u32, Msb0>::from_iter(bits).encode();

        let mut out = Vec::new();
        encode(&bits, BitsStoreFormat::U32, BitsOrderFormat::Msb0, &mut out);
        assert_eq!(out, expected);
        assert_eq!(out.len(), 1 + 4);
    }

    #[test]
    fn encode_then_decode_all_formats() {
        let bits = vec![true, true, false, true, false, false, false, true, true, false, true];
        let stores =
            [BitsStoreFormat::U8, BitsStoreFormat::U16, BitsStoreFormat::U32, BitsStoreFormat::U64];
        for store in stores {
            for order in [BitsOrderFormat::Lsb0, BitsOrderFormat::Msb0] {
                let mut out = Vec::new();
                encode(&bits, store, order, &mut out);
                assert_eq!(decode_all(&out, store, order), bits);
            }
        }
    }

    #[test]
    fn truncated_words_are_an_error() {
        // 16 bits need two bytes.
        let mut cursor = Cursor::new(&[16 << 2, 0xff]);
        let err = decode(&mut cursor, BitsStoreFormat::U8, BitsOrderFormat::Lsb0).unwrap_err();
        assert!(matches!(err.kind, wire::ErrorKind::Codec { .. }));
    }

    #[test]
    fn empty_bit_sequence() {
        let mut out = Vec::new();
        encode(&[], BitsStoreFormat::U32, BitsOrderFormat::Lsb0, &mut out);
        assert_eq!(out, vec![0]);
    }
}
