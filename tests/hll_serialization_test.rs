// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use hll_multiset::error::ErrorKind;
use hll_multiset::hash::hash_i64;
use hll_multiset::hll::{HllSketch, MAX_BODY_BYTES, Params, WireType};

fn default_params() -> Params {
    Params::new(11, 5, -1, true).unwrap()
}

#[test]
fn test_empty_sketch_wire_bytes() {
    let sketch = HllSketch::empty(default_params());
    let bytes = sketch.serialize();
    assert_eq!(bytes, [0x11, 0x8b, 0x7f]);
    assert_eq!(sketch.serialized_size(), 3);

    let (decoded, wire_type, version) = HllSketch::deserialize(&bytes).unwrap();
    assert_eq!(version, 1);
    assert_eq!(wire_type, WireType::Empty);
    assert_eq!(decoded, sketch);
    assert_eq!(decoded.cardinality().unwrap(), Some(0.0));
}

#[test]
fn test_explicit_sketch_wire_bytes() {
    let mut sketch = HllSketch::empty(default_params());
    for token in [1u64, 2, 3] {
        sketch.add(token);
    }

    let bytes = sketch.serialize();
    assert_eq!(bytes.len(), 27);
    assert_eq!(&bytes[..3], [0x12, 0x8b, 0x7f]);
    // Tokens as big-endian 8-byte values, ascending.
    assert_eq!(&bytes[3..11], 1u64.to_be_bytes());
    assert_eq!(&bytes[11..19], 2u64.to_be_bytes());
    assert_eq!(&bytes[19..27], 3u64.to_be_bytes());

    let (decoded, wire_type, _) = HllSketch::deserialize(&bytes).unwrap();
    assert_eq!(wire_type, WireType::Explicit);
    assert_eq!(decoded, sketch);
}

#[test]
fn test_union_with_empty_preserves_bytes() {
    let mut sketch = HllSketch::empty(default_params());
    for token in [1u64, 2, 3] {
        sketch.add(token);
    }
    let expected = sketch.serialize();

    sketch.union(&HllSketch::empty(default_params())).unwrap();
    assert_eq!(sketch.serialize(), expected);
}

#[test]
fn test_sparse_frame_for_single_register() {
    // Forcing dense mode with one filled register makes the sparse body a
    // single 16-bit chunk.
    let params = Params::new(11, 5, 0, true).unwrap();
    let mut sketch = HllSketch::empty(params);
    // idx = 0, window = 1: register 0 takes value 1.
    sketch.add(1u64 << 11);

    let bytes = sketch.serialize();
    assert_eq!(sketch.serialized_size(), 5);
    assert_eq!(bytes, [0x13, 0x8b, 0x40, 0x00, 0x01]);

    let (decoded, wire_type, _) = HllSketch::deserialize(&bytes).unwrap();
    assert_eq!(wire_type, WireType::Sparse);
    // Sparse is a wire-only form; it decodes as a dense sketch.
    assert_eq!(decoded, sketch);
    assert!(decoded.to_string().starts_with("DENSE, 1 filled"));
}

#[test]
fn test_sparse_frame_with_wide_chunks() {
    // log2m = 26 with regwidth 7 packs 33-bit sparse chunks; a register
    // index above 2^25 needs every one of those bits.
    let params = Params::new(26, 7, 0, true).unwrap();
    let mut sketch = HllSketch::empty(params);
    // idx = 2^25, window = 2^6: register 2^25 takes value 7.
    sketch.add((1u64 << 32) | (1u64 << 25));

    let bytes = sketch.serialize();
    assert_eq!(sketch.serialized_size(), 3 + (33 + 7) / 8);
    assert_eq!(
        bytes,
        [0x13, 0xda, 0x40, 0x80, 0x00, 0x00, 0x03, 0x80]
    );

    // A register bank this large is over the decode body bound, so the
    // frame is for consumers without that bound; decoding it here reports
    // the oversize.
    let err = HllSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(err.message().contains("too large"));
}

#[test]
fn test_dense_frame_when_sparse_is_larger() {
    let params = Params::new(11, 5, 0, true).unwrap();
    let mut sketch = HllSketch::empty(params);
    for ii in 0..5000i64 {
        sketch.add(hash_i64(ii, 0));
    }

    // Most registers are filled, so 16-bit sparse chunks cost more than
    // 5 bits per register.
    let bytes = sketch.serialize();
    assert_eq!(bytes.len(), 3 + (2048 * 5 + 7) / 8);
    assert_eq!(bytes[0], 0x14);

    let (decoded, wire_type, _) = HllSketch::deserialize(&bytes).unwrap();
    assert_eq!(wire_type, WireType::Dense);
    assert_eq!(decoded, sketch);
    assert_eq!(
        decoded.cardinality().unwrap(),
        sketch.cardinality().unwrap()
    );
}

#[test]
fn test_dense_frame_without_sparseon() {
    let params = Params::new(4, 5, 0, false).unwrap();
    let mut sketch = HllSketch::empty(params);
    sketch.add(0x11);

    // One filled register, but sparse is disabled by the parameters.
    let bytes = sketch.serialize();
    assert_eq!(bytes.len(), 3 + (16 * 5 + 7) / 8);
    assert_eq!(bytes[0], 0x14);

    let (decoded, wire_type, _) = HllSketch::deserialize(&bytes).unwrap();
    assert_eq!(wire_type, WireType::Dense);
    assert_eq!(decoded, sketch);
}

#[test]
fn test_round_trip_through_promotion() {
    let mut sketch = HllSketch::empty(default_params());
    for ii in 0..400i64 {
        sketch.add(hash_i64(ii, 0));

        let bytes = sketch.serialize();
        assert_eq!(bytes.len(), sketch.serialized_size());

        let (decoded, _, _) = HllSketch::deserialize(&bytes).unwrap();
        assert_eq!(decoded, sketch);
        assert_eq!(decoded.serialize(), bytes);
    }
}

#[test]
fn test_undefined_frame_round_trip() {
    let bytes = [0x10, 0x8b, 0x7f];
    let (decoded, wire_type, _) = HllSketch::deserialize(&bytes).unwrap();
    assert_eq!(wire_type, WireType::Undefined);
    assert_eq!(decoded.cardinality().unwrap(), None);
    assert_eq!(decoded.serialize(), bytes);
}

#[test]
fn test_decoded_params_are_observable() {
    let params = Params::new(13, 6, 64, false).unwrap();
    let bytes = HllSketch::empty(params).serialize();

    let (decoded, _, version) = HllSketch::deserialize(&bytes).unwrap();
    assert_eq!(version, 1);
    assert_eq!(decoded.params().log2m(), 13);
    assert_eq!(decoded.params().regwidth(), 6);
    assert_eq!(decoded.params().expthresh(), 64);
    assert_eq!(decoded.params().explicit_capacity(), 64);
    assert!(!decoded.params().sparseon());
}

#[test]
fn test_reject_unknown_version() {
    let err = HllSketch::deserialize(&[0x21, 0x8b, 0x7f]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    let err = HllSketch::deserialize(&[0x01, 0x8b, 0x7f]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_reject_unknown_type() {
    let err = HllSketch::deserialize(&[0x15, 0x8b, 0x7f]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_reject_truncated_frames() {
    assert!(HllSketch::deserialize(&[]).is_err());
    assert!(HllSketch::deserialize(&[0x11]).is_err());
    assert!(HllSketch::deserialize(&[0x11, 0x8b]).is_err());
}

#[test]
fn test_reject_oversized_empty_frame() {
    let err = HllSketch::deserialize(&[0x11, 0x8b, 0x7f, 0x00]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_reject_ragged_explicit_body() {
    let mut bytes = vec![0x12, 0x8b, 0x7f];
    bytes.extend_from_slice(&[0u8; 12]);
    let err = HllSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_reject_unordered_explicit_tokens() {
    let mut descending = vec![0x12, 0x8b, 0x7f];
    descending.extend_from_slice(&2u64.to_be_bytes());
    descending.extend_from_slice(&1u64.to_be_bytes());
    assert!(HllSketch::deserialize(&descending).is_err());

    let mut duplicated = vec![0x12, 0x8b, 0x7f];
    duplicated.extend_from_slice(&1u64.to_be_bytes());
    duplicated.extend_from_slice(&1u64.to_be_bytes());
    assert!(HllSketch::deserialize(&duplicated).is_err());

    // Signed comparison: u64::MAX is -1 and must come first.
    let mut signed_order = vec![0x12, 0x8b, 0x7f];
    signed_order.extend_from_slice(&u64::MAX.to_be_bytes());
    signed_order.extend_from_slice(&1u64.to_be_bytes());
    assert!(HllSketch::deserialize(&signed_order).is_ok());

    let mut unsigned_order = vec![0x12, 0x8b, 0x7f];
    unsigned_order.extend_from_slice(&1u64.to_be_bytes());
    unsigned_order.extend_from_slice(&u64::MAX.to_be_bytes());
    assert!(HllSketch::deserialize(&unsigned_order).is_err());
}

#[test]
fn test_reject_oversized_explicit_body() {
    let mut bytes = vec![0x12, 0x8b, 0x7f];
    bytes.resize(3 + MAX_BODY_BYTES + 8, 0);
    let err = HllSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(err.message().contains("too large"));
}

#[test]
fn test_reject_dense_size_mismatch() {
    // log2m = 4, regwidth = 5 wants exactly 10 body bytes.
    let mut bytes = vec![0x14, 0x84, 0x40];
    bytes.extend_from_slice(&[0u8; 9]);
    assert!(HllSketch::deserialize(&bytes).is_err());

    bytes.push(0);
    assert!(HllSketch::deserialize(&bytes).is_ok());

    bytes.push(0);
    assert!(HllSketch::deserialize(&bytes).is_err());
}

#[test]
fn test_reject_sparse_padding_of_a_byte_or_more() {
    // log2m = 11, regwidth = 5: 16-bit chunks. Three body bytes leave a
    // full byte of pad after one chunk.
    let bytes = vec![0x13, 0x8b, 0x40, 0x00, 0x01, 0x00];
    let err = HllSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(err.message().contains("padding"));
}

#[test]
fn test_reject_oversized_register_banks() {
    // log2m = 31 would imply 2^31 registers; the body bound rejects it
    // before any allocation.
    let dense = [0x14, 0x9f, 0x40];
    assert!(HllSketch::deserialize(&dense).is_err());

    let sparse = [0x13, 0x9f, 0x40];
    let err = HllSketch::deserialize(&sparse).unwrap_err();
    assert!(err.message().contains("too large"));
}
