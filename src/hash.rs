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

//! Element ingestion hashing.
//!
//! Tokens fed to a sketch are the low 64 bits of a seeded MurmurHash3
//! x64 128 over the input bytes. Fixed-width integer keys hash their native
//! little-endian representation, matching hosts that feed the raw bytes of
//! their 1/2/4/8-byte integer types to the same hash.
//!
//! Seeds are signed for host convenience, but the hash itself treats the
//! seed as unsigned. Negative seeds cannot be represented by implementations
//! with unsigned seed types, so they draw a warning while still hashing.

use tracing::warn;

/// Hash a byte buffer into an element token.
pub fn hash_bytes(key: &[u8], seed: i32) -> u64 {
    check_seed(seed);
    let (h1, _) = mur3::murmurhash3_x64_128(key, seed as u32);
    h1
}

/// Hash a 1-byte fixed-width key.
pub fn hash_i8(key: i8, seed: i32) -> u64 {
    hash_bytes(&key.to_le_bytes(), seed)
}

/// Hash a 2-byte fixed-width key.
pub fn hash_i16(key: i16, seed: i32) -> u64 {
    hash_bytes(&key.to_le_bytes(), seed)
}

/// Hash a 4-byte fixed-width key.
pub fn hash_i32(key: i32, seed: i32) -> u64 {
    hash_bytes(&key.to_le_bytes(), seed)
}

/// Hash an 8-byte fixed-width key.
pub fn hash_i64(key: i64, seed: i32) -> u64 {
    hash_bytes(&key.to_le_bytes(), seed)
}

fn check_seed(seed: i32) {
    if seed < 0 {
        warn!(seed, "negative seed values not compatible");
    }
}
