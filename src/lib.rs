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

//! A HyperLogLog multiset type for cardinality estimation.
//!
//! This crate implements a mergeable, storage-compatible HyperLogLog (HLL)
//! data type: a compact sketch that approximates the number of distinct
//! 64-bit tokens added to it. A sketch starts empty, stores small inputs
//! exactly as an explicit token list, and promotes itself to a bank of
//! `2^log2m` registers once the exact list outgrows its threshold. Sketches
//! with identical parameters can be unioned, serialized to a bit-exact wire
//! format, and folded through an aggregation accumulator.
//!
//! # Example
//!
//! ```
//! use hll_multiset::hll::{HllSketch, Params};
//!
//! let params = Params::new(11, 5, -1, true).unwrap();
//! let mut sketch = HllSketch::empty(params);
//! for token in [1u64, 2, 3] {
//!     sketch.add(token);
//! }
//! assert_eq!(sketch.cardinality().unwrap(), Some(3.0));
//!
//! let bytes = sketch.serialize();
//! let (restored, _, _) = HllSketch::deserialize(&bytes).unwrap();
//! assert_eq!(restored, sketch);
//! ```
//!
//! Raw input is turned into tokens by the seeded 128-bit hash in [`hash`];
//! the low 64 output bits are the token.

mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod hll;
