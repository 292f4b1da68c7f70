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

//! HyperLogLog multiset for cardinality estimation.
//!
//! # Overview
//!
//! A sketch is parameterized by four immutable values fixed at construction
//! (see [`Params`]): the register count exponent `log2m`, the per-register
//! bit width `regwidth`, the explicit-mode capacity `expthresh` and the
//! sparse-encoding toggle `sparseon`. Sketches are interchangeable across
//! processes exactly when these parameters match.
//!
//! # Storage modes
//!
//! In memory a sketch is one of:
//!
//! - **Empty**: no tokens yet, parameters only.
//! - **Explicit**: an exact, sorted list of tokens, capped by
//!   [`Params::explicit_capacity`].
//! - **Dense**: `2^log2m` registers of `regwidth` bits each.
//! - **Undefined**: an invalid multiset decoded from the wire; absorbing
//!   for union and without a cardinality.
//!
//! A fourth on-wire mode, **sparse**, encodes only the non-zero registers
//! as `(index, value)` pairs and is materialized as dense on decode.
//!
//! # Aggregation
//!
//! [`Accumulator`] carries the uninitialized-until-first-observation
//! lifecycle reducers need: fold tokens and serialized sketches, finalize
//! repeatably into bytes or a cardinality.

mod accumulator;
mod bitstream;
mod estimator;
mod params;
mod serialization;
mod sketch;

pub use accumulator::Accumulator;
pub use params::Params;
pub use serialization::{MAX_BODY_BYTES, WireType};
pub use sketch::HllSketch;
