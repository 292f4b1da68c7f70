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

//! Sketch parameters and their packed descriptor encoding.

use crate::config;
use crate::error::{Error, Result};

const LOG2M_BITS: u32 = 5;
const REGWIDTH_BITS: u32 = 3;
const EXPTHRESH_BITS: u32 = 6;
const SPARSEON_BITS: u32 = 1;
const DESCRIPTOR_BITS: u32 = 15;

const fn max_bitval(nbits: u32) -> i64 {
    (1 << nbits) - 1
}

/// The immutable parameter quadruple of a sketch.
///
/// Parameters are fixed at construction and define union compatibility: two
/// sketches can be unioned only when all four fields are equal.
///
/// - `log2m`: log2 of the register count, in `0..=31`.
/// - `regwidth`: bits per register, in `0..=7`.
/// - `expthresh`: explicit-mode capacity. `-1` auto-sizes the explicit list
///   to the bytes of the dense register bank, `0` disables explicit mode,
///   and any power of two up to `2^32` is a fixed capacity.
/// - `sparseon`: whether the serializer may choose the sparse encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    log2m: u8,
    regwidth: u8,
    expthresh: i64,
    sparseon: bool,
}

impl Params {
    /// Create a validated parameter quadruple.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidParameter`](crate::error::ErrorKind::InvalidParameter)
    /// when a field is out of range or `expthresh` is positive but not a
    /// power of two.
    pub fn new(log2m: u8, regwidth: u8, expthresh: i64, sparseon: bool) -> Result<Params> {
        if log2m as i64 > max_bitval(LOG2M_BITS) {
            return Err(Error::invalid_parameter("log2m modifier must be between 0 and 31")
                .with_context("log2m", log2m));
        }

        if regwidth as i64 > max_bitval(REGWIDTH_BITS) {
            return Err(Error::invalid_parameter("regwidth modifier must be between 0 and 7")
                .with_context("regwidth", regwidth));
        }

        if !(-1..=1 << 32).contains(&expthresh) {
            return Err(Error::invalid_parameter("expthresh modifier must be between -1 and 2^32")
                .with_context("expthresh", expthresh));
        }

        if expthresh > 0 && expthresh.count_ones() != 1 {
            return Err(Error::invalid_parameter("expthresh modifier must be power of 2")
                .with_context("expthresh", expthresh));
        }

        Ok(Params {
            log2m,
            regwidth,
            expthresh,
            sparseon,
        })
    }

    /// Create parameters from the process-wide defaults.
    ///
    /// The defaults were validated when they were set, so this cannot fail.
    pub fn from_defaults() -> Params {
        Params {
            log2m: config::default_log2m(),
            regwidth: config::default_regwidth(),
            expthresh: config::default_expthresh(),
            sparseon: config::default_sparseon(),
        }
    }

    pub fn log2m(&self) -> u8 {
        self.log2m
    }

    pub fn regwidth(&self) -> u8 {
        self.regwidth
    }

    pub fn expthresh(&self) -> i64 {
        self.expthresh
    }

    pub fn sparseon(&self) -> bool {
        self.sparseon
    }

    /// Number of registers in the dense representation.
    pub fn register_count(&self) -> usize {
        1usize << self.log2m
    }

    /// Largest value a register can hold.
    pub fn max_register_value(&self) -> u8 {
        ((1u32 << self.regwidth) - 1) as u8
    }

    /// Effective capacity of the explicit representation.
    ///
    /// For `expthresh = -1` this is the largest explicit list that fits in
    /// the same bytes as the dense register bank.
    pub fn explicit_capacity(&self) -> usize {
        if self.expthresh != -1 {
            return self.expthresh as usize;
        }
        let dense_bytes = (self.regwidth as usize * self.register_count() + 7) / 8;
        dense_bytes / 8
    }

    /// Fail unless `other` describes a union-compatible sketch.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData)
    /// naming the first mismatching field.
    pub fn ensure_compatible(&self, other: &Params) -> Result<()> {
        if self.regwidth != other.regwidth {
            return Err(Error::invalid_data("register width does not match")
                .with_context("source", other.regwidth)
                .with_context("dest", self.regwidth));
        }

        if self.log2m != other.log2m {
            return Err(Error::invalid_data("register count does not match")
                .with_context("source", other.register_count())
                .with_context("dest", self.register_count()));
        }

        if self.expthresh != other.expthresh {
            return Err(Error::invalid_data("explicit threshold does not match")
                .with_context("source", other.expthresh)
                .with_context("dest", self.expthresh));
        }

        if self.sparseon != other.sparseon {
            return Err(Error::invalid_data("sparse enable does not match")
                .with_context("source", other.sparseon)
                .with_context("dest", self.sparseon));
        }

        Ok(())
    }

    /// Pack into the 15-bit descriptor carried by hosts out-of-band:
    /// `log2m(5) | regwidth(3) | expthresh(6) | sparseon(1)`, high to low.
    pub fn descriptor(&self) -> i32 {
        ((self.log2m as i32) << (DESCRIPTOR_BITS - LOG2M_BITS))
            | ((self.regwidth as i32) << (DESCRIPTOR_BITS - LOG2M_BITS - REGWIDTH_BITS))
            | ((encode_expthresh(self.expthresh) as i32)
                << (DESCRIPTOR_BITS - LOG2M_BITS - REGWIDTH_BITS - EXPTHRESH_BITS))
            | ((self.sparseon as i32)
                << (DESCRIPTOR_BITS - LOG2M_BITS - REGWIDTH_BITS - EXPTHRESH_BITS - SPARSEON_BITS))
    }

    /// Unpack a 15-bit descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidParameter`](crate::error::ErrorKind::InvalidParameter)
    /// when bits outside the descriptor are set.
    pub fn from_descriptor(descriptor: i32) -> Result<Params> {
        if !(0..1 << DESCRIPTOR_BITS).contains(&descriptor) {
            return Err(Error::invalid_parameter("descriptor does not fit in 15 bits")
                .with_context("descriptor", descriptor));
        }

        let log2m = (descriptor >> (DESCRIPTOR_BITS - LOG2M_BITS)) & max_bitval(LOG2M_BITS) as i32;
        let regwidth = (descriptor >> (DESCRIPTOR_BITS - LOG2M_BITS - REGWIDTH_BITS))
            & max_bitval(REGWIDTH_BITS) as i32;
        let expthresh = (descriptor
            >> (DESCRIPTOR_BITS - LOG2M_BITS - REGWIDTH_BITS - EXPTHRESH_BITS))
            & max_bitval(EXPTHRESH_BITS) as i32;
        let sparseon = (descriptor
            >> (DESCRIPTOR_BITS - LOG2M_BITS - REGWIDTH_BITS - EXPTHRESH_BITS - SPARSEON_BITS))
            & max_bitval(SPARSEON_BITS) as i32;

        Ok(Params {
            log2m: log2m as u8,
            regwidth: regwidth as u8,
            expthresh: decode_expthresh(expthresh as u8),
            sparseon: sparseon != 0,
        })
    }

    /// The two parameter bytes of the wire header.
    pub(crate) fn header_bytes(&self) -> [u8; 2] {
        [
            (self.regwidth.wrapping_sub(1) & 0x7) << 5 | self.log2m,
            (self.sparseon as u8) << 6 | encode_expthresh(self.expthresh),
        ]
    }

    /// Reconstruct parameters from the two wire header bytes.
    ///
    /// Mirrors the reference decoder: no range validation, and the register
    /// width comes back in `1..=8` because the wire stores `regwidth - 1`.
    pub(crate) fn from_header_bytes(bytes: [u8; 2]) -> Params {
        Params {
            regwidth: (bytes[0] >> 5) + 1,
            log2m: bytes[0] & 0x1f,
            expthresh: decode_expthresh(bytes[1] & 0x3f),
            sparseon: (bytes[1] >> 6) & 0x1 != 0,
        }
    }
}

/// Encode an expthresh for the descriptor or wire header: `-1` maps to 63,
/// `0` to 0 and `2^k` to `k + 1`.
fn encode_expthresh(expthresh: i64) -> u8 {
    if expthresh == -1 {
        63
    } else if expthresh == 0 {
        0
    } else {
        integer_log2(expthresh) + 1
    }
}

fn decode_expthresh(encoded: u8) -> i64 {
    if encoded == 63 {
        -1
    } else if encoded == 0 {
        0
    } else {
        1 << (encoded - 1)
    }
}

fn integer_log2(val: i64) -> u8 {
    debug_assert!(val > 0);
    (63 - val.leading_zeros()) as u8
}
