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

//! Version-1 wire format.
//!
//! Every frame opens with three header bytes:
//!
//! ```text
//! byte 0: version(4) | type(4)
//! byte 1: (regwidth - 1)(3) | log2m(5)
//! byte 2: sparseon(1) | expthresh(6)      (top bit unused)
//! ```
//!
//! Empty and undefined frames are the header alone. Explicit frames append
//! each token as 8 big-endian bytes. Dense frames append all registers as a
//! packed bitstream of `regwidth`-bit fields; sparse frames append one
//! `(index << regwidth) | value` chunk per non-zero register. Whether a
//! dense register bank serializes sparse or dense is decided by size (or by
//! the process-wide sparse threshold), and [`HllSketch::serialized_size`]
//! mirrors that decision exactly.

use crate::codec::{SketchBytes, SketchSlice};
use crate::config;
use crate::error::{Error, Result};
use crate::hll::Params;
use crate::hll::bitstream::{BitstreamReader, BitstreamWriter};
use crate::hll::sketch::{HllSketch, Repr, filled_registers};

pub(crate) const HEADER_BYTES: usize = 3;
const SCHEMA_VERSION: u8 = 1;

/// Upper bound on the decoded body of a frame: explicit token bytes, or
/// one byte per dense register.
pub const MAX_BODY_BYTES: usize = 128 * 1024;

/// Representation tag observed on the wire.
///
/// `Sparse` exists only here: decoding a sparse frame materializes a dense
/// sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Undefined = 0,
    Empty = 1,
    Explicit = 2,
    Sparse = 3,
    Dense = 4,
}

impl WireType {
    fn from_nibble(nibble: u8) -> Result<WireType> {
        match nibble {
            0 => Ok(WireType::Undefined),
            1 => Ok(WireType::Empty),
            2 => Ok(WireType::Explicit),
            3 => Ok(WireType::Sparse),
            4 => Ok(WireType::Dense),
            _ => Err(Error::invalid_data("unrecognized multiset type")
                .with_context("type", nibble)),
        }
    }
}

impl HllSketch {
    /// Serialize into the version-1 wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let version = config::output_version();
        let total = self.serialized_size();
        let mut bytes = SketchBytes::with_capacity(total);

        match &self.repr {
            Repr::Empty => write_header(&mut bytes, version, WireType::Empty, &self.params),
            Repr::Undefined => write_header(&mut bytes, version, WireType::Undefined, &self.params),
            Repr::Explicit(tokens) => {
                write_header(&mut bytes, version, WireType::Explicit, &self.params);
                for &token in tokens {
                    bytes.write_u64_be(token);
                }
            }
            Repr::Dense(registers) => {
                let regwidth = self.params.regwidth() as usize;
                if select_sparse(&self.params, filled_registers(registers)) {
                    write_header(&mut bytes, version, WireType::Sparse, &self.params);
                    let chunk_width = self.params.log2m() as usize + regwidth;
                    let mut writer = BitstreamWriter::new(total - HEADER_BYTES, chunk_width);
                    for (index, &register) in registers.iter().enumerate() {
                        if register != 0 {
                            writer.write((index as u64) << regwidth | register as u64);
                        }
                    }
                    bytes.write(&writer.into_bytes());
                } else {
                    write_header(&mut bytes, version, WireType::Dense, &self.params);
                    let mut writer = BitstreamWriter::new(total - HEADER_BYTES, regwidth);
                    for &register in registers {
                        writer.write(register as u64);
                    }
                    bytes.write(&writer.into_bytes());
                }
            }
        }

        bytes.into_bytes()
    }

    /// Exact byte count [`serialize`](Self::serialize) will produce,
    /// including the sparse-versus-dense decision.
    pub fn serialized_size(&self) -> usize {
        match &self.repr {
            Repr::Empty | Repr::Undefined => HEADER_BYTES,
            Repr::Explicit(tokens) => HEADER_BYTES + 8 * tokens.len(),
            Repr::Dense(registers) => {
                let regwidth = self.params.regwidth() as usize;
                let nfilled = filled_registers(registers);
                if select_sparse(&self.params, nfilled) {
                    let sparse_bits = nfilled * (self.params.log2m() as usize + regwidth);
                    HEADER_BYTES + (sparse_bits + 7) / 8
                } else {
                    let dense_bits = registers.len() * regwidth;
                    HEADER_BYTES + (dense_bits + 7) / 8
                }
            }
        }
    }

    /// Decode a version-1 frame.
    ///
    /// Returns the sketch along with the representation tag observed on the
    /// wire and the frame's schema version. Sparse frames come back as
    /// dense sketches.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData)
    /// for unknown versions or types, truncated or inconsistently sized
    /// frames, bodies over [`MAX_BODY_BYTES`], inconsistent sparse padding
    /// and explicit token lists that are not strictly ascending.
    pub fn deserialize(bytes: &[u8]) -> Result<(HllSketch, WireType, u8)> {
        let mut cursor = SketchSlice::new(bytes);

        let tag = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("version and type"))?;
        let version = tag >> 4;
        if version != SCHEMA_VERSION {
            return Err(
                Error::invalid_data("unknown schema version").with_context("version", version)
            );
        }
        let wire_type = WireType::from_nibble(tag & 0x0f)?;

        let mut header = [0u8; 2];
        cursor
            .read_exact(&mut header)
            .map_err(|_| Error::insufficient_data("parameter bytes"))?;
        let params = Params::from_header_bytes(header);

        let repr = match wire_type {
            WireType::Empty | WireType::Undefined => {
                if bytes.len() != HEADER_BYTES {
                    return Err(Error::invalid_data("inconsistently sized empty multiset")
                        .with_context("bytes", bytes.len()));
                }
                if wire_type == WireType::Empty {
                    Repr::Empty
                } else {
                    Repr::Undefined
                }
            }
            WireType::Explicit => {
                let body_len = bytes.len() - HEADER_BYTES;
                if body_len % 8 != 0 {
                    return Err(Error::invalid_data("inconsistently sized explicit multiset")
                        .with_context("bytes", body_len));
                }
                if body_len > MAX_BODY_BYTES {
                    return Err(Error::invalid_data("explicit multiset too large")
                        .with_context("bytes", body_len));
                }

                let count = body_len / 8;
                let mut tokens = Vec::with_capacity(count);
                for _ in 0..count {
                    let token = cursor
                        .read_u64_be()
                        .map_err(|_| Error::insufficient_data("explicit token"))?;
                    tokens.push(token);
                }

                for pair in tokens.windows(2) {
                    if pair[0] as i64 >= pair[1] as i64 {
                        return Err(Error::invalid_data(
                            "duplicate or descending explicit elements",
                        ));
                    }
                }

                Repr::Explicit(tokens)
            }
            WireType::Dense => {
                let regwidth = params.regwidth() as usize;
                let register_count = params.register_count();
                let expected = (regwidth * register_count + 7) / 8;
                let body = cursor.remaining();
                if body.len() != expected {
                    return Err(Error::invalid_data("inconsistently sized dense multiset")
                        .with_context("expected", expected)
                        .with_context("actual", body.len()));
                }
                if register_count > MAX_BODY_BYTES {
                    return Err(Error::invalid_data("dense multiset too large")
                        .with_context("registers", register_count));
                }

                let mut registers = vec![0u8; register_count];
                let mut reader = BitstreamReader::new(body, regwidth);
                for register in registers.iter_mut() {
                    *register = reader.read() as u8;
                }

                Repr::Dense(registers)
            }
            WireType::Sparse => {
                let regwidth = params.regwidth() as usize;
                let register_count = params.register_count();
                if register_count > MAX_BODY_BYTES {
                    return Err(Error::invalid_data("sparse multiset too large")
                        .with_context("registers", register_count));
                }

                // The chunk width always exceeds the sub-byte pad, so the
                // chunk count is implied by the body length.
                let body = cursor.remaining();
                let chunk_width = params.log2m() as usize + regwidth;
                let total_bits = body.len() * 8;
                let filled = total_bits / chunk_width;
                if total_bits - filled * chunk_width >= 8 {
                    return Err(Error::invalid_data("inconsistent padding in sparse multiset")
                        .with_context("bytes", body.len()));
                }

                let register_mask = (1u64 << regwidth) - 1;
                let mut registers = vec![0u8; register_count];
                let mut reader = BitstreamReader::new(body, chunk_width);
                for _ in 0..filled {
                    let chunk = reader.read();
                    let index = (chunk >> regwidth) as usize;
                    registers[index] = (chunk & register_mask) as u8;
                }

                Repr::Dense(registers)
            }
        };

        Ok((HllSketch::from_parts(params, repr), wire_type, version))
    }
}

fn write_header(bytes: &mut SketchBytes, version: u8, wire_type: WireType, params: &Params) {
    bytes.write_u8(version << 4 | wire_type as u8);
    bytes.write(&params.header_bytes());
}

/// Decide whether a dense register bank serializes as a sparse frame.
///
/// With the sparse threshold at its automatic setting the smaller encoding
/// wins; a fixed threshold compares the non-zero register count instead.
fn select_sparse(params: &Params, nfilled: usize) -> bool {
    if !params.sparseon() {
        return false;
    }

    let max_sparse = config::max_sparse();
    let sparse_bits = nfilled * (params.log2m() as usize + params.regwidth() as usize);
    let dense_bits = params.register_count() * params.regwidth() as usize;

    (max_sparse != -1 && nfilled <= max_sparse as usize)
        || (max_sparse == -1 && sparse_bits < dense_bits)
}
