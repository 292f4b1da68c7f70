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

//! The sketch value: representations, insertion and union.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};
use crate::hll::Params;
use crate::hll::estimator;

/// In-memory representation of a sketch.
///
/// A sketch only ever moves forward through `Empty -> Explicit -> Dense`;
/// `Undefined` is produced by decoding an undefined frame or by unioning
/// with one, and absorbs every further operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Repr {
    /// No tokens observed yet.
    Empty,
    /// Exact list of tokens, strictly ascending under signed comparison.
    Explicit(Vec<u64>),
    /// One register per bucket, each holding the largest observed
    /// trailing-zero run length plus one.
    Dense(Vec<u8>),
    /// Invalid multiset; absorbing for union, cardinality yields no result.
    Undefined,
}

/// A HyperLogLog multiset.
///
/// Tokens are added with [`add`](Self::add); sketches with equal parameters
/// combine with [`union`](Self::union). The representation starts [`Empty`],
/// holds small inputs exactly and promotes itself to a dense register bank
/// when the exact list outgrows [`Params::explicit_capacity`].
///
/// [`Empty`]: Repr::Empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HllSketch {
    pub(crate) params: Params,
    pub(crate) repr: Repr,
}

impl HllSketch {
    /// Create an empty sketch with the given parameters.
    pub fn empty(params: Params) -> HllSketch {
        HllSketch {
            params,
            repr: Repr::Empty,
        }
    }

    /// Create an empty sketch with the process-wide default parameters.
    pub fn empty_from_defaults() -> HllSketch {
        Self::empty(Params::from_defaults())
    }

    pub(crate) fn from_parts(params: Params, repr: Repr) -> HllSketch {
        HllSketch { params, repr }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Add an element token.
    ///
    /// This may promote the representation; it never demotes it.
    pub fn add(&mut self, token: u64) {
        match &mut self.repr {
            Repr::Undefined => {}
            Repr::Empty => {
                if self.params.explicit_capacity() == 0 {
                    let mut registers = vec![0u8; self.params.register_count()];
                    dense_add(&self.params, &mut registers, token);
                    self.repr = Repr::Dense(registers);
                } else {
                    self.repr = Repr::Explicit(vec![token]);
                }
            }
            Repr::Explicit(tokens) => {
                let position = match tokens.binary_search_by(|probe| token_cmp(*probe, token)) {
                    Ok(_) => return,
                    Err(position) => position,
                };
                if tokens.len() < self.params.explicit_capacity() {
                    tokens.insert(position, token);
                    return;
                }
                self.promote_to_dense();
                if let Repr::Dense(registers) = &mut self.repr {
                    dense_add(&self.params, registers, token);
                }
            }
            Repr::Dense(registers) => dense_add(&self.params, registers, token),
        }
    }

    /// Union `other` into `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData)
    /// when the parameters differ, or when two dense register banks disagree
    /// on length.
    pub fn union(&mut self, other: &HllSketch) -> Result<()> {
        self.params.ensure_compatible(&other.params)?;

        if matches!(self.repr, Repr::Undefined) || matches!(other.repr, Repr::Undefined) {
            self.repr = Repr::Undefined;
            return Ok(());
        }
        if matches!(other.repr, Repr::Empty) {
            return Ok(());
        }
        if matches!(self.repr, Repr::Empty) {
            self.repr = other.repr.clone();
            return Ok(());
        }

        match &other.repr {
            Repr::Explicit(other_tokens) => match &mut self.repr {
                Repr::Explicit(_) => self.explicit_union(other_tokens),
                Repr::Dense(registers) => {
                    for &token in other_tokens {
                        dense_add(&self.params, registers, token);
                    }
                }
                _ => unreachable!("empty and undefined handled above"),
            },
            Repr::Dense(other_registers) => match &mut self.repr {
                Repr::Explicit(tokens) => {
                    // Fold our exact tokens into a copy of the dense side.
                    let mut registers = other_registers.clone();
                    for &token in tokens.iter() {
                        dense_add(&self.params, &mut registers, token);
                    }
                    self.repr = Repr::Dense(registers);
                }
                Repr::Dense(registers) => {
                    if registers.len() != other_registers.len() {
                        return Err(Error::invalid_data(
                            "union of differently length dense vectors not supported",
                        )
                        .with_context("dest", registers.len())
                        .with_context("source", other_registers.len()));
                    }
                    for (register, &other_register) in registers.iter_mut().zip(other_registers) {
                        if *register < other_register {
                            *register = other_register;
                        }
                    }
                }
                _ => unreachable!("empty and undefined handled above"),
            },
            _ => unreachable!("empty and undefined handled above"),
        }

        Ok(())
    }

    /// Estimate the number of distinct tokens.
    ///
    /// Empty sketches report zero and explicit sketches report their exact
    /// list length. Undefined sketches carry no result, which hosts map to
    /// a null.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData)
    /// for dense sketches with 8 or fewer registers.
    pub fn cardinality(&self) -> Result<Option<f64>> {
        match &self.repr {
            Repr::Empty => Ok(Some(0.0)),
            Repr::Explicit(tokens) => Ok(Some(tokens.len() as f64)),
            Repr::Dense(registers) => estimator::estimate(&self.params, registers).map(Some),
            Repr::Undefined => Ok(None),
        }
    }

    /// Fold tokens of `other_tokens` into an explicit representation,
    /// promoting to dense on overflow.
    fn explicit_union(&mut self, other_tokens: &[u64]) {
        let capacity = self.params.explicit_capacity();
        let original_len = match &self.repr {
            Repr::Explicit(tokens) => tokens.len(),
            _ => return,
        };

        for &token in other_tokens {
            if let Repr::Explicit(tokens) = &mut self.repr {
                // Dedupe against the original sorted prefix; the appended
                // region cannot repeat because the source list has no
                // duplicates.
                if tokens[..original_len]
                    .binary_search_by(|probe| token_cmp(*probe, token))
                    .is_ok()
                {
                    continue;
                }
                if tokens.len() < capacity {
                    tokens.push(token);
                    continue;
                }
                self.promote_to_dense();
            }
            if let Repr::Dense(registers) = &mut self.repr {
                dense_add(&self.params, registers, token);
            }
        }

        if let Repr::Explicit(tokens) = &mut self.repr {
            tokens.sort_unstable_by(|a, b| token_cmp(*a, *b));
        }
    }

    /// Replace an explicit representation with the dense registers covering
    /// the same tokens.
    fn promote_to_dense(&mut self) {
        let tokens = match std::mem::replace(&mut self.repr, Repr::Empty) {
            Repr::Explicit(tokens) => tokens,
            repr => {
                self.repr = repr;
                return;
            }
        };

        let mut registers = vec![0u8; self.params.register_count()];
        for &token in &tokens {
            dense_add(&self.params, &mut registers, token);
        }
        self.repr = Repr::Dense(registers);
    }
}

/// Apply the dense insertion rule: the low `log2m` bits select the
/// register, the trailing-zero run of the remaining bits (plus one, clamped
/// to the register range) is max-merged into it.
fn dense_add(params: &Params, registers: &mut [u8], token: u64) {
    let index = (token & (params.register_count() as u64 - 1)) as usize;
    let window = token >> params.log2m();
    let run_length = if window == 0 {
        0
    } else {
        window.trailing_zeros() as u64 + 1
    };
    let value = run_length.min(params.max_register_value() as u64) as u8;
    if registers[index] < value {
        registers[index] = value;
    }
}

// Signed comparison for compatibility with encoded explicit sketches from
// other implementations.
fn token_cmp(a: u64, b: u64) -> Ordering {
    (a as i64).cmp(&(b as i64))
}

/// Number of non-zero registers.
pub(crate) fn filled_registers(registers: &[u8]) -> usize {
    registers.iter().filter(|&&register| register != 0).count()
}

impl fmt::Display for HllSketch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nregs = self.params.register_count();
        let nbits = self.params.regwidth();
        let sparseon = self.params.sparseon() as u8;
        let expthresh = match self.params.expthresh() {
            -1 => format!("-1({})", self.params.explicit_capacity()),
            value => value.to_string(),
        };

        match &self.repr {
            Repr::Empty => write!(
                f,
                "EMPTY, nregs={nregs}, nbits={nbits}, expthresh={expthresh}, sparseon={sparseon}"
            ),
            Repr::Undefined => write!(
                f,
                "UNDEFINED, nregs={nregs}, nbits={nbits}, expthresh={expthresh}, sparseon={sparseon}"
            ),
            Repr::Explicit(tokens) => {
                write!(
                    f,
                    "EXPLICIT, {} elements, nregs={nregs}, nbits={nbits}, \
                     expthresh={expthresh}, sparseon={sparseon}:",
                    tokens.len()
                )?;
                for (index, &token) in tokens.iter().enumerate() {
                    write!(f, "\n{index}: {:20}", token as i64)?;
                }
                Ok(())
            }
            Repr::Dense(registers) => {
                write!(
                    f,
                    "DENSE, {} filled, nregs={nregs}, nbits={nbits}, \
                     expthresh={expthresh}, sparseon={sparseon}:",
                    filled_registers(registers)
                )?;
                for (row, chunk) in registers.chunks_exact(32).enumerate() {
                    write!(f, "\n{:4}: ", row * 32)?;
                    for register in chunk {
                        write!(f, "{register:2} ")?;
                    }
                }
                Ok(())
            }
        }
    }
}
