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

//! Process-wide multiset settings.
//!
//! Three groups of settings steer operations that cannot carry them as
//! arguments: the default parameters absorbed when an aggregation
//! instantiates without explicit ones, the schema version written by the
//! serializer, and the sparse-encoding threshold. They are read at operation
//! boundaries, never stored in a sketch and never serialized.

use std::sync::atomic::{AtomicI32, AtomicI64, AtomicU8, Ordering};

use crate::error::{Error, Result};
use crate::hll::Params;

pub const DEFAULT_LOG2M: u8 = 11;
pub const DEFAULT_REGWIDTH: u8 = 5;
pub const DEFAULT_EXPTHRESH: i64 = -1;
pub const DEFAULT_SPARSEON: bool = true;

static DEFAULT_PARAM_LOG2M: AtomicI32 = AtomicI32::new(DEFAULT_LOG2M as i32);
static DEFAULT_PARAM_REGWIDTH: AtomicI32 = AtomicI32::new(DEFAULT_REGWIDTH as i32);
static DEFAULT_PARAM_EXPTHRESH: AtomicI64 = AtomicI64::new(DEFAULT_EXPTHRESH);
static DEFAULT_PARAM_SPARSEON: AtomicI32 = AtomicI32::new(DEFAULT_SPARSEON as i32);

static OUTPUT_VERSION: AtomicU8 = AtomicU8::new(1);
static MAX_SPARSE: AtomicI32 = AtomicI32::new(-1);

/// Replace the default parameters absorbed by parameterless construction
/// and by aggregations that see data before explicit parameters.
///
/// Returns the previous quadruple.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidParameter`](crate::error::ErrorKind::InvalidParameter)
/// when the quadruple fails the same validation as [`Params::new`].
pub fn set_defaults(
    log2m: u8,
    regwidth: u8,
    expthresh: i64,
    sparseon: bool,
) -> Result<(u8, u8, i64, bool)> {
    // Validate before any of the four slots change.
    Params::new(log2m, regwidth, expthresh, sparseon)?;

    let old_log2m = DEFAULT_PARAM_LOG2M.swap(log2m as i32, Ordering::Relaxed) as u8;
    let old_regwidth = DEFAULT_PARAM_REGWIDTH.swap(regwidth as i32, Ordering::Relaxed) as u8;
    let old_expthresh = DEFAULT_PARAM_EXPTHRESH.swap(expthresh, Ordering::Relaxed);
    let old_sparseon = DEFAULT_PARAM_SPARSEON.swap(sparseon as i32, Ordering::Relaxed) != 0;

    Ok((old_log2m, old_regwidth, old_expthresh, old_sparseon))
}

/// Set the schema version written by the serializer, returning the previous
/// one. Version 1 is the only version this crate produces.
pub fn set_output_version(version: u8) -> Result<u8> {
    if version != 1 {
        return Err(Error::invalid_data("output version must be 1").with_context("version", version));
    }
    Ok(OUTPUT_VERSION.swap(version, Ordering::Relaxed))
}

/// Set the sparse-encoding threshold, returning the previous one.
///
/// `-1` selects sparse whenever it is smaller than the dense encoding; any
/// other value selects sparse only when at most that many registers are
/// non-zero.
pub fn set_max_sparse(max_sparse: i32) -> Result<i32> {
    if max_sparse < -1 {
        return Err(Error::invalid_data("sparse threshold must be in range [-1,MAXINT]")
            .with_context("max_sparse", max_sparse));
    }
    Ok(MAX_SPARSE.swap(max_sparse, Ordering::Relaxed))
}

pub(crate) fn default_log2m() -> u8 {
    DEFAULT_PARAM_LOG2M.load(Ordering::Relaxed) as u8
}

pub(crate) fn default_regwidth() -> u8 {
    DEFAULT_PARAM_REGWIDTH.load(Ordering::Relaxed) as u8
}

pub(crate) fn default_expthresh() -> i64 {
    DEFAULT_PARAM_EXPTHRESH.load(Ordering::Relaxed)
}

pub(crate) fn default_sparseon() -> bool {
    DEFAULT_PARAM_SPARSEON.load(Ordering::Relaxed) != 0
}

pub(crate) fn output_version() -> u8 {
    OUTPUT_VERSION.load(Ordering::Relaxed)
}

pub(crate) fn max_sparse() -> i32 {
    MAX_SPARSE.load(Ordering::Relaxed)
}
