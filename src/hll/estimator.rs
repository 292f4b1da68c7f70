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

//! Cardinality estimation over a dense register bank.
//!
//! The raw HyperLogLog estimator `alpha(m) * m^2 / sum(2^-r)` is corrected
//! at both ends of its range: while many registers are still zero the
//! linear-counting estimate `m * ln(m / zeros)` is used instead, and close
//! to the top of the register scale the estimate is rescued with
//! `-2^L * ln(1 - E / 2^L)`, where `L` is the number of hash bits the
//! registers can account for.

use crate::error::{Error, Result};
use crate::hll::Params;

/// Bias-corrected `alpha(m) * m^2` for the raw estimator.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData)
/// for register counts of 8 or fewer, which the constants do not cover.
fn alpha_m_squared(register_count: usize) -> Result<f64> {
    if register_count <= 8 {
        return Err(Error::invalid_data("number of registers too small")
            .with_context("registers", register_count));
    }

    let m = register_count as f64;
    let alpha = match register_count {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / m),
    };

    Ok(alpha * m * m)
}

/// Estimate the cardinality of a dense register bank.
pub(crate) fn estimate(params: &Params, registers: &[u8]) -> Result<f64> {
    let register_count = registers.len();

    let mut sum = 0.0;
    let mut zero_count = 0usize;
    for &rval in registers {
        sum += inv_pow2(rval);
        if rval == 0 {
            zero_count += 1;
        }
    }

    let estimator = alpha_m_squared(register_count)? / sum;

    let m = register_count as f64;
    if zero_count != 0 && estimator < 5.0 * m / 2.0 {
        return Ok(m * (m / zero_count as f64).ln());
    }

    // The registers can account for 2^L hash outcomes, where L is the
    // maximum encodable run length minus one plus the index bits.
    let pw_bits = params.max_register_value() as u64 - 1;
    let total_bits = pw_bits + params.log2m() as u64;
    let two_to_l = (total_bits as f64).exp2();
    let large_estimator_cutoff = two_to_l / 30.0;

    if estimator <= large_estimator_cutoff {
        Ok(estimator)
    } else {
        Ok(-two_to_l * (1.0 - estimator / two_to_l).ln())
    }
}

fn inv_pow2(value: u8) -> f64 {
    if value < 64 {
        1.0 / (1u64 << value) as f64
    } else {
        f64::exp2(-(value as f64))
    }
}
