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

//! Aggregation state for reducers.
//!
//! An accumulator starts without parameters: they are not known until the
//! first observation arrives, either as a token (the caller supplies the
//! parameters to absorb, usually [`Params::from_defaults`]) or as a
//! serialized sketch (whose own parameters are adopted). Every later
//! observation must be compatible with the absorbed parameters.
//!
//! Finalizers borrow the state rather than consuming it. Hosts re-run final
//! functions against the same state, so finalizing must be repeatable and
//! must not tear the state down; dropping the accumulator is the owner's
//! job.

use crate::error::Result;
use crate::hll::sketch::HllSketch;
use crate::hll::Params;

enum State {
    Uninitialized,
    Materialized(HllSketch),
}

/// Reduction state folding tokens and serialized sketches into one sketch.
pub struct Accumulator {
    state: State,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    /// Create an accumulator with no parameters yet.
    pub fn new() -> Accumulator {
        Accumulator {
            state: State::Uninitialized,
        }
    }

    /// Fold one token, absorbing `params` if this is the first observation.
    pub fn add(&mut self, token: u64, params: &Params) {
        if let State::Uninitialized = self.state {
            self.state = State::Materialized(HllSketch::empty(*params));
        }
        if let State::Materialized(sketch) = &mut self.state {
            sketch.add(token);
        }
    }

    /// Fold a serialized sketch, adopting its parameters if this is the
    /// first observation.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData)
    /// when the frame does not decode or its parameters are incompatible
    /// with the absorbed ones.
    pub fn fold_serialized(&mut self, bytes: &[u8]) -> Result<()> {
        let (other, _, _) = HllSketch::deserialize(bytes)?;

        match &mut self.state {
            State::Uninitialized => {
                let mut sketch = HllSketch::empty(*other.params());
                sketch.union(&other)?;
                self.state = State::Materialized(sketch);
                Ok(())
            }
            State::Materialized(sketch) => {
                sketch.params().ensure_compatible(other.params())?;
                sketch.union(&other)
            }
        }
    }

    /// Serialize the accumulated sketch, or `None` before the first
    /// observation.
    pub fn finalize_serialized(&self) -> Option<Vec<u8>> {
        match &self.state {
            State::Uninitialized => None,
            State::Materialized(sketch) => Some(sketch.serialize()),
        }
    }

    /// Cardinality of the accumulated sketch. `None` before the first
    /// observation, and for an accumulated undefined sketch.
    pub fn finalize_cardinality(&self) -> Result<Option<f64>> {
        match &self.state {
            State::Uninitialized => Ok(None),
            State::Materialized(sketch) => sketch.cardinality(),
        }
    }

    /// [`finalize_cardinality`](Self::finalize_cardinality) rounded down.
    pub fn finalize_floor_cardinality(&self) -> Result<Option<i64>> {
        let cardinality = self.finalize_cardinality()?;
        Ok(cardinality.map(|value| value.floor() as i64))
    }

    /// [`finalize_cardinality`](Self::finalize_cardinality) rounded up.
    pub fn finalize_ceil_cardinality(&self) -> Result<Option<i64>> {
        let cardinality = self.finalize_cardinality()?;
        Ok(cardinality.map(|value| value.ceil() as i64))
    }
}
