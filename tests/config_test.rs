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

use hll_multiset::config;
use hll_multiset::error::ErrorKind;
use hll_multiset::hll::{HllSketch, Params, WireType};

// The settings are process-wide, so everything that touches them runs in
// this one test; the other suites are separate test binaries and never see
// these mutations.
#[test]
fn test_process_wide_settings() {
    // Fresh process: the documented defaults are in place and absorbed by
    // parameterless construction.
    let defaults = Params::from_defaults();
    assert_eq!(defaults.log2m(), config::DEFAULT_LOG2M);
    assert_eq!(defaults.regwidth(), config::DEFAULT_REGWIDTH);
    assert_eq!(defaults.expthresh(), config::DEFAULT_EXPTHRESH);
    assert_eq!(defaults.sparseon(), config::DEFAULT_SPARSEON);
    assert_eq!(HllSketch::empty_from_defaults().serialize(), [0x11, 0x8b, 0x7f]);

    // set_defaults returns the previous quadruple and redirects absorption.
    let previous = config::set_defaults(12, 6, 128, false).unwrap();
    assert_eq!(previous, (11, 5, -1, true));
    let absorbed = Params::from_defaults();
    assert_eq!(absorbed.log2m(), 12);
    assert_eq!(absorbed.regwidth(), 6);
    assert_eq!(absorbed.expthresh(), 128);
    assert!(!absorbed.sparseon());

    // Invalid quadruples are rejected without changing anything.
    let err = config::set_defaults(12, 6, 100, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert_eq!(Params::from_defaults().expthresh(), 128);

    let restored = config::set_defaults(11, 5, -1, true).unwrap();
    assert_eq!(restored, (12, 6, 128, false));

    // Version 1 is the only writable schema version.
    assert_eq!(config::set_output_version(1).unwrap(), 1);
    let err = config::set_output_version(2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    // A sketch with one filled register encodes sparse under the automatic
    // threshold.
    let params = Params::new(11, 5, 0, true).unwrap();
    let mut sketch = HllSketch::empty(params);
    sketch.add(1u64 << 11);
    let (_, wire_type, _) = HllSketch::deserialize(&sketch.serialize()).unwrap();
    assert_eq!(wire_type, WireType::Sparse);

    // A fixed threshold of zero filled registers forces dense frames, and
    // the size function tracks the decision.
    assert_eq!(config::set_max_sparse(0).unwrap(), -1);
    assert_eq!(sketch.serialized_size(), 3 + (2048 * 5 + 7) / 8);
    let (_, wire_type, _) = HllSketch::deserialize(&sketch.serialize()).unwrap();
    assert_eq!(wire_type, WireType::Dense);

    // A threshold at or above the filled count selects sparse again.
    assert_eq!(config::set_max_sparse(1).unwrap(), 0);
    assert_eq!(sketch.serialized_size(), 5);
    let (_, wire_type, _) = HllSketch::deserialize(&sketch.serialize()).unwrap();
    assert_eq!(wire_type, WireType::Sparse);

    let err = config::set_max_sparse(-2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    assert_eq!(config::set_max_sparse(-1).unwrap(), 1);
}
