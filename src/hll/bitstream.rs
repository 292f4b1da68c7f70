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

//! Big-endian packed bitstream cursors.
//!
//! Dense and sparse bodies are sequences of fixed-width fields packed
//! MSB-first with no alignment. Both cursors operate on a 64-bit window
//! gathered and scattered one byte at a time, clamped to the buffer, so the
//! trailing bytes of a frame need no padding. Field widths are limited to
//! 56 bits, which keeps `width + used` within the window; the widest field
//! either wire mode produces is a sparse chunk of `log2m + regwidth` bits.

/// Reads fixed-width fields from a packed buffer.
pub(crate) struct BitstreamReader<'a> {
    buf: &'a [u8],
    width: usize,
    mask: u64,
    byte: usize,
    used: usize,
}

impl<'a> BitstreamReader<'a> {
    pub fn new(buf: &'a [u8], width: usize) -> Self {
        debug_assert!(width <= 56);
        Self {
            buf,
            width,
            mask: if width == 0 { 0 } else { (1u64 << width) - 1 },
            byte: 0,
            used: 0,
        }
    }

    /// Read the next field.
    ///
    /// Reading past the written fields yields the zero pad bits.
    pub fn read(&mut self) -> u64 {
        if self.width == 0 {
            return 0;
        }

        let mut window = 0u64;
        for ii in 0..8 {
            let byte = self.buf.get(self.byte + ii).copied().unwrap_or(0);
            window = (window << 8) | byte as u64;
        }

        let val = (window >> (64 - self.width - self.used)) & self.mask;

        self.used += self.width;
        while self.used >= 8 {
            self.used -= 8;
            self.byte += 1;
        }

        val
    }
}

/// Packs fixed-width fields into a zeroed buffer of known size.
///
/// The writer OR-accumulates into its window, which is why the buffer must
/// start zeroed.
pub(crate) struct BitstreamWriter {
    buf: Vec<u8>,
    width: usize,
    byte: usize,
    used: usize,
}

impl BitstreamWriter {
    pub fn new(size: usize, width: usize) -> Self {
        debug_assert!(width <= 56);
        Self {
            buf: vec![0u8; size],
            width,
            byte: 0,
            used: 0,
        }
    }

    pub fn write(&mut self, val: u64) {
        if self.width == 0 {
            return;
        }

        let mut window = 0u64;
        for ii in 0..8 {
            let byte = self.buf.get(self.byte + ii).copied().unwrap_or(0);
            window = (window << 8) | byte as u64;
        }

        window |= val << (64 - self.width - self.used);

        for ii in 0..8 {
            if let Some(slot) = self.buf.get_mut(self.byte + ii) {
                *slot = (window >> (56 - ii * 8)) as u8;
            }
        }

        self.used += self.width;
        while self.used >= 8 {
            self.used -= 8;
            self.byte += 1;
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
