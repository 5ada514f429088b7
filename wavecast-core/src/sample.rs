// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `sample` module defines the complex baseband sample type and its wire
//! representation.

/// One complex baseband sample: the in-phase (I) and quadrature (Q) components of
/// the signal at a single sampling instant.
///
/// Components are stored at full 16-bit width. Streams sourced from an 8-bit
/// front-end keep their values in the 8-bit range until they are promoted (see
/// [`promote_to_16_bits`]).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct IqSample {
    pub i: i16,
    pub q: i16,
}

impl IqSample {
    pub fn new(i: i16, q: i16) -> IqSample {
        IqSample { i, q }
    }
}

/// The storage format of a sample component on the wire and at the device boundary.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SampleSize {
    /// Bytes per sample component. Either 1 or 2.
    pub bytes: u8,
    /// Effective (significant) bits per sample component, in 8..=16.
    pub bits: u8,
}

impl SampleSize {
    pub fn new(bytes: u8, bits: u8) -> SampleSize {
        assert!(bytes == 1 || bytes == 2, "sample component must be 1 or 2 bytes");
        assert!(bits >= 8 && bits <= 16, "effective bits must be in 8..=16");
        SampleSize { bytes, bits }
    }

    /// The size of one IQ pair in bytes.
    pub fn bytes_per_pair(&self) -> usize {
        2 * usize::from(self.bytes)
    }

    /// The storage format after a halfband cascade of `log2_decim` stages.
    ///
    /// Any decimation promotes the component width to 16 bits and never demotes it
    /// again for the stream. Each stage grows the effective bit depth by one, up to
    /// the 16-bit ceiling.
    pub fn after_decimation(&self, log2_decim: u32) -> SampleSize {
        if log2_decim == 0 {
            *self
        }
        else {
            SampleSize::new(2, u8::min(16, self.bits + log2_decim as u8))
        }
    }
}

/// Shifts 8-bit range samples up to full 16-bit range ahead of filtering.
pub fn promote_to_16_bits(samples: &mut [IqSample]) {
    for s in samples.iter_mut() {
        s.i <<= 8;
        s.q <<= 8;
    }
}

/// Returns a run of `len` silence samples (I = Q = 0).
pub fn silence(len: usize) -> Vec<IqSample> {
    vec![IqSample::default(); len]
}

/// Serializes samples into `dst` in little-endian I-then-Q order.
///
/// `dst` must hold exactly `samples.len()` pairs at the given component width. An
/// 8-bit write truncates to the low byte; it is only used for streams whose values
/// never left the 8-bit range.
pub fn write_samples(samples: &[IqSample], bytes: u8, dst: &mut [u8]) {
    assert_eq!(dst.len(), samples.len() * 2 * usize::from(bytes));

    match bytes {
        1 => {
            for (s, out) in samples.iter().zip(dst.chunks_exact_mut(2)) {
                out[0] = (s.i as i8) as u8;
                out[1] = (s.q as i8) as u8;
            }
        }
        2 => {
            for (s, out) in samples.iter().zip(dst.chunks_exact_mut(4)) {
                out[0..2].copy_from_slice(&s.i.to_le_bytes());
                out[2..4].copy_from_slice(&s.q.to_le_bytes());
            }
        }
        _ => unreachable!("sample component must be 1 or 2 bytes"),
    }
}

/// Deserializes little-endian I-then-Q pairs from `src`.
///
/// Trailing bytes that do not form a whole pair are ignored.
pub fn read_samples(src: &[u8], bytes: u8, dst: &mut Vec<IqSample>) {
    match bytes {
        1 => {
            for pair in src.chunks_exact(2) {
                dst.push(IqSample::new(i16::from(pair[0] as i8), i16::from(pair[1] as i8)));
            }
        }
        2 => {
            for pair in src.chunks_exact(4) {
                dst.push(IqSample::new(
                    i16::from_le_bytes([pair[0], pair[1]]),
                    i16::from_le_bytes([pair[2], pair[3]]),
                ));
            }
        }
        _ => unreachable!("sample component must be 1 or 2 bytes"),
    }
}
