// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::mem;

use crate::sample::IqSample;

use super::kernel;
use super::MAX_LOG2_FACTOR;

/// Rounds and rescales a Q16 accumulator, doubled for zero-stuffing gain
/// compensation, to a 16-bit component.
#[inline(always)]
fn quantize_x2(acc: i64) -> i16 {
    (((acc << 1) + kernel::KERNEL_ROUND) >> kernel::KERNEL_SCALE_BITS)
        .clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

/// One halfband interpolation stage: upsample by two through zero-stuffing and
/// filter with the halfband kernel scaled by two.
///
/// In polyphase form the zero-stuffed convolution splits per output phase: one
/// phase is the symmetric kernel arm over the input history, the other collapses
/// to the centre tap alone, a pure delay. Two output samples are produced per
/// input sample.
struct HalfbandStage {
    line_i: Vec<i32>,
    line_q: Vec<i32>,
    pos: usize,
}

impl HalfbandStage {
    fn new() -> HalfbandStage {
        let len = kernel::wing_taps().len();

        HalfbandStage { line_i: vec![0; len], line_q: vec![0; len], pos: 0 }
    }

    fn process_into(&mut self, input: &[IqSample], output: &mut Vec<IqSample>) {
        let wing = kernel::wing_taps();
        let len = wing.len();
        let centre = i64::from(kernel::centre_tap());

        // The delay-arm output aligns with the middle of the kernel arm's span.
        let delay = (len - 1) / 2;

        for &s in input {
            self.line_i[self.pos] = i32::from(s.i);
            self.line_q[self.pos] = i32::from(s.q);

            let mut acc_i = 0i64;
            let mut acc_q = 0i64;

            for (j, &tap) in wing.iter().enumerate() {
                let idx = (self.pos + len - j) % len;
                acc_i += i64::from(tap) * i64::from(self.line_i[idx]);
                acc_q += i64::from(tap) * i64::from(self.line_q[idx]);
            }

            output.push(IqSample::new(quantize_x2(acc_i), quantize_x2(acc_q)));

            let idx = (self.pos + len - delay) % len;
            output.push(IqSample::new(
                quantize_x2(centre * i64::from(self.line_i[idx])),
                quantize_x2(centre * i64::from(self.line_q[idx])),
            ));

            self.pos = (self.pos + 1) % len;
        }
    }

    fn reset(&mut self) {
        self.line_i.fill(0);
        self.line_q.fill(0);
        self.pos = 0;
    }
}

/// A power-of-two interpolator: one halfband upsampling stage per unit of the
/// log2 factor. The transmit direction is always centred; there is no band
/// placement translator.
///
/// A factor of zero passes samples through untouched.
pub struct Interpolator {
    stages: Vec<HalfbandStage>,
    work: Vec<IqSample>,
    swap: Vec<IqSample>,
}

impl Interpolator {
    pub fn new(log2_interp: u32) -> Interpolator {
        assert!(log2_interp <= MAX_LOG2_FACTOR, "interpolation factor out of range");

        Interpolator {
            stages: (0..log2_interp).map(|_| HalfbandStage::new()).collect(),
            work: Vec::new(),
            swap: Vec::new(),
        }
    }

    pub fn log2_factor(&self) -> u32 {
        self.stages.len() as u32
    }

    /// Interpolates `input` into `output`, replacing its contents. The output
    /// holds exactly 2^factor samples per input sample.
    pub fn process(&mut self, input: &[IqSample], output: &mut Vec<IqSample>) {
        output.clear();

        if self.stages.is_empty() {
            output.extend_from_slice(input);
            return;
        }

        self.work.clear();
        self.work.extend_from_slice(input);

        for stage in self.stages.iter_mut() {
            self.swap.clear();
            stage.process_into(&self.work, &mut self.swap);
            mem::swap(&mut self.work, &mut self.swap);
        }

        output.extend_from_slice(&self.work);
    }

    /// Discards all in-flight filter state.
    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::dsp::{Decimator, FcPosition};

    fn random_samples(len: usize, seed: u64) -> Vec<IqSample> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..len).map(|_| IqSample::new(rng.random::<i16>() / 2, rng.random::<i16>() / 2)).collect()
    }

    #[test]
    fn verify_passthrough_at_factor_zero() {
        let mut interp = Interpolator::new(0);
        let input = random_samples(500, 3);

        let mut output = Vec::new();
        interp.process(&input, &mut output);

        assert_eq!(output, input);
    }

    #[test]
    fn verify_output_length_contract() {
        for log2 in 1..=MAX_LOG2_FACTOR {
            let mut interp = Interpolator::new(log2);
            let input = random_samples(256, u64::from(log2));

            let mut output = Vec::new();
            interp.process(&input, &mut output);

            assert_eq!(output.len(), input.len() << log2, "log2 = {}", log2);
        }
    }

    #[test]
    fn verify_dc_gain_near_unity() {
        // Zero-stuffing halves the signal power; the doubled kernel restores a DC
        // tone to its original amplitude.
        let mut interp = Interpolator::new(2);
        let input = vec![IqSample::new(12000, -5000); 512];

        let mut output = Vec::new();
        interp.process(&input, &mut output);

        assert_eq!(output.len(), 2048);

        for s in &output[1024..] {
            assert!((i32::from(s.i) - 12000).abs() <= 120, "i = {}", s.i);
            assert!((i32::from(s.q) + 5000).abs() <= 120, "q = {}", s.q);
        }
    }

    #[test]
    fn verify_streaming_continuity() {
        let input = random_samples(1024, 11);

        let mut whole = Interpolator::new(2);
        let mut expected = Vec::new();
        whole.process(&input, &mut expected);

        let mut split = Interpolator::new(2);
        let mut head = Vec::new();
        let mut tail = Vec::new();
        split.process(&input[..301], &mut head);
        split.process(&input[301..], &mut tail);

        head.extend_from_slice(&tail);
        assert_eq!(head, expected);
    }

    #[test]
    fn verify_interpolate_then_decimate_restores_dc() {
        // A decimator undoes a centred interpolator up to filter ripple.
        let mut interp = Interpolator::new(1);
        let mut decim = Decimator::new(1, FcPosition::Centre);

        let input = vec![IqSample::new(9000, 9000); 1024];

        let mut wide = Vec::new();
        interp.process(&input, &mut wide);

        let mut narrow = Vec::new();
        decim.process(&wide, &mut narrow);

        assert_eq!(narrow.len(), 1024);

        for s in &narrow[512..] {
            assert!((i32::from(s.i) - 9000).abs() <= 120, "i = {}", s.i);
            assert!((i32::from(s.q) - 9000).abs() <= 120, "q = {}", s.q);
        }
    }
}
