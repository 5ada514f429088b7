// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::mem;

use crate::sample::IqSample;

use super::kernel;
use super::rotator::QuarterRateRotator;
use super::{FcPosition, MAX_LOG2_FACTOR};

/// Rounds and rescales a Q16 accumulator to a 16-bit component.
#[inline(always)]
fn quantize(acc: i64) -> i16 {
    ((acc + kernel::KERNEL_ROUND) >> kernel::KERNEL_SCALE_BITS)
        .clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

/// One two-path halfband decimation stage.
///
/// Incoming samples alternate between the two polyphase arms: even-phase samples
/// feed the symmetric kernel arm, odd-phase samples feed the identity-delay arm
/// weighted by the centre tap. One output sample is produced per input pair.
struct HalfbandStage {
    even_i: Vec<i32>,
    even_q: Vec<i32>,
    odd_i: Vec<i32>,
    odd_q: Vec<i32>,
    /// Shared write cursor into the circular arm buffers.
    pos: usize,
    /// An unpaired even-phase sample carried across vector boundaries.
    pending: Option<IqSample>,
}

impl HalfbandStage {
    fn new() -> HalfbandStage {
        let len = kernel::wing_taps().len();

        HalfbandStage {
            even_i: vec![0; len],
            even_q: vec![0; len],
            odd_i: vec![0; len],
            odd_q: vec![0; len],
            pos: 0,
            pending: None,
        }
    }

    fn process_into(&mut self, input: &[IqSample], output: &mut Vec<IqSample>) {
        let wing = kernel::wing_taps();
        let len = wing.len();
        let centre = i64::from(kernel::centre_tap());

        // The identity arm delays by half the kernel arm's span.
        let delay = len / 2;

        for &s in input {
            let even = match self.pending.take() {
                None => {
                    self.pending = Some(s);
                    continue;
                }
                Some(even) => even,
            };

            self.even_i[self.pos] = i32::from(even.i);
            self.even_q[self.pos] = i32::from(even.q);
            self.odd_i[self.pos] = i32::from(s.i);
            self.odd_q[self.pos] = i32::from(s.q);

            let mut acc_i = 0i64;
            let mut acc_q = 0i64;

            for (j, &tap) in wing.iter().enumerate() {
                let idx = (self.pos + len - j) % len;
                acc_i += i64::from(tap) * i64::from(self.even_i[idx]);
                acc_q += i64::from(tap) * i64::from(self.even_q[idx]);
            }

            let idx = (self.pos + len - delay) % len;
            acc_i += centre * i64::from(self.odd_i[idx]);
            acc_q += centre * i64::from(self.odd_q[idx]);

            output.push(IqSample::new(quantize(acc_i), quantize(acc_q)));

            self.pos = (self.pos + 1) % len;
        }
    }

    fn reset(&mut self) {
        self.even_i.fill(0);
        self.even_q.fill(0);
        self.odd_i.fill(0);
        self.odd_q.fill(0);
        self.pos = 0;
        self.pending = None;
    }
}

/// A power-of-two decimator: an optional exact Fs/4 translator followed by one
/// halfband stage per unit of the log2 factor.
///
/// A factor of zero passes samples through untouched, translator included.
pub struct Decimator {
    rotator: Option<QuarterRateRotator>,
    stages: Vec<HalfbandStage>,
    work: Vec<IqSample>,
    swap: Vec<IqSample>,
}

impl Decimator {
    pub fn new(log2_decim: u32, fc_pos: FcPosition) -> Decimator {
        assert!(log2_decim <= MAX_LOG2_FACTOR, "decimation factor out of range");

        // The band placement translator only exists as part of a decimation chain.
        let rotator = if log2_decim > 0 && fc_pos != FcPosition::Centre {
            Some(QuarterRateRotator::new(fc_pos))
        }
        else {
            None
        };

        Decimator {
            rotator,
            stages: (0..log2_decim).map(|_| HalfbandStage::new()).collect(),
            work: Vec::new(),
            swap: Vec::new(),
        }
    }

    pub fn log2_factor(&self) -> u32 {
        self.stages.len() as u32
    }

    /// Decimates `input` into `output`, replacing its contents.
    ///
    /// Over a stream, one output sample is produced per 2^factor input samples;
    /// an input vector whose length is not a multiple of 2^factor carries its
    /// remainder into the next call.
    pub fn process(&mut self, input: &[IqSample], output: &mut Vec<IqSample>) {
        output.clear();

        if self.stages.is_empty() {
            output.extend_from_slice(input);
            return;
        }

        self.work.clear();
        self.work.extend_from_slice(input);

        if let Some(rot) = &mut self.rotator {
            rot.rotate_buf(&mut self.work);
        }

        for stage in self.stages.iter_mut() {
            self.swap.clear();
            stage.process_into(&self.work, &mut self.swap);
            mem::swap(&mut self.work, &mut self.swap);
        }

        output.extend_from_slice(&self.work);
    }

    /// Discards all in-flight filter and translator state.
    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }

        if let Some(rot) = &mut self.rotator {
            rot.reset();
        }
    }
}
