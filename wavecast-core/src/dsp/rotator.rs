// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::sample::IqSample;

use super::FcPosition;

/// An exact +/-Fs/4 frequency translator.
///
/// Multiplying by e^(+/-j*pi*n/2) cycles through {1, +/-j, -1, -/+j}, so the
/// product is a sign/component shuffle of the input, computed from the sample
/// index modulo 4. No multiplier is involved and the result is bit-exact.
pub struct QuarterRateRotator {
    position: FcPosition,
    phase: u8,
}

impl QuarterRateRotator {
    pub fn new(position: FcPosition) -> QuarterRateRotator {
        QuarterRateRotator { position, phase: 0 }
    }

    /// Rotates one sample and advances the phase.
    #[inline(always)]
    pub fn rotate(&mut self, s: IqSample) -> IqSample {
        let (i, q) = (s.i, s.q);

        // Negation saturates so that a full-scale negative component stays
        // representable.
        let out = match (self.position, self.phase) {
            (FcPosition::Centre, _) => IqSample::new(i, q),
            // Multiply by e^(-j*pi*n/2): 1, -j, -1, +j.
            (FcPosition::Infra, 0) => IqSample::new(i, q),
            (FcPosition::Infra, 1) => IqSample::new(q, i.saturating_neg()),
            (FcPosition::Infra, 2) => IqSample::new(i.saturating_neg(), q.saturating_neg()),
            (FcPosition::Infra, _) => IqSample::new(q.saturating_neg(), i),
            // Multiply by e^(+j*pi*n/2): 1, +j, -1, -j.
            (FcPosition::Supra, 0) => IqSample::new(i, q),
            (FcPosition::Supra, 1) => IqSample::new(q.saturating_neg(), i),
            (FcPosition::Supra, 2) => IqSample::new(i.saturating_neg(), q.saturating_neg()),
            (FcPosition::Supra, _) => IqSample::new(q, i.saturating_neg()),
        };

        self.phase = (self.phase + 1) & 3;
        out
    }

    /// Rotates a sample vector in place.
    pub fn rotate_buf(&mut self, samples: &mut [IqSample]) {
        if self.position == FcPosition::Centre {
            return;
        }

        for s in samples.iter_mut() {
            *s = self.rotate(*s);
        }
    }

    /// Resets the phase to the first step of the cycle.
    pub fn reset(&mut self) {
        self.phase = 0;
    }
}
