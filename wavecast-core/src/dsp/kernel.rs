// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::f64::consts::PI;

use lazy_static::lazy_static;

/// Length of the prototype halfband lowpass. Chosen so that the 4-term
/// Blackman-Harris window keeps the stopband below -90 dB, comfortably past the
/// attenuation a 16-bit stream can resolve.
pub const KERNEL_TAPS: usize = 63;

/// Index of the centre tap.
pub const KERNEL_CENTRE: usize = KERNEL_TAPS / 2;

/// Fixed-point scale of the quantized kernel.
pub const KERNEL_SCALE_BITS: u32 = 16;

/// Rounding constant added before the scale shift.
pub const KERNEL_ROUND: i64 = 1 << (KERNEL_SCALE_BITS - 1);

lazy_static! {
    /// The prototype kernel in Q16. A halfband design: every tap at an even
    /// distance from the centre, other than the centre itself, is exactly zero.
    static ref KERNEL_Q16: [i32; KERNEL_TAPS] = {
        let mid = KERNEL_CENTRE as f64;

        let mut taps = [0f64; KERNEL_TAPS];

        for (n, tap) in taps.iter_mut().enumerate() {
            let x = n as f64 - mid;

            // Ideal halfband impulse response, cutoff at a quarter of the input
            // rate. The sine term vanishes at even offsets from the centre.
            let ideal = if x == 0.0 { 0.5 } else { (PI * x / 2.0).sin() / (PI * x) };

            // 4-term Blackman-Harris window, -92 dB sidelobes.
            let t = 2.0 * PI * n as f64 / (KERNEL_TAPS - 1) as f64;
            let window =
                0.35875 - 0.48829 * t.cos() + 0.14128 * (2.0 * t).cos() - 0.01168 * (3.0 * t).cos();

            *tap = ideal * window;
        }

        // Normalize for unity DC gain before quantizing.
        let sum: f64 = taps.iter().sum();

        let mut quantized = [0i32; KERNEL_TAPS];

        for (tap, q) in taps.iter().zip(quantized.iter_mut()) {
            *q = ((tap / sum) * f64::from(1u32 << KERNEL_SCALE_BITS)).round() as i32;
        }

        quantized
    };

    /// The non-trivial polyphase arm: the kernel taps at even indices. The other
    /// arm is the centre tap alone and reduces to a delay.
    static ref KERNEL_WING_Q16: [i32; KERNEL_TAPS / 2 + 1] = {
        let mut wing = [0i32; KERNEL_TAPS / 2 + 1];

        for (j, tap) in wing.iter_mut().enumerate() {
            *tap = KERNEL_Q16[2 * j];
        }

        wing
    };
}

/// Gets the filtering polyphase arm of the halfband kernel in Q16.
pub fn wing_taps() -> &'static [i32] {
    KERNEL_WING_Q16.as_ref()
}

/// Gets the centre tap of the halfband kernel in Q16, nominally one half.
pub fn centre_tap() -> i32 {
    KERNEL_Q16[KERNEL_CENTRE]
}
