// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arithmetic over GF(2^8) with the 0x11D reduction polynomial, table driven.

use lazy_static::lazy_static;

/// x^8 + x^4 + x^3 + x^2 + 1.
const GF_POLY: u16 = 0x11d;

lazy_static! {
    /// Powers of the generator element 2. Doubled in length so that the sum of
    /// two logarithms indexes without a modular reduction.
    static ref GF_EXP: [u8; 512] = {
        let mut exp = [0u8; 512];
        let mut x: u16 = 1;

        for i in 0..255 {
            exp[i] = x as u8;

            x <<= 1;
            if x & 0x100 != 0 {
                x ^= GF_POLY;
            }
        }

        for i in 255..512 {
            exp[i] = exp[i - 255];
        }

        exp
    };

    /// Logarithms base 2. The logarithm of zero is undefined and never read.
    static ref GF_LOG: [u8; 256] = {
        let mut log = [0u8; 256];

        for i in 0..255 {
            log[GF_EXP[i] as usize] = i as u8;
        }

        log
    };
}

/// Multiplies two field elements.
#[inline(always)]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        0
    }
    else {
        GF_EXP[usize::from(GF_LOG[usize::from(a)]) + usize::from(GF_LOG[usize::from(b)])]
    }
}

/// Gets the multiplicative inverse of a non-zero field element.
#[inline(always)]
pub fn inv(a: u8) -> u8 {
    assert!(a != 0, "zero has no inverse");
    GF_EXP[255 - usize::from(GF_LOG[usize::from(a)])]
}

/// Accumulates `c` times `src` into `acc`, element-wise.
///
/// A 256-entry product row is materialized once per call so the inner loop is a
/// lookup and an XOR per byte regardless of the operand values.
pub fn mul_add_assign(acc: &mut [u8], src: &[u8], c: u8) {
    assert_eq!(acc.len(), src.len());

    if c == 0 {
        return;
    }

    if c == 1 {
        for (a, &s) in acc.iter_mut().zip(src.iter()) {
            *a ^= s;
        }
        return;
    }

    let mut row = [0u8; 256];
    for (t, entry) in row.iter_mut().enumerate() {
        *entry = mul(c, t as u8);
    }

    for (a, &s) in acc.iter_mut().zip(src.iter()) {
        *a ^= row[usize::from(s)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_exp_log_round_trip() {
        for a in 1..=255u8 {
            assert_eq!(GF_EXP[usize::from(GF_LOG[usize::from(a)])], a);
        }
    }

    #[test]
    fn verify_multiplicative_identity_and_zero() {
        for a in 0..=255u8 {
            assert_eq!(mul(a, 1), a);
            assert_eq!(mul(1, a), a);
            assert_eq!(mul(a, 0), 0);
            assert_eq!(mul(0, a), 0);
        }
    }

    #[test]
    fn verify_inverses() {
        for a in 1..=255u8 {
            assert_eq!(mul(a, inv(a)), 1);
        }
    }

    #[test]
    fn verify_commutativity_and_associativity() {
        // A coarse sweep; the tables make the full product space cheap to cover.
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                assert_eq!(mul(a, b), mul(b, a));
            }
        }

        for &(a, b, c) in &[(3u8, 7u8, 200u8), (91, 17, 254), (2, 128, 255)] {
            assert_eq!(mul(mul(a, b), c), mul(a, mul(b, c)));
        }
    }

    #[test]
    fn verify_mul_add_assign_matches_scalar_math() {
        let src: Vec<u8> = (0..=255).collect();
        let mut acc = vec![0xa5u8; 256];
        let expected: Vec<u8> = acc.iter().zip(src.iter()).map(|(&a, &s)| a ^ mul(97, s)).collect();

        mul_add_assign(&mut acc, &src, 97);
        assert_eq!(acc, expected);
    }
}
