// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `fec` module implements the systematic Cauchy erasure code that protects a
//! frame.
//!
//! The code operates over GF(2^8) on equal-length block bodies. The generator
//! matrix is the identity over the 128 data blocks, extended by rows of a Cauchy
//! matrix for the parity blocks, so any 128 distinct blocks of a frame recover
//! all 128 data blocks.

pub mod gf256;

use std::collections::HashMap;

use crate::errors::{Error, Result};

/// Number of data blocks protected per frame.
pub const DATA_BLOCKS: usize = 128;

/// Maximum number of parity blocks per frame, bounded by the 8-bit block index.
pub const MAX_PARITY_BLOCKS: usize = 127;

/// The generator coefficient applied to data block `data` when forming parity
/// block `parity`.
///
/// Data block indices lie in 0..128 and parity block indices in 128..255, so the
/// two sequences are disjoint and the XOR is never zero. The resulting rows form
/// a Cauchy matrix: every square submatrix is invertible, which is what makes the
/// code maximum-distance-separable.
#[inline]
fn cauchy_coefficient(parity: usize, data: usize) -> u8 {
    debug_assert!(parity >= DATA_BLOCKS && parity < DATA_BLOCKS + MAX_PARITY_BLOCKS);
    debug_assert!(data < DATA_BLOCKS);

    gf256::inv((parity ^ data) as u8)
}

/// Computes `parity_count` parity bodies over the data-block bodies.
///
/// All bodies must share one length. A parity count of zero yields no parity and
/// no work.
pub fn encode_parity(data: &[&[u8]], parity_count: usize) -> Vec<Vec<u8>> {
    assert_eq!(data.len(), DATA_BLOCKS, "a frame has exactly 128 data blocks");
    assert!(parity_count <= MAX_PARITY_BLOCKS, "parity count out of range");

    let body_len = data[0].len();

    let mut parity = Vec::with_capacity(parity_count);

    for p in 0..parity_count {
        let mut body = vec![0u8; body_len];

        for (j, block) in data.iter().enumerate() {
            assert_eq!(block.len(), body_len, "block bodies must share one length");
            gf256::mul_add_assign(&mut body, block, cauchy_coefficient(DATA_BLOCKS + p, j));
        }

        parity.push(body);
    }

    parity
}

/// Reconstructs missing data-block bodies from any 128 distinct blocks.
///
/// The decoder holds a cache of inverted elimination matrices keyed by the
/// erasure pattern, so a link with a stable loss profile pays the matrix
/// inversion once.
pub struct ErasureDecoder {
    inverse_cache: HashMap<(Vec<u8>, Vec<u8>), Vec<u8>>,
}

impl ErasureDecoder {
    pub fn new() -> ErasureDecoder {
        ErasureDecoder { inverse_cache: HashMap::new() }
    }

    /// Fills every empty data slot of `slots` in place.
    ///
    /// `slots` is indexed by block index: data bodies at 0..128, parity bodies
    /// above. Present bodies must share one length. Returns
    /// [`Error::InsufficientBlocks`] when fewer parity bodies are present than
    /// data bodies are missing; the slots are left untouched in that case.
    pub fn decode(&mut self, slots: &mut [Option<Vec<u8>>]) -> Result<()> {
        assert!(slots.len() >= DATA_BLOCKS);

        let missing: Vec<u8> =
            (0..DATA_BLOCKS).filter(|&j| slots[j].is_none()).map(|j| j as u8).collect();

        if missing.is_empty() {
            return Ok(());
        }

        let parity_rows: Vec<u8> = (DATA_BLOCKS..slots.len())
            .filter(|&b| slots[b].is_some())
            .take(missing.len())
            .map(|b| b as u8)
            .collect();

        if parity_rows.len() < missing.len() {
            return Err(Error::InsufficientBlocks);
        }

        let e = missing.len();

        let inverse = match self.inverse_cache.get(&(missing.clone(), parity_rows.clone())) {
            Some(inverse) => inverse.clone(),
            None => {
                let mut matrix = vec![0u8; e * e];

                for (r, &p) in parity_rows.iter().enumerate() {
                    for (c, &j) in missing.iter().enumerate() {
                        matrix[r * e + c] = cauchy_coefficient(usize::from(p), usize::from(j));
                    }
                }

                let inverse = invert_matrix(&matrix, e).ok_or(Error::InsufficientBlocks)?;

                self.inverse_cache
                    .insert((missing.clone(), parity_rows.clone()), inverse.clone());

                inverse
            }
        };

        let body_len = slots
            .iter()
            .flatten()
            .map(|body| body.len())
            .next()
            .expect("at least one body is present");

        // Subtract the contribution of the present data blocks from each usable
        // parity body, leaving the syndromes of the missing blocks alone.
        let mut syndromes = Vec::with_capacity(e);

        for &p in parity_rows.iter() {
            let mut syndrome = slots[usize::from(p)].as_ref().unwrap().clone();

            for j in 0..DATA_BLOCKS {
                if let Some(body) = &slots[j] {
                    gf256::mul_add_assign(
                        &mut syndrome,
                        body,
                        cauchy_coefficient(usize::from(p), j),
                    );
                }
            }

            syndromes.push(syndrome);
        }

        // Each missing body is a linear combination of the syndromes through the
        // inverted elimination matrix.
        for (c, &j) in missing.iter().enumerate() {
            let mut body = vec![0u8; body_len];

            for (r, syndrome) in syndromes.iter().enumerate() {
                gf256::mul_add_assign(&mut body, syndrome, inverse[c * e + r]);
            }

            slots[usize::from(j)] = Some(body);
        }

        Ok(())
    }
}

impl Default for ErasureDecoder {
    fn default() -> Self {
        ErasureDecoder::new()
    }
}

/// Inverts a square matrix over GF(2^8) by Gauss-Jordan elimination. Returns
/// `None` for a singular matrix.
fn invert_matrix(matrix: &[u8], n: usize) -> Option<Vec<u8>> {
    let mut work = matrix.to_vec();

    let mut inverse = vec![0u8; n * n];
    for d in 0..n {
        inverse[d * n + d] = 1;
    }

    for col in 0..n {
        // Find a pivot and bring it onto the diagonal.
        let pivot = (col..n).find(|&r| work[r * n + col] != 0)?;

        if pivot != col {
            for c in 0..n {
                work.swap(pivot * n + c, col * n + c);
                inverse.swap(pivot * n + c, col * n + c);
            }
        }

        let scale = gf256::inv(work[col * n + col]);
        for c in 0..n {
            work[col * n + c] = gf256::mul(work[col * n + c], scale);
            inverse[col * n + c] = gf256::mul(inverse[col * n + c], scale);
        }

        for r in 0..n {
            if r == col {
                continue;
            }

            let factor = work[r * n + col];
            if factor == 0 {
                continue;
            }

            for c in 0..n {
                let w = gf256::mul(work[col * n + c], factor);
                work[r * n + c] ^= w;

                let i = gf256::mul(inverse[col * n + c], factor);
                inverse[r * n + c] ^= i;
            }
        }
    }

    Some(inverse)
}
