// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::fec;
use crate::sample::{write_samples, IqSample, SampleSize};

use super::{Block, FrameMeta, BODY_SIZE, DATA_BLOCKS, SAMPLE_BLOCKS};

/// The stream parameters a packer stamps into each frame it builds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StreamParams {
    pub center_frequency_khz: u32,
    pub sample_rate: u32,
    pub sample_size: SampleSize,
    pub fec_blocks: u8,
}

/// Accumulates a sample stream and cuts it into whole frames.
///
/// Nothing is emitted until all 127 sample blocks of a frame are full; the last
/// partial frame of a stream is discarded, not padded.
pub struct FramePacker {
    params: StreamParams,
    frame_index: u16,
    pending: Vec<IqSample>,
}

impl FramePacker {
    pub fn new(params: StreamParams) -> FramePacker {
        assert!(usize::from(params.fec_blocks) <= fec::MAX_PARITY_BLOCKS);

        FramePacker { params, frame_index: 0, pending: Vec::new() }
    }

    /// Samples needed per frame at the current component width.
    pub fn samples_per_frame(&self) -> usize {
        SAMPLE_BLOCKS * (BODY_SIZE / (2 * usize::from(self.params.sample_size.bytes)))
    }

    /// Replaces the stream parameters. Takes effect with the next frame built;
    /// a component-width change discards the partial frame accumulated so far
    /// since its layout no longer matches.
    pub fn set_params(&mut self, params: StreamParams) {
        assert!(usize::from(params.fec_blocks) <= fec::MAX_PARITY_BLOCKS);

        if params.sample_size.bytes != self.params.sample_size.bytes {
            self.pending.clear();
        }

        self.params = params;
    }

    pub fn params(&self) -> StreamParams {
        self.params
    }

    /// Discards the accumulated partial frame.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// The index the next built frame will carry.
    pub fn next_frame_index(&self) -> u16 {
        self.frame_index
    }

    /// Repositions the frame counter. Exists for exercising wraparound.
    pub(crate) fn set_next_frame_index(&mut self, index: u16) {
        self.frame_index = index;
    }

    /// Queued samples not yet cut into a frame.
    pub fn pending_samples(&self) -> usize {
        self.pending.len()
    }

    /// Appends samples to the accumulator and returns every whole frame that
    /// became available, in order.
    pub fn push(&mut self, samples: &[IqSample]) -> Vec<Vec<Block>> {
        self.pending.extend_from_slice(samples);

        let mut frames = Vec::new();

        while self.pending.len() >= self.samples_per_frame() {
            frames.push(self.build_frame());
        }

        frames
    }

    fn build_frame(&mut self) -> Vec<Block> {
        let samples_per_frame = self.samples_per_frame();
        let samples_per_block = samples_per_frame / SAMPLE_BLOCKS;
        let bytes_per_block = samples_per_block * 2 * usize::from(self.params.sample_size.bytes);

        let mut bodies = vec![[0u8; BODY_SIZE]; DATA_BLOCKS];

        // The wall clock is sampled once, as the meta block is built.
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();

        let meta = FrameMeta {
            center_frequency_khz: self.params.center_frequency_khz,
            sample_rate: self.params.sample_rate,
            sample_bytes: self.params.sample_size.bytes,
            sample_bits: self.params.sample_size.bits,
            data_blocks: DATA_BLOCKS as u8,
            fec_blocks: self.params.fec_blocks,
            unix_seconds: now.as_secs() as u32,
            unix_micros: now.subsec_micros(),
        };

        meta.write_to(&mut bodies[0]);

        for (block, chunk) in
            bodies[1..].iter_mut().zip(self.pending[..samples_per_frame].chunks(samples_per_block))
        {
            write_samples(chunk, self.params.sample_size.bytes, &mut block[..bytes_per_block]);
        }

        self.pending.drain(..samples_per_frame);

        let body_refs: Vec<&[u8]> = bodies.iter().map(|b| b.as_slice()).collect();
        let parity = fec::encode_parity(&body_refs, usize::from(self.params.fec_blocks));

        let mut blocks = Vec::with_capacity(DATA_BLOCKS + parity.len());

        for (index, body) in bodies.iter().enumerate() {
            blocks.push(Block::new(self.frame_index, index as u8, body));
        }

        for (offset, body) in parity.iter().enumerate() {
            blocks.push(Block::new(self.frame_index, (DATA_BLOCKS + offset) as u8, body));
        }

        self.frame_index = self.frame_index.wrapping_add(1);

        blocks
    }
}
