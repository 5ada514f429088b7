// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `frame` module implements the self-describing frame format carried by the
//! data link.
//!
//! A frame is 128 data blocks (one meta block and 127 sample blocks) plus up to
//! 127 parity blocks. Every block travels as one 512-byte datagram: a 4-byte
//! header followed by a 508-byte body.

mod packer;
mod unpacker;

pub use packer::{FramePacker, StreamParams};
pub use unpacker::{AssemblerStats, FrameAssembler, FrameEvent, ASSEMBLY_WINDOW};

use crate::checksum::crc32;
use crate::errors::{protocol_error, Error, Result};
use crate::fec;

/// Size of one block on the wire.
pub const BLOCK_SIZE: usize = 512;

/// Size of the per-block header.
pub const HEADER_SIZE: usize = 4;

/// Size of a block body; also the span the erasure code operates on.
pub const BODY_SIZE: usize = BLOCK_SIZE - HEADER_SIZE;

/// Data blocks per frame, meta block included.
pub const DATA_BLOCKS: usize = fec::DATA_BLOCKS;

/// Sample-bearing blocks per frame. Block zero carries the stream description.
pub const SAMPLE_BLOCKS: usize = DATA_BLOCKS - 1;

/// Maximum parity blocks per frame.
pub const MAX_FEC_BLOCKS: usize = fec::MAX_PARITY_BLOCKS;

/// Length of the meaningful prefix of a meta body, checksum included.
pub const META_SIZE: usize = 24;

/// The four header bytes leading every block.
///
/// Byte 3 is reserved: written as zero, never examined on receive.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BlockHeader {
    /// Frame sequence number, wrapping at 65536.
    pub frame_index: u16,
    /// Position within the frame: 0 meta, 1..=127 samples, 128.. parity.
    pub block_index: u8,
}

impl BlockHeader {
    pub fn write_to(&self, dst: &mut [u8]) {
        dst[0..2].copy_from_slice(&self.frame_index.to_le_bytes());
        dst[2] = self.block_index;
        dst[3] = 0;
    }

    pub fn read_from(src: &[u8]) -> Result<BlockHeader> {
        if src.len() < HEADER_SIZE {
            return protocol_error("short block header");
        }

        let header = BlockHeader {
            frame_index: u16::from_le_bytes([src[0], src[1]]),
            block_index: src[2],
        };

        // Block indices past the last possible parity block cannot be produced
        // by any frame geometry.
        if usize::from(header.block_index) >= DATA_BLOCKS + MAX_FEC_BLOCKS {
            return protocol_error("block index out of range");
        }

        Ok(header)
    }
}

/// One wire block: header plus body.
#[derive(Clone)]
pub struct Block {
    bytes: [u8; BLOCK_SIZE],
}

impl Block {
    pub fn new(frame_index: u16, block_index: u8, body: &[u8]) -> Block {
        assert_eq!(body.len(), BODY_SIZE);
        assert!(usize::from(block_index) < DATA_BLOCKS + MAX_FEC_BLOCKS);

        let mut bytes = [0u8; BLOCK_SIZE];
        BlockHeader { frame_index, block_index }.write_to(&mut bytes[..HEADER_SIZE]);
        bytes[HEADER_SIZE..].copy_from_slice(body);

        Block { bytes }
    }

    pub fn header(&self) -> BlockHeader {
        // A block built by this crate always carries a valid header.
        BlockHeader::read_from(&self.bytes).unwrap()
    }

    pub fn body(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// The stream description carried in the body of block zero.
///
/// The first 20 bytes are the little-endian fields below, followed by their
/// CRC-32; the remaining body is reserved and zero-filled.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FrameMeta {
    /// Centre frequency of the stream in kHz.
    pub center_frequency_khz: u32,
    /// Stream sample rate in samples per second.
    pub sample_rate: u32,
    /// Bytes per sample component, 1 or 2.
    pub sample_bytes: u8,
    /// Effective bits per sample component.
    pub sample_bits: u8,
    /// FEC-protected data blocks per frame. Always 128; carried so a receiver
    /// needs no out-of-band geometry.
    pub data_blocks: u8,
    /// Parity blocks appended to this frame.
    pub fec_blocks: u8,
    /// Frame origination time, Unix epoch seconds.
    pub unix_seconds: u32,
    /// Microseconds within the origination second.
    pub unix_micros: u32,
}

impl FrameMeta {
    /// Samples carried by one sample block at this stream's component width.
    pub fn samples_per_block(&self) -> usize {
        BODY_SIZE / (2 * usize::from(self.sample_bytes))
    }

    /// Samples carried by one complete frame.
    pub fn samples_per_frame(&self) -> usize {
        SAMPLE_BLOCKS * self.samples_per_block()
    }

    /// Serializes the description into a block body, checksum and zero-filled
    /// reserved region included.
    pub fn write_to(&self, body: &mut [u8]) {
        assert_eq!(body.len(), BODY_SIZE);

        body[0..4].copy_from_slice(&self.center_frequency_khz.to_le_bytes());
        body[4..8].copy_from_slice(&self.sample_rate.to_le_bytes());
        body[8] = self.sample_bytes;
        body[9] = self.sample_bits;
        body[10] = self.data_blocks;
        body[11] = self.fec_blocks;
        body[12..16].copy_from_slice(&self.unix_seconds.to_le_bytes());
        body[16..20].copy_from_slice(&self.unix_micros.to_le_bytes());

        let crc = crc32(&body[0..20]);
        body[20..24].copy_from_slice(&crc.to_le_bytes());

        body[META_SIZE..].fill(0);
    }

    /// Deserializes a stream description, verifying its checksum.
    pub fn read_from(body: &[u8]) -> Result<FrameMeta> {
        if body.len() < META_SIZE {
            return protocol_error("short meta block");
        }

        let crc = u32::from_le_bytes([body[20], body[21], body[22], body[23]]);

        if crc != crc32(&body[0..20]) {
            return Err(Error::CrcFailure);
        }

        Ok(FrameMeta {
            center_frequency_khz: u32::from_le_bytes([body[0], body[1], body[2], body[3]]),
            sample_rate: u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
            sample_bytes: body[8],
            sample_bits: body[9],
            data_blocks: body[10],
            fec_blocks: body[11],
            unix_seconds: u32::from_le_bytes([body[12], body[13], body[14], body[15]]),
            unix_micros: u32::from_le_bytes([body[16], body[17], body[18], body[19]]),
        })
    }
}
