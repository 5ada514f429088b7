// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::errors::{protocol_error, Result};
use crate::fec::ErasureDecoder;
use crate::sample::{read_samples, silence, IqSample};

use super::{BlockHeader, FrameMeta, BLOCK_SIZE, DATA_BLOCKS, HEADER_SIZE, MAX_FEC_BLOCKS};

/// Maximum number of in-flight frames tracked at once.
pub const ASSEMBLY_WINDOW: usize = 8;

/// A forward jump beyond this many frames is treated as a stream restart rather
/// than a loss burst, and is resynchronized to instead of silence-padded.
const RESYNC_GAP: u16 = 2 * ASSEMBLY_WINDOW as u16;

/// Whether frame index `a` comes after `b` in 16-bit wraparound order.
#[inline]
fn is_after(a: u16, b: u16) -> bool {
    let d = a.wrapping_sub(b);
    d != 0 && d < 0x8000
}

/// One reassembled frame, delivered in frame-index order.
#[derive(Debug)]
pub enum FrameEvent {
    /// A frame recovered in full.
    Frame { index: u16, meta: FrameMeta, samples: Vec<IqSample> },
    /// An unrecoverable frame, replaced by silence of equal length to preserve
    /// the time base.
    Lost { index: u16, samples: Vec<IqSample> },
}

/// Counters exposed by the assembler.
#[derive(Copy, Clone, Debug, Default)]
pub struct AssemblerStats {
    pub blocks_accepted: u64,
    pub datagrams_rejected: u64,
    pub late_blocks: u64,
    pub duplicate_blocks: u64,
    pub frames_delivered: u64,
    pub frames_repaired: u64,
    pub frames_lost: u64,
    pub crc_failures: u64,
}

enum Resolution {
    Ready { meta: FrameMeta, samples: Vec<IqSample> },
    Dropped,
}

struct PendingFrame {
    index: u16,
    /// Bodies keyed by block index; parity slots beyond the frame's actual
    /// parity count simply stay empty.
    slots: Vec<Option<Vec<u8>>>,
    present: usize,
    resolution: Option<Resolution>,
}

impl PendingFrame {
    fn new(index: u16) -> PendingFrame {
        PendingFrame {
            index,
            slots: (0..DATA_BLOCKS + MAX_FEC_BLOCKS).map(|_| None).collect(),
            present: 0,
            resolution: None,
        }
    }
}

/// Rebuilds the sample stream from received datagrams.
///
/// Frames materialize as their first block arrives and live in a small window
/// until they are recovered or pushed out by newer traffic. Reassembled frames
/// are handed out strictly in frame-index order; a frame that cannot be
/// recovered is replaced by silence.
pub struct FrameAssembler {
    window: VecDeque<PendingFrame>,
    decoder: ErasureDecoder,
    /// The next frame index owed to the consumer. `None` until the first
    /// delivery establishes the stream position.
    next_delivery: Option<u16>,
    /// The most recent stream description, used to size silence padding.
    last_meta: Option<FrameMeta>,
    events: VecDeque<FrameEvent>,
    stats: AssemblerStats,
}

impl FrameAssembler {
    pub fn new() -> FrameAssembler {
        FrameAssembler {
            window: VecDeque::new(),
            decoder: ErasureDecoder::new(),
            next_delivery: None,
            last_meta: None,
            events: VecDeque::new(),
            stats: AssemblerStats::default(),
        }
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// The most recent stream description seen on the link.
    pub fn stream_meta(&self) -> Option<FrameMeta> {
        self.last_meta
    }

    /// Takes the next reassembled frame, if one is ready.
    pub fn next_event(&mut self) -> Option<FrameEvent> {
        self.events.pop_front()
    }

    /// Accepts one received datagram.
    ///
    /// Datagrams that are not exactly one block long, or whose header cannot
    /// describe any frame, are counted and rejected. Duplicates and blocks of
    /// already-delivered frames are dropped silently.
    pub fn ingest(&mut self, datagram: &[u8]) -> Result<()> {
        if datagram.len() != BLOCK_SIZE {
            self.stats.datagrams_rejected += 1;
            return protocol_error("datagram is not one block long");
        }

        let header = match BlockHeader::read_from(datagram) {
            Ok(header) => header,
            Err(err) => {
                self.stats.datagrams_rejected += 1;
                return Err(err);
            }
        };

        self.stats.blocks_accepted += 1;

        // Blocks behind the delivery cursor missed their frame.
        if let Some(next) = self.next_delivery {
            if is_after(next, header.frame_index) {
                self.stats.late_blocks += 1;
                return Ok(());
            }
        }

        self.evict_for(header.frame_index);

        let pos = match self.window.iter().position(|f| f.index == header.frame_index) {
            Some(pos) => pos,
            None => {
                let pos = self
                    .window
                    .iter()
                    .position(|f| is_after(f.index, header.frame_index))
                    .unwrap_or(self.window.len());

                self.window.insert(pos, PendingFrame::new(header.frame_index));
                pos
            }
        };

        let entry = &mut self.window[pos];
        let slot = &mut entry.slots[usize::from(header.block_index)];

        if slot.is_some() {
            self.stats.duplicate_blocks += 1;
        }
        else {
            *slot = Some(datagram[HEADER_SIZE..].to_vec());
            entry.present += 1;

            if entry.present >= DATA_BLOCKS && entry.resolution.is_none() {
                Self::resolve(
                    &mut self.decoder,
                    &mut self.stats,
                    &mut self.last_meta,
                    entry,
                );
            }
        }

        self.flush_contiguous();

        Ok(())
    }

    /// Force-delivers everything still in the window, in order. Called when the
    /// stream drains so trailing frames are not stranded behind a gap.
    pub fn flush(&mut self) {
        while !self.window.is_empty() {
            self.deliver_front();
        }
    }

    /// Recovers a frame that has reached the 128 distinct blocks needed.
    fn resolve(
        decoder: &mut ErasureDecoder,
        stats: &mut AssemblerStats,
        last_meta: &mut Option<FrameMeta>,
        entry: &mut PendingFrame,
    ) {
        let repaired = entry.slots[..DATA_BLOCKS].iter().any(|slot| slot.is_none());

        if decoder.decode(&mut entry.slots).is_err() {
            // Unreachable with 128 distinct blocks present; treat as a drop.
            entry.resolution = Some(Resolution::Dropped);
            return;
        }

        let meta = match FrameMeta::read_from(entry.slots[0].as_ref().unwrap()) {
            Ok(meta) if meta.sample_bytes == 1 || meta.sample_bytes == 2 => meta,
            Ok(_) | Err(_) => {
                stats.crc_failures += 1;
                warn!("frame {}: meta block failed validation", entry.index);
                entry.resolution = Some(Resolution::Dropped);
                return;
            }
        };

        let mut samples = Vec::with_capacity(meta.samples_per_frame());

        for slot in entry.slots[1..DATA_BLOCKS].iter() {
            read_samples(slot.as_ref().unwrap(), meta.sample_bytes, &mut samples);
        }

        if repaired {
            stats.frames_repaired += 1;
            debug!("frame {}: repaired missing blocks", entry.index);
        }

        *last_meta = Some(meta);
        entry.resolution = Some(Resolution::Ready { meta, samples });
    }

    /// Applies the window-pressure rule for a newly arrived frame index: the
    /// oldest tracked frame is pushed out once the new index runs more than half
    /// the window ahead of it.
    fn evict_for(&mut self, incoming: u16) {
        while let Some(front) = self.window.front() {
            let span = incoming.wrapping_sub(front.index);

            if span < 0x8000 && usize::from(span) > ASSEMBLY_WINDOW / 2 {
                self.deliver_front();
            }
            else {
                break;
            }
        }
    }

    /// Delivers every resolved frame sitting contiguously at the delivery
    /// cursor. Frames behind a gap stay put until the gap closes or window
    /// pressure forces them out.
    fn flush_contiguous(&mut self) {
        loop {
            let deliverable = match self.window.front() {
                Some(front) if front.resolution.is_some() => match self.next_delivery {
                    None => true,
                    Some(next) => front.index == next,
                },
                _ => false,
            };

            if !deliverable {
                break;
            }

            self.deliver_front();
        }
    }

    /// Removes the oldest tracked frame and emits it, padding any preceding gap
    /// with silence.
    fn deliver_front(&mut self) {
        let entry = match self.window.pop_front() {
            Some(entry) => entry,
            None => return,
        };

        if let Some(next) = self.next_delivery {
            let gap = entry.index.wrapping_sub(next);

            if gap != 0 {
                if gap <= RESYNC_GAP {
                    for offset in 0..gap {
                        let index = next.wrapping_add(offset);
                        self.emit_lost(index);
                    }
                }
                else {
                    warn!(
                        "frame discontinuity of {} frames at {}, resynchronizing",
                        gap, entry.index
                    );
                }
            }
        }

        self.next_delivery = Some(entry.index.wrapping_add(1));

        match entry.resolution {
            Some(Resolution::Ready { meta, samples }) => {
                self.stats.frames_delivered += 1;
                self.events.push_back(FrameEvent::Frame { index: entry.index, meta, samples });
            }
            Some(Resolution::Dropped) | None => self.emit_lost(entry.index),
        }
    }

    /// Emits a silence stand-in for one unrecoverable frame.
    fn emit_lost(&mut self, index: u16) {
        self.stats.frames_lost += 1;
        warn!("frame {} lost", index);

        // Without any stream description yet there is no time base to preserve.
        let samples = match self.last_meta {
            Some(meta) => silence(meta.samples_per_frame()),
            None => Vec::new(),
        };

        self.events.push_back(FrameEvent::Lost { index, samples });
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        FrameAssembler::new()
    }
}
