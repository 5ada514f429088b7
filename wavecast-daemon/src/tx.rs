// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The transmit-direction worker: datagrams in, device queue out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, error, info};

use wavecast_core::buffer::SampleQueue;
use wavecast_core::dsp::Interpolator;
use wavecast_core::frame::{FrameAssembler, FrameEvent};
use wavecast_core::sample::IqSample;
use wavecast_core::settings::SharedSettings;

use crate::controller::Controller;
use crate::net::{BlockReceiver, POLL_INTERVAL};

struct TxPipeline {
    sequence: u64,
    assembler: FrameAssembler,
    interpolator: Interpolator,
    widened: Vec<IqSample>,
}

impl TxPipeline {
    fn new(sequence: u64, log2_interp: u32) -> TxPipeline {
        TxPipeline {
            sequence,
            assembler: FrameAssembler::new(),
            interpolator: Interpolator::new(log2_interp),
            widened: Vec::new(),
        }
    }

    /// Picks up a newer settings snapshot between frames. An interpolation
    /// change rebuilds the chain, dropping in-flight filter state.
    fn refresh_settings(&mut self, shared: &SharedSettings) {
        let (sequence, settings) = shared.load();

        if sequence == self.sequence {
            return;
        }

        if settings.log2_interp != self.interpolator.log2_factor() {
            self.interpolator = Interpolator::new(settings.log2_interp);
            info!("settings #{}: interpolation set to 2^{}", sequence, settings.log2_interp);
        }

        self.sequence = sequence;
    }

    /// Forwards every reassembled frame to the device queue, in order.
    fn forward_events(&mut self, queue: &SampleQueue) {
        while let Some(event) = self.assembler.next_event() {
            let samples = match event {
                FrameEvent::Frame { samples, .. } => samples,
                FrameEvent::Lost { samples, .. } => samples,
            };

            if samples.is_empty() {
                continue;
            }

            self.interpolator.process(&samples, &mut self.widened);
            queue.push(std::mem::take(&mut self.widened));
        }
    }
}

/// Streams until the stop flag rises, then flushes the assembly window and lets
/// the device drain the queue.
pub fn run(
    controller: &Mutex<Controller>,
    queue: &Arc<SampleQueue>,
    shared: &SharedSettings,
    receiver: &BlockReceiver,
    stop: &AtomicBool,
) {
    let (sequence, settings) = shared.load();
    let mut pipeline = TxPipeline::new(sequence, settings.log2_interp);

    let mut buf = [0u8; 1024];

    info!("transmit pipeline streaming");

    while !stop.load(Ordering::Relaxed) {
        match receiver.recv(&mut buf) {
            Ok(None) => continue,
            Ok(Some(datagram)) => {
                if let Err(err) = pipeline.assembler.ingest(datagram) {
                    debug!("datagram rejected: {}", err);
                }
            }
            Err(err) => {
                error!("datagram receive failed: {}", err);
                break;
            }
        }

        pipeline.refresh_settings(shared);
        pipeline.forward_events(queue);
    }

    info!("transmit pipeline draining");

    // Frames stuck behind a gap are force-delivered before the stream ends.
    pipeline.assembler.flush();
    pipeline.forward_events(queue);
    queue.push_end();

    controller.lock().unwrap().stop_streaming();

    let stats = pipeline.assembler.stats();
    info!(
        "transmit pipeline stopped: {} frames delivered ({} repaired), {} lost, \
         {} datagrams rejected, {} late blocks",
        stats.frames_delivered,
        stats.frames_repaired,
        stats.frames_lost,
        stats.datagrams_rejected,
        stats.late_blocks
    );
}
