// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The receive-direction worker: device queue in, paced datagrams out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::{debug, error, info, warn};

use wavecast_core::buffer::SampleQueue;
use wavecast_core::dsp::Decimator;
use wavecast_core::frame::{FramePacker, StreamParams};
use wavecast_core::sample::{promote_to_16_bits, IqSample};
use wavecast_core::settings::{ChannelSettings, SharedSettings};

use crate::controller::Controller;
use crate::net::{BlockSender, POLL_INTERVAL};

fn stream_params(settings: &ChannelSettings) -> StreamParams {
    StreamParams {
        center_frequency_khz: (settings.center_frequency_hz / 1000) as u32,
        sample_rate: settings.sample_rate >> settings.log2_decim,
        sample_size: settings.device_sample.after_decimation(settings.log2_decim),
        fec_blocks: settings.fec_blocks,
    }
}

struct RxPipeline {
    sequence: u64,
    settings: ChannelSettings,
    decimator: Decimator,
    packer: FramePacker,
    decimated: Vec<IqSample>,
    frames_sent: u64,
    blocks_sent: u64,
    overrun_reported: bool,
}

impl RxPipeline {
    fn new(sequence: u64, settings: ChannelSettings) -> RxPipeline {
        RxPipeline {
            sequence,
            settings,
            decimator: Decimator::new(settings.log2_decim, settings.fc_position),
            packer: FramePacker::new(stream_params(&settings)),
            decimated: Vec::new(),
            frames_sent: 0,
            blocks_sent: 0,
            overrun_reported: false,
        }
    }

    /// Picks up a newer settings snapshot between frames.
    ///
    /// A rate-change or band-placement switch rebuilds the filter chain and
    /// flushes the in-flight buffer without emission, so no frame ever mixes two
    /// filter configurations.
    fn refresh_settings(&mut self, shared: &SharedSettings) {
        let (sequence, settings) = shared.load();

        if sequence == self.sequence {
            return;
        }

        if settings.log2_decim != self.settings.log2_decim
            || settings.fc_position != self.settings.fc_position
        {
            self.decimator = Decimator::new(settings.log2_decim, settings.fc_position);
            self.packer.discard_pending();
        }

        self.packer.set_params(stream_params(&settings));

        info!(
            "settings #{}: {} Hz, {} S/s over 2^{}, fec {}, txdelay {} us",
            sequence,
            settings.center_frequency_hz,
            settings.sample_rate,
            settings.log2_decim,
            settings.fec_blocks,
            settings.tx_delay_us
        );

        self.sequence = sequence;
        self.settings = settings;
    }

    /// Runs one sample vector through the chain, emitting any completed frames.
    fn process(&mut self, mut vector: Vec<IqSample>, sender: &BlockSender) -> bool {
        // Decimation arithmetic runs at full width; promote narrow streams
        // ahead of the first stage.
        if self.settings.device_sample.bytes == 1 && self.settings.log2_decim > 0 {
            promote_to_16_bits(&mut vector);
        }

        self.decimator.process(&vector, &mut self.decimated);

        for frame in self.packer.push(&self.decimated) {
            if let Err(err) = sender.send_blocks(&frame, self.settings.tx_delay_us) {
                error!("datagram send failed: {}", err);
                return false;
            }

            self.frames_sent += 1;
            self.blocks_sent += frame.len() as u64;
        }

        true
    }

    fn check_overrun(&mut self, queue: &SampleQueue) {
        let queued = queue.queued_samples();

        if queued > 10 * self.settings.sample_rate as usize {
            if !self.overrun_reported {
                warn!("input overrun: {} samples queued, the link cannot keep up", queued);
                self.overrun_reported = true;
            }
        }
        else {
            self.overrun_reported = false;
        }
    }
}

/// Streams until the stop flag rises or the device ends the stream, then drains.
pub fn run(
    controller: &Mutex<Controller>,
    queue: &SampleQueue,
    shared: &SharedSettings,
    sender: &BlockSender,
    stop: &AtomicBool,
) {
    let (sequence, settings) = shared.load();
    let mut pipeline = RxPipeline::new(sequence, settings);

    info!("receive pipeline streaming");

    while !stop.load(Ordering::Relaxed) {
        let vector = match queue.pull_timeout(POLL_INTERVAL) {
            None => continue,
            Some(vector) => vector,
        };

        if vector.is_empty() {
            warn!("device stream ended");
            break;
        }

        pipeline.refresh_settings(shared);
        pipeline.check_overrun(queue);

        if !pipeline.process(vector, sender) {
            break;
        }
    }

    info!("receive pipeline draining");
    controller.lock().unwrap().stop_streaming();

    loop {
        match queue.pull_timeout(POLL_INTERVAL) {
            Some(vector) if vector.is_empty() => break,
            Some(vector) => {
                pipeline.process(vector, sender);
            }
            None => break,
        }
    }

    let dropped = pipeline.packer.pending_samples();
    if dropped > 0 {
        debug!("discarding {} samples of a partial frame", dropped);
    }

    info!(
        "receive pipeline stopped: {} frames, {} blocks",
        pipeline.frames_sent, pipeline.blocks_sent
    );
}
