// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end exercises of the streaming core: samples through the receive
//! chain onto the wire, back through the transmit chain, under loss and
//! reordering.

use wavecast_core::dsp::{Decimator, FcPosition, Interpolator};
use wavecast_core::frame::{
    Block, FrameAssembler, FrameEvent, FrameMeta, FramePacker, StreamParams, DATA_BLOCKS,
};
use wavecast_core::sample::{IqSample, SampleSize};

fn params(fec_blocks: u8, sample_rate: u32) -> StreamParams {
    StreamParams {
        center_frequency_khz: 433_970,
        sample_rate,
        sample_size: SampleSize::new(2, 16),
        fec_blocks,
    }
}

/// Runs samples through the receive chain and returns the emitted frames.
fn receive_chain(
    samples: &[IqSample],
    log2_decim: u32,
    fc_pos: FcPosition,
    fec_blocks: u8,
    sample_rate: u32,
) -> Vec<Vec<Block>> {
    let mut decimator = Decimator::new(log2_decim, fc_pos);
    let mut packer = FramePacker::new(params(fec_blocks, sample_rate >> log2_decim));

    let mut decimated = Vec::new();
    decimator.process(samples, &mut decimated);

    packer.push(&decimated)
}

/// Feeds frames into the transmit chain, skipping listed block indices, and
/// returns the reassembled stream and the delivered metas.
fn transmit_chain(frames: &[Vec<Block>], skip: &[u8]) -> (Vec<IqSample>, Vec<FrameMeta>) {
    let mut assembler = FrameAssembler::new();

    for frame in frames {
        for block in frame {
            if skip.contains(&block.header().block_index) {
                continue;
            }
            assembler.ingest(block.as_bytes()).unwrap();
        }
    }

    assembler.flush();

    let mut samples = Vec::new();
    let mut metas = Vec::new();

    while let Some(event) = assembler.next_event() {
        match event {
            FrameEvent::Frame { meta, samples: payload, .. } => {
                metas.push(meta);
                samples.extend_from_slice(&payload);
            }
            FrameEvent::Lost { samples: payload, .. } => samples.extend_from_slice(&payload),
        }
    }

    (samples, metas)
}

fn counted_samples(len: usize) -> Vec<IqSample> {
    (0..len).map(|n| IqSample::new((2 * n + 1) as i16, (2 * n + 2) as i16)).collect()
}

#[test]
fn scenario_passthrough_single_frame() {
    // One block of counted samples is not enough to emit anything.
    let short = receive_chain(&counted_samples(127), 0, FcPosition::Centre, 0, 48_000);
    assert!(short.is_empty());

    // A full frame's worth emits exactly one frame.
    let mut samples = counted_samples(127);
    samples.resize(127 * 127, IqSample::default());

    let frames = receive_chain(&samples, 0, FcPosition::Centre, 0, 48_000);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].len(), DATA_BLOCKS);

    let meta = FrameMeta::read_from(frames[0][0].body()).unwrap();
    assert_eq!(meta.sample_rate, 48_000);
    assert_eq!(meta.fec_blocks, 0);

    // Block one carries (1, 2), (3, 4), ... as little-endian I then Q.
    assert_eq!(&frames[0][1].body()[..8], &[0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00]);

    // Blocks past the counted prefix carry the zero fill.
    assert!(frames[0][64].body().iter().all(|&b| b == 0));

    // And the whole frame survives the wire untouched.
    let (restored, metas) = transmit_chain(&frames, &[]);
    assert_eq!(restored, samples);
    assert_eq!(metas.len(), 1);
}

#[test]
fn scenario_halfband_decimation_of_a_dc_tone() {
    // A DC tone through one halfband stage: half the rate, same level.
    let input = vec![IqSample::new(16_384, 0); 2 * 127 * 127];

    let frames = receive_chain(&input, 1, FcPosition::Centre, 0, 48_000);
    assert_eq!(frames.len(), 1);

    let meta = FrameMeta::read_from(frames[0][0].body()).unwrap();
    assert_eq!(meta.sample_rate, 24_000);

    let (restored, _) = transmit_chain(&frames, &[]);
    assert_eq!(restored.len(), 127 * 127);

    // Skip the filter warm-up, then expect the DC level within ripple.
    for s in &restored[256..] {
        assert!((i32::from(s.i) - 16_384).abs() <= 170, "i = {}", s.i);
        assert!(i32::from(s.q).abs() <= 170, "q = {}", s.q);
    }
}

#[test]
fn scenario_erasure_recovery_across_data_and_parity() {
    let samples = counted_samples(127 * 127);
    let frames = receive_chain(&samples, 0, FcPosition::Centre, 8, 48_000);

    // Eight losses spread over data and parity blocks.
    let (restored, metas) = transmit_chain(&frames, &[3, 17, 45, 80, 100, 130, 131, 132]);

    assert_eq!(metas.len(), 1);
    assert_eq!(restored, samples);
}

#[test]
fn scenario_insufficient_parity_pads_with_silence() {
    let samples = counted_samples(3 * 127 * 127);

    let mut packer = FramePacker::new(params(2, 48_000));
    let mut frames = packer.push(&samples);
    // Put enough frames behind the damaged one to push it out of the window.
    frames.extend(packer.push(&counted_samples(5 * 127 * 127)));

    let mut assembler = FrameAssembler::new();

    for (n, frame) in frames.iter().enumerate() {
        for block in frame {
            // Frame 1 loses three blocks against a parity budget of two.
            if n == 1 && [5u8, 6, 7].contains(&block.header().block_index) {
                continue;
            }
            assembler.ingest(block.as_bytes()).unwrap();
        }
    }

    assembler.flush();

    let mut output = Vec::new();
    let mut lost = 0;

    while let Some(event) = assembler.next_event() {
        match event {
            FrameEvent::Frame { samples: payload, .. } => output.extend_from_slice(&payload),
            FrameEvent::Lost { samples: payload, .. } => {
                lost += 1;
                assert_eq!(payload.len(), 127 * 127);
                assert!(payload.iter().all(|s| *s == IqSample::default()));
                output.extend_from_slice(&payload);
            }
        }
    }

    assert_eq!(lost, 1);

    // The time base is preserved: the surrounding frames sit at their offsets.
    assert_eq!(&output[..127 * 127], &samples[..127 * 127]);
    assert_eq!(&output[2 * 127 * 127..3 * 127 * 127], &samples[2 * 127 * 127..3 * 127 * 127]);
    assert!(output[127 * 127..2 * 127 * 127].iter().all(|s| *s == IqSample::default()));
}

#[test]
fn scenario_lossless_round_trip_with_decimation_and_band_placement() {
    // The wire must reproduce the decimated stream bit for bit: whatever the
    // receive chain put on the link is what the transmit chain hands over.
    let mut tone = Vec::with_capacity(4 * 127 * 127);
    for n in 0..4 * 127 * 127 {
        let amp = 9_000i16;
        tone.push(match n & 3 {
            0 => IqSample::new(amp, 0),
            1 => IqSample::new(0, amp),
            2 => IqSample::new(-amp, 0),
            _ => IqSample::new(0, -amp),
        });
    }

    let mut decimator = Decimator::new(2, FcPosition::Infra);
    let mut expected = Vec::new();
    decimator.process(&tone, &mut expected);

    let frames = receive_chain(&tone, 2, FcPosition::Infra, 4, 1_000_000);
    let (restored, metas) = transmit_chain(&frames, &[]);

    assert_eq!(metas[0].sample_rate, 250_000);
    assert_eq!(restored, expected[..restored.len()]);
    // A frame's worth of the decimated stream made it across.
    assert_eq!(restored.len(), 127 * 127);
}

#[test]
fn scenario_interpolation_restores_the_output_rate() {
    let samples = vec![IqSample::new(12_000, -6_000); 127 * 127];

    let frames = receive_chain(&samples, 0, FcPosition::Centre, 0, 24_000);
    let (restored, _) = transmit_chain(&frames, &[]);

    let mut interpolator = Interpolator::new(1);
    let mut widened = Vec::new();
    interpolator.process(&restored, &mut widened);

    assert_eq!(widened.len(), 2 * 127 * 127);

    for s in &widened[512..] {
        assert!((i32::from(s.i) - 12_000).abs() <= 150, "i = {}", s.i);
        assert!((i32::from(s.q) + 6_000).abs() <= 150, "q = {}", s.q);
    }
}
