// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::warn;

use wavecast_core::buffer::SampleQueue;
use wavecast_core::device::{DeviceAdapter, Direction};
use wavecast_core::errors::{device_error, Result};
use wavecast_core::sample::{IqSample, SampleSize};
use wavecast_core::settings::{ConfigEntry, KeyReport, Outcome};

/// Tunable state of the tone generator, shared with its producer thread.
#[derive(Copy, Clone)]
struct ToneParams {
    frequency_hz: u64,
    sample_rate: u32,
    /// Baseband tone placement relative to the centre, in Hz.
    tone_offset_hz: i32,
    amplitude: i16,
    block_len: usize,
}

impl Default for ToneParams {
    fn default() -> ToneParams {
        ToneParams {
            frequency_hz: 435_000_000,
            sample_rate: 256_000,
            tone_offset_hz: 0,
            amplitude: 16_384,
            block_len: 16_384,
        }
    }
}

/// A producer device that synthesizes a complex tone.
///
/// With a zero tone offset the output is a DC level of the configured
/// amplitude, which makes downstream arithmetic easy to eyeball.
pub struct TestToneSource {
    params: Arc<Mutex<ToneParams>>,
    halt: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl TestToneSource {
    pub fn new() -> TestToneSource {
        TestToneSource {
            params: Arc::new(Mutex::new(ToneParams::default())),
            halt: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl DeviceAdapter for TestToneSource {
    fn name(&self) -> &str {
        "test"
    }

    fn direction(&self) -> Direction {
        Direction::Producer
    }

    fn configure(&mut self, entries: &[ConfigEntry]) -> Vec<KeyReport> {
        let mut params = self.params.lock().unwrap();

        entries
            .iter()
            .map(|entry| {
                let outcome = match entry.key.as_str() {
                    "freq" => match entry.value.parse::<u64>() {
                        Ok(v) => {
                            params.frequency_hz = v;
                            Outcome::Ok
                        }
                        Err(_) => Outcome::Rejected("parse"),
                    },
                    "srate" => match entry.value.parse::<u32>() {
                        Ok(v) if v > 0 => {
                            params.sample_rate = v;
                            Outcome::Ok
                        }
                        Ok(_) => Outcome::Rejected("range"),
                        Err(_) => Outcome::Rejected("parse"),
                    },
                    "dfp" => match entry.value.parse::<i32>() {
                        Ok(v) => {
                            params.tone_offset_hz = v;
                            Outcome::Ok
                        }
                        Err(_) => Outcome::Rejected("parse"),
                    },
                    "dfn" => match entry.value.parse::<i32>() {
                        Ok(v) => {
                            params.tone_offset_hz = -v;
                            Outcome::Ok
                        }
                        Err(_) => Outcome::Rejected("parse"),
                    },
                    "power" => match entry.value.parse::<u32>() {
                        Ok(v) => {
                            let percent = v.min(100);
                            params.amplitude = (32_767 * percent / 100) as i16;
                            if percent == v {
                                Outcome::Ok
                            }
                            else {
                                Outcome::Clamped
                            }
                        }
                        Err(_) => Outcome::Rejected("parse"),
                    },
                    "blklen" => match entry.value.parse::<usize>() {
                        Ok(v) => {
                            params.block_len = v.clamp(256, 65_536);
                            if params.block_len == v {
                                Outcome::Ok
                            }
                            else {
                                Outcome::Clamped
                            }
                        }
                        Err(_) => Outcome::Rejected("parse"),
                    },
                    // Accepted for invocation compatibility; a synthetic source
                    // has no oscillator to trim or bias tee to switch.
                    "ppmp" | "ppmn" | "agc" | "antbias" => Outcome::Ok,
                    _ => {
                        warn!("test source ignoring unknown key '{}'", entry.key);
                        Outcome::Rejected("unknown")
                    }
                };

                KeyReport { key: entry.key.clone(), outcome }
            })
            .collect()
    }

    fn frequency(&self) -> u64 {
        self.params.lock().unwrap().frequency_hz
    }

    fn sample_rate(&self) -> u32 {
        self.params.lock().unwrap().sample_rate
    }

    fn sample_size(&self) -> SampleSize {
        SampleSize::new(2, 16)
    }

    fn start(&mut self, queue: Arc<SampleQueue>, stop: Arc<AtomicBool>) -> Result<()> {
        if self.worker.is_some() {
            return device_error("device is already streaming");
        }

        self.halt.store(false, Ordering::Relaxed);

        let params = Arc::clone(&self.params);
        let halt = Arc::clone(&self.halt);

        let worker = thread::Builder::new()
            .name("wavecast-test-source".to_string())
            .spawn(move || {
                let mut phase = 0f64;

                while !stop.load(Ordering::Relaxed) && !halt.load(Ordering::Relaxed) {
                    let p = *params.lock().unwrap();

                    let step = TAU * f64::from(p.tone_offset_hz) / f64::from(p.sample_rate);
                    let amplitude = f64::from(p.amplitude);

                    let mut block = Vec::with_capacity(p.block_len);

                    for _ in 0..p.block_len {
                        block.push(IqSample::new(
                            (amplitude * phase.cos()).round() as i16,
                            (amplitude * phase.sin()).round() as i16,
                        ));

                        phase += step;
                        if phase >= TAU {
                            phase -= TAU;
                        }
                        if phase <= -TAU {
                            phase += TAU;
                        }
                    }

                    queue.push(block);

                    // Pace roughly to the configured sample rate, the way real
                    // hardware would deliver callbacks.
                    let micros = p.block_len as u64 * 1_000_000 / u64::from(p.sample_rate);
                    thread::sleep(Duration::from_micros(micros));
                }

                queue.push_end();
            })?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.halt.store(true, Ordering::Relaxed);

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                return device_error("tone generator thread panicked");
            }
        }

        Ok(())
    }

    fn describe(&self) -> String {
        let p = *self.params.lock().unwrap();

        format!(
            "test source: {} Hz at {} S/s, tone offset {} Hz, amplitude {}, blocks of {}",
            p.frequency_hz, p.sample_rate, p.tone_offset_hz, p.amplitude, p.block_len
        )
    }
}

impl Drop for TestToneSource {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_tone_source_streams_and_stops() {
        let mut source = TestToneSource::new();

        // Small blocks so the test does not wait on pacing.
        source.configure(&[
            ConfigEntry { key: "blklen".into(), value: "256".into() },
            ConfigEntry { key: "srate".into(), value: "1000000".into() },
        ]);

        let queue = Arc::new(SampleQueue::new());
        let stop = Arc::new(AtomicBool::new(false));

        source.start(Arc::clone(&queue), Arc::clone(&stop)).unwrap();

        let block = queue.pull();
        assert_eq!(block.len(), 256);
        // Zero offset means a DC level at the default amplitude.
        assert!(block.iter().all(|s| s.i == 16_384 && s.q == 0));

        source.stop().unwrap();

        // After the end marker the queue drains to empty vectors.
        loop {
            if queue.pull().is_empty() {
                break;
            }
        }
    }

    #[test]
    fn verify_configure_reports() {
        let mut source = TestToneSource::new();

        let reports = source.configure(&[
            ConfigEntry { key: "freq".into(), value: "433970000".into() },
            ConfigEntry { key: "power".into(), value: "200".into() },
            ConfigEntry { key: "bogus".into(), value: "1".into() },
        ]);

        assert_eq!(reports[0].outcome, Outcome::Ok);
        assert_eq!(reports[1].outcome, Outcome::Clamped);
        assert_eq!(reports[2].outcome, Outcome::Rejected("unknown"));

        assert_eq!(source.frequency(), 433_970_000);
    }
}
