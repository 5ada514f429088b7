// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{error, info, warn};

use wavecast_core::buffer::SampleQueue;
use wavecast_core::device::{DeviceAdapter, Direction};
use wavecast_core::errors::{device_error, Result};
use wavecast_core::sample::SampleSize;
use wavecast_core::settings::{ConfigEntry, KeyReport, Outcome};

#[derive(Clone)]
struct SinkParams {
    path: Option<PathBuf>,
    frequency_hz: u64,
    sample_rate: u32,
}

impl Default for SinkParams {
    fn default() -> SinkParams {
        SinkParams { path: None, frequency_hz: 435_000_000, sample_rate: 256_000 }
    }
}

/// A consumer device that writes the reassembled stream to a file as
/// interleaved little-endian 16-bit I/Q.
pub struct FileSink {
    params: Arc<Mutex<SinkParams>>,
    halt: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FileSink {
    pub fn new() -> FileSink {
        FileSink {
            params: Arc::new(Mutex::new(SinkParams::default())),
            halt: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl DeviceAdapter for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn direction(&self) -> Direction {
        Direction::Consumer
    }

    fn configure(&mut self, entries: &[ConfigEntry]) -> Vec<KeyReport> {
        let mut params = self.params.lock().unwrap();

        entries
            .iter()
            .map(|entry| {
                let outcome = match entry.key.as_str() {
                    "file" => {
                        if entry.value.is_empty() {
                            Outcome::Rejected("empty path")
                        }
                        else {
                            params.path = Some(PathBuf::from(&entry.value));
                            Outcome::Ok
                        }
                    }
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
                    _ => {
                        warn!("file sink ignoring unknown key '{}'", entry.key);
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

        let (path, sample_rate) = {
            let params = self.params.lock().unwrap();
            match &params.path {
                Some(path) => (path.clone(), params.sample_rate),
                None => return device_error("no output file configured"),
            }
        };

        let file = File::create(&path)?;
        info!("writing stream to {}", path.display());

        self.halt.store(false, Ordering::Relaxed);
        let halt = Arc::clone(&self.halt);

        let worker = thread::Builder::new()
            .name("wavecast-file-sink".to_string())
            .spawn(move || {
                let mut writer = BufWriter::new(file);
                let mut failed = false;

                // Let a little of the stream accumulate so writing starts in
                // steady chunks rather than a trickle.
                queue.wait_min_fill(sample_rate as usize / 4, Duration::from_millis(500));

                loop {
                    let samples = match queue.pull_timeout(Duration::from_millis(100)) {
                        // Idle: only leave once told to, so the queue drains in
                        // full before shutdown.
                        None => {
                            if halt.load(Ordering::Relaxed) || stop.load(Ordering::Relaxed) {
                                break;
                            }
                            continue;
                        }
                        Some(samples) if samples.is_empty() => break,
                        Some(samples) => samples,
                    };

                    if failed {
                        // Keep draining so the producer side stays bounded.
                        continue;
                    }

                    for s in &samples {
                        let pair = [
                            s.i.to_le_bytes()[0],
                            s.i.to_le_bytes()[1],
                            s.q.to_le_bytes()[0],
                            s.q.to_le_bytes()[1],
                        ];

                        if let Err(err) = writer.write_all(&pair) {
                            error!("file sink write failed: {}", err);
                            failed = true;
                            break;
                        }
                    }
                }

                if let Err(err) = writer.flush() {
                    error!("file sink flush failed: {}", err);
                }
            })?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.halt.store(true, Ordering::Relaxed);

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                return device_error("file sink thread panicked");
            }
        }

        Ok(())
    }

    fn describe(&self) -> String {
        let params = self.params.lock().unwrap();

        match &params.path {
            Some(path) => format!(
                "file sink: {} at {} S/s into {}",
                params.frequency_hz,
                params.sample_rate,
                path.display()
            ),
            None => "file sink: no output file configured".to_string(),
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use wavecast_core::sample::IqSample;

    #[test]
    fn verify_sink_requires_a_path() {
        let mut sink = FileSink::new();
        let queue = Arc::new(SampleQueue::new());
        let stop = Arc::new(AtomicBool::new(false));

        assert!(sink.start(queue, stop).is_err());
    }

    #[test]
    fn verify_sink_writes_interleaved_le_pairs() {
        let path = std::env::temp_dir().join("wavecast-file-sink-test.raw");
        let _ = fs::remove_file(&path);

        let mut sink = FileSink::new();
        sink.configure(&[ConfigEntry {
            key: "file".into(),
            value: path.to_string_lossy().into_owned(),
        }]);

        let queue = Arc::new(SampleQueue::new());
        let stop = Arc::new(AtomicBool::new(false));

        sink.start(Arc::clone(&queue), stop).unwrap();

        queue.push(vec![IqSample::new(1, 2), IqSample::new(-1, 256)]);
        queue.push_end();

        sink.stop().unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes, [0x01, 0x00, 0x02, 0x00, 0xff, 0xff, 0x00, 0x01]);

        let _ = fs::remove_file(&path);
    }
}
