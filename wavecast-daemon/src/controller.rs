// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Live reconfiguration: parsing whole batches, steering device keys to the
//! adapter, and publishing stream keys as one atomic snapshot.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::{info, warn};

use wavecast_core::buffer::SampleQueue;
use wavecast_core::device::{DeviceAdapter, Direction};
use wavecast_core::errors::Result;
use wavecast_core::settings::{
    apply_stream_key, format_reports, is_stream_key, parse_config, ConfigEntry, KeyReport,
    Outcome, SharedSettings,
};

/// Owns the device adapter and the shared settings snapshot, and turns control
/// messages into applied configuration.
pub struct Controller {
    device: Box<dyn DeviceAdapter>,
    shared: Arc<SharedSettings>,
}

impl Controller {
    pub fn new(device: Box<dyn DeviceAdapter>, shared: Arc<SharedSettings>) -> Controller {
        let mut controller = Controller { device, shared };
        controller.mirror_device();
        controller
    }

    pub fn direction(&self) -> Direction {
        self.device.direction()
    }

    pub fn describe_device(&self) -> String {
        self.device.describe()
    }

    pub fn start_streaming(&mut self, queue: Arc<SampleQueue>, stop: Arc<AtomicBool>) -> Result<()> {
        info!("starting {} device", self.device.name());
        self.device.start(queue, stop)
    }

    /// Commands the device to stop. Safe to call more than once.
    pub fn stop_streaming(&mut self) {
        if let Err(err) = self.device.stop() {
            warn!("device stop reported: {}", err);
        }
    }

    /// Applies one configuration string and renders the per-key reply.
    ///
    /// The batch is applied in three steps: device keys through the adapter
    /// first, then DSP keys, then packaging keys, the latter two as one
    /// atomic snapshot update. A stream key that fails to parse voids the whole
    /// batch; device-side rejections are per-key and leave earlier keys applied.
    pub fn apply(&mut self, config: &str) -> String {
        let entries = match parse_config(config) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("control message rejected: {}", err);
                return "config=rejected:parse".to_string();
            }
        };

        if entries.is_empty() {
            return String::new();
        }

        // Stage stream keys against a scratch copy so nothing is published until
        // the whole batch is known to parse.
        let (_, mut staged) = self.shared.load();

        let mut outcomes: Vec<Option<Outcome>> = vec![None; entries.len()];
        let mut batch_ok = true;

        for (n, entry) in entries.iter().enumerate() {
            if is_stream_key(&entry.key) {
                let outcome = apply_stream_key(&mut staged, &entry.key, &entry.value);

                if outcome == Outcome::Rejected("parse") {
                    batch_ok = false;
                }

                outcomes[n] = Some(outcome);
            }
        }

        if !batch_ok {
            let reports: Vec<KeyReport> = entries
                .iter()
                .zip(outcomes)
                .map(|(entry, outcome)| {
                    let outcome = match outcome {
                        Some(outcome @ Outcome::Rejected(_)) => outcome,
                        _ => Outcome::Rejected("unapplied"),
                    };
                    KeyReport { key: entry.key.clone(), outcome }
                })
                .collect();

            warn!("configuration batch not applied: {}", format_reports(&reports));
            return format_reports(&reports);
        }

        // Device keys are applied first, in request order.
        let device_entries: Vec<ConfigEntry> =
            entries.iter().filter(|e| !is_stream_key(&e.key)).cloned().collect();

        let device_reports = self.device.configure(&device_entries);

        let mut device_reports = device_reports.into_iter();
        for (n, entry) in entries.iter().enumerate() {
            if !is_stream_key(&entry.key) {
                outcomes[n] = device_reports.next().map(|report| report.outcome);
            }
        }

        // One critical section publishes the DSP and packaging keys along with
        // the device mirror, so the worker never sees a half-applied batch.
        let frequency = self.device.frequency();
        let sample_rate = self.device.sample_rate();
        let device_sample = self.device.sample_size();

        self.shared.update(|settings| {
            *settings = staged;
            settings.center_frequency_hz = frequency;
            settings.sample_rate = sample_rate;
            settings.device_sample = device_sample;
        });

        let reports: Vec<KeyReport> = entries
            .iter()
            .zip(outcomes)
            .map(|(entry, outcome)| KeyReport {
                key: entry.key.clone(),
                outcome: outcome.unwrap_or(Outcome::Rejected("unknown")),
            })
            .collect();

        let reply = format_reports(&reports);
        info!("configuration applied: {}", reply);
        reply
    }

    /// Copies the device's current tuning into the shared snapshot.
    fn mirror_device(&mut self) {
        let frequency = self.device.frequency();
        let sample_rate = self.device.sample_rate();
        let device_sample = self.device.sample_size();

        self.shared.update(|settings| {
            settings.center_frequency_hz = frequency;
            settings.sample_rate = sample_rate;
            settings.device_sample = device_sample;
        });
    }
}
