// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `settings` module implements the live configuration vocabulary: the
//! `key[=value](,key[=value])*` grammar, the per-key outcome report, and the
//! sequence-numbered settings snapshot the streaming workers re-read at frame
//! boundaries.

use std::fmt;
use std::sync::Mutex;

use crate::dsp::{FcPosition, MAX_LOG2_FACTOR};
use crate::errors::{parse_error, Result};
use crate::fec;
use crate::sample::SampleSize;

/// One `key[=value]` element of a configuration string.
///
/// A bare key is a boolean switch and carries an implied value of `1`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

/// Splits a configuration string into entries.
///
/// The grammar is purely structural; value interpretation is left to whoever
/// owns each key. An empty string yields no entries.
pub fn parse_config(config: &str) -> Result<Vec<ConfigEntry>> {
    let mut entries = Vec::new();

    if config.is_empty() {
        return Ok(entries);
    }

    for element in config.split(',') {
        let (key, value) = match element.split_once('=') {
            Some((key, value)) => (key, value),
            None => (element, "1"),
        };

        if key.is_empty() {
            return parse_error("empty configuration key");
        }

        entries.push(ConfigEntry { key: key.to_string(), value: value.to_string() });
    }

    Ok(entries)
}

/// The fate of one configuration key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Applied as given.
    Ok,
    /// Applied after being limited to the supported range.
    Clamped,
    /// Not applied, for the stated reason.
    Rejected(&'static str),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Outcome::Ok => f.write_str("ok"),
            Outcome::Clamped => f.write_str("clamped"),
            Outcome::Rejected(reason) => {
                f.write_str("rejected:")?;
                f.write_str(reason)
            }
        }
    }
}

/// One key's outcome, echoed back over the control channel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyReport {
    pub key: String,
    pub outcome: Outcome,
}

impl KeyReport {
    pub fn new(key: &str, outcome: Outcome) -> KeyReport {
        KeyReport { key: key.to_string(), outcome }
    }
}

impl fmt::Display for KeyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.outcome)
    }
}

/// Renders a reply message from per-key reports, mirroring request key order.
pub fn format_reports(reports: &[KeyReport]) -> String {
    reports.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(",")
}

/// The DSP and packaging parameters of one streaming channel.
///
/// `center_frequency_hz` and `sample_rate` mirror the device so the packer can
/// describe the stream; the remaining fields are owned here.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChannelSettings {
    pub center_frequency_hz: u64,
    pub sample_rate: u32,
    /// The component width delivered or expected by the device.
    pub device_sample: SampleSize,
    pub log2_decim: u32,
    pub log2_interp: u32,
    pub fc_position: FcPosition,
    pub fec_blocks: u8,
    pub tx_delay_us: u32,
}

impl Default for ChannelSettings {
    fn default() -> ChannelSettings {
        ChannelSettings {
            center_frequency_hz: 100_000_000,
            sample_rate: 48_000,
            device_sample: SampleSize::new(2, 16),
            log2_decim: 0,
            log2_interp: 0,
            fc_position: FcPosition::Centre,
            fec_blocks: 0,
            tx_delay_us: 0,
        }
    }
}

/// Whether `key` belongs to the streaming core rather than the device adapter.
pub fn is_stream_key(key: &str) -> bool {
    matches!(key, "decim" | "interp" | "fcpos" | "fecblk" | "txdelay")
}

/// Applies one streaming key to `settings`, clamping values the pipeline cannot
/// honor as given. Returns the outcome to report for the key.
pub fn apply_stream_key(settings: &mut ChannelSettings, key: &str, value: &str) -> Outcome {
    match key {
        "decim" => match value.parse::<u32>() {
            Ok(v) if v <= MAX_LOG2_FACTOR => {
                settings.log2_decim = v;
                Outcome::Ok
            }
            Ok(_) => {
                settings.log2_decim = MAX_LOG2_FACTOR;
                Outcome::Clamped
            }
            Err(_) => Outcome::Rejected("parse"),
        },
        "interp" => match value.parse::<u32>() {
            Ok(v) if v <= MAX_LOG2_FACTOR => {
                settings.log2_interp = v;
                Outcome::Ok
            }
            Ok(_) => {
                settings.log2_interp = MAX_LOG2_FACTOR;
                Outcome::Clamped
            }
            Err(_) => Outcome::Rejected("parse"),
        },
        "fcpos" => match value.parse::<u32>() {
            Ok(code) => match FcPosition::from_code(code) {
                Some(position) => {
                    settings.fc_position = position;
                    Outcome::Ok
                }
                None => Outcome::Rejected("range"),
            },
            Err(_) => Outcome::Rejected("parse"),
        },
        "fecblk" => match value.parse::<u32>() {
            Ok(v) if v as usize <= fec::MAX_PARITY_BLOCKS => {
                settings.fec_blocks = v as u8;
                Outcome::Ok
            }
            Ok(_) => {
                settings.fec_blocks = fec::MAX_PARITY_BLOCKS as u8;
                Outcome::Clamped
            }
            Err(_) => Outcome::Rejected("parse"),
        },
        "txdelay" => match value.parse::<u32>() {
            Ok(v) => {
                settings.tx_delay_us = v;
                Outcome::Ok
            }
            Err(_) => Outcome::Rejected("parse"),
        },
        _ => Outcome::Rejected("unknown"),
    }
}

/// A sequence-numbered settings snapshot shared between the controller and the
/// streaming worker.
///
/// The controller mutates under the lock and bumps the sequence; the worker
/// compares sequences at frame boundaries only, so parameters never change
/// inside a frame.
pub struct SharedSettings {
    inner: Mutex<(u64, ChannelSettings)>,
}

impl SharedSettings {
    pub fn new(initial: ChannelSettings) -> SharedSettings {
        SharedSettings { inner: Mutex::new((0, initial)) }
    }

    /// Gets the current sequence number and settings, atomically.
    pub fn load(&self) -> (u64, ChannelSettings) {
        *self.inner.lock().unwrap()
    }

    /// Mutates the settings and publishes them under a new sequence number.
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut ChannelSettings),
    {
        let mut inner = self.inner.lock().unwrap();
        mutate(&mut inner.1);
        inner.0 += 1;
    }
}
