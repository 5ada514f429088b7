// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `device` module defines the contract between the streaming engine and a
//! radio front-end driver.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::buffer::SampleQueue;
use crate::errors::Result;
use crate::sample::SampleSize;
use crate::settings::{ConfigEntry, KeyReport};

/// Which way samples flow through a device.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    /// The device produces samples; the daemon runs the receive pipeline.
    Producer,
    /// The device consumes samples; the daemon runs the transmit pipeline.
    Consumer,
}

/// The seam a radio front-end driver implements.
///
/// A producer pushes sample vectors into the queue from its own thread and marks
/// the end of the stream when it exits; a consumer pulls from the queue until the
/// end marker. Either observes the stop flag with bounded latency.
pub trait DeviceAdapter: Send {
    /// Short device name for logs and listings.
    fn name(&self) -> &str;

    fn direction(&self) -> Direction;

    /// Applies device-level configuration, one outcome per entry, in entry
    /// order. Application is best-effort: a rejected entry leaves entries
    /// already applied in effect.
    fn configure(&mut self, entries: &[ConfigEntry]) -> Vec<KeyReport>;

    /// The tuned centre frequency in Hz.
    fn frequency(&self) -> u64;

    /// The device sample rate in samples per second.
    fn sample_rate(&self) -> u32;

    /// The native component width the device delivers or expects.
    fn sample_size(&self) -> SampleSize;

    /// Starts streaming against the queue until the stop flag is raised or
    /// [`stop`](DeviceAdapter::stop) is called.
    fn start(&mut self, queue: Arc<SampleQueue>, stop: Arc<AtomicBool>) -> Result<()>;

    /// Commands the device to stop streaming and joins its thread. Idempotent.
    fn stop(&mut self) -> Result<()>;

    /// A human-readable account of device-specific parameters. Advisory only.
    fn describe(&self) -> String;
}
