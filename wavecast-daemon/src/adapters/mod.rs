// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device adapters shipped with the daemon, and the registry that opens them.
//!
//! The hardware front-ends (`rtlsdr`, `hackrf`, `airspy`, `bladerf`) live in
//! driver crates that are not part of this build; selecting one resolves to a
//! clear startup error. The `test` tone generator and the `file` sink are built
//! in so the daemon can run and be verified end to end without hardware.

mod file;
mod test;

pub use file::FileSink;
pub use test::TestToneSource;

use wavecast_core::device::DeviceAdapter;
use wavecast_core::errors::{device_error, Result};

/// Names the devices available for a device type.
pub fn list_devices(kind: &str) -> Result<Vec<String>> {
    match kind {
        "test" => Ok(vec!["Deterministic tone generator".to_string()]),
        "file" => Ok(vec!["Raw I/Q file sink".to_string()]),
        "rtlsdr" | "hackrf" | "airspy" | "bladerf" => {
            device_error("device driver is not built into this binary")
        }
        _ => device_error("unknown device type"),
    }
}

/// Opens device `index` of the given type.
pub fn open(kind: &str, index: usize) -> Result<Box<dyn DeviceAdapter>> {
    if index != 0 {
        return device_error("no such device index");
    }

    match kind {
        "test" => Ok(Box::new(TestToneSource::new())),
        "file" => Ok(Box::new(FileSink::new())),
        "rtlsdr" | "hackrf" | "airspy" | "bladerf" => {
            device_error("device driver is not built into this binary")
        }
        _ => device_error("unknown device type"),
    }
}
