// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod checksum;
pub mod device;
pub mod dsp;
pub mod errors;
pub mod fec;
pub mod frame;
pub mod sample;
pub mod settings;
