// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::io;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Wavecast.
#[derive(Debug)]
pub enum Error {
    /// An IO error occured while reading or writing a stream or socket.
    IoError(io::Error),
    /// A configuration string could not be parsed. No state was modified.
    ConfigParseError(&'static str),
    /// A well-formed configuration value is unsupported or out of range for the device.
    ConfigRejected(&'static str),
    /// The device driver failed while streaming. The daemon transitions to Stopped.
    DeviceError(&'static str),
    /// A received datagram or block header violated the wire contract.
    ProtocolError(&'static str),
    /// The meta block checksum did not match after recovery. The frame is dropped.
    CrcFailure,
    /// Fewer than the required number of distinct blocks were available for erasure
    /// decoding. The frame is dropped.
    InsufficientBlocks,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::IoError(ref err) => err.fmt(f),
            Error::ConfigParseError(msg) => {
                f.write_str("malformed configuration: ")?;
                f.write_str(msg)
            }
            Error::ConfigRejected(msg) => {
                f.write_str("configuration rejected: ")?;
                f.write_str(msg)
            }
            Error::DeviceError(msg) => {
                f.write_str("device error: ")?;
                f.write_str(msg)
            }
            Error::ProtocolError(msg) => {
                f.write_str("protocol violation: ")?;
                f.write_str(msg)
            }
            Error::CrcFailure => f.write_str("meta block checksum mismatch"),
            Error::InsufficientBlocks => f.write_str("too few blocks to recover frame"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a configuration parse error.
pub fn parse_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::ConfigParseError(desc))
}

/// Convenience function to create a configuration rejection error.
pub fn rejected_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::ConfigRejected(desc))
}

/// Convenience function to create a device error.
pub fn device_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::DeviceError(desc))
}

/// Convenience function to create a protocol violation error.
pub fn protocol_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::ProtocolError(desc))
}
