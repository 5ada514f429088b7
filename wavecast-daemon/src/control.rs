// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The control channel: a paired, message-oriented transport over TCP.
//!
//! One peer is served at a time; connections arriving while a peer is active are
//! closed immediately. Messages are UTF-8 configuration strings framed by a
//! 4-byte little-endian length prefix, and every message is answered, in order,
//! with the per-key outcome report.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{info, warn};

use wavecast_core::errors::{protocol_error, Result};

use crate::controller::Controller;
use crate::net::POLL_INTERVAL;

/// Upper bound on one control message's payload.
pub const MAX_MESSAGE_SIZE: usize = 4096;

pub struct ControlServer {
    listener: TcpListener,
}

impl ControlServer {
    pub fn bind(address: &str, port: u16) -> Result<ControlServer> {
        let listener = TcpListener::bind((address, port))?;
        listener.set_nonblocking(true)?;

        Ok(ControlServer { listener })
    }

    /// Serves peers until the stop flag is raised.
    pub fn run(&self, controller: Arc<Mutex<Controller>>, stop: Arc<AtomicBool>) {
        while !stop.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!("control peer connected: {}", peer);

                    if let Err(err) = self.serve(stream, &controller, &stop) {
                        warn!("control peer dropped: {}", err);
                    }
                    else {
                        info!("control peer disconnected");
                    }
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(POLL_INTERVAL);
                }
                Err(err) => {
                    warn!("control accept failed: {}", err);
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }
    }

    /// Runs one peer's request/reply conversation to completion.
    fn serve(
        &self,
        mut stream: TcpStream,
        controller: &Mutex<Controller>,
        stop: &AtomicBool,
    ) -> Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(POLL_INTERVAL))?;

        let mut pending = Vec::new();
        let mut chunk = [0u8; 1024];

        while !stop.load(Ordering::Relaxed) {
            // The channel is paired: turn away anyone else who shows up.
            if let Ok((extra, peer)) = self.listener.accept() {
                warn!("refusing second control connection from {}", peer);
                drop(extra);
            }

            match stream.read(&mut chunk) {
                Ok(0) => return Ok(()),
                Ok(n) => {
                    pending.extend_from_slice(&chunk[..n]);

                    while let Some(message) = take_message(&mut pending)? {
                        let reply = controller.lock().unwrap().apply(&message);
                        write_message(&mut stream, &reply)?;
                    }
                }
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock
                        || err.kind() == ErrorKind::TimedOut => {}
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }
}

/// Extracts one complete length-prefixed message, if buffered.
fn take_message(pending: &mut Vec<u8>) -> Result<Option<String>> {
    if pending.len() < 4 {
        return Ok(None);
    }

    let len = u32::from_le_bytes([pending[0], pending[1], pending[2], pending[3]]) as usize;

    if len > MAX_MESSAGE_SIZE {
        return protocol_error("control message too large");
    }

    if pending.len() < 4 + len {
        return Ok(None);
    }

    let bytes: Vec<u8> = pending.drain(..4 + len).skip(4).collect();

    match String::from_utf8(bytes) {
        Ok(message) => Ok(Some(message)),
        Err(_) => protocol_error("control message is not utf-8"),
    }
}

/// Writes one length-prefixed message.
fn write_message(stream: &mut TcpStream, message: &str) -> Result<()> {
    let bytes = message.as_bytes();

    stream.write_all(&(bytes.len() as u32).to_le_bytes())?;
    stream.write_all(bytes)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(message: &str) -> Vec<u8> {
        let mut bytes = (message.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(message.as_bytes());
        bytes
    }

    #[test]
    fn verify_framing_round_trip() {
        let mut pending = framed("decim=3");
        pending.extend_from_slice(&framed("fecblk=8"));

        assert_eq!(take_message(&mut pending).unwrap().unwrap(), "decim=3");
        assert_eq!(take_message(&mut pending).unwrap().unwrap(), "fecblk=8");
        assert!(take_message(&mut pending).unwrap().is_none());
    }

    #[test]
    fn verify_partial_messages_wait_for_more_bytes() {
        let full = framed("txdelay=350");

        let mut pending = full[..3].to_vec();
        assert!(take_message(&mut pending).unwrap().is_none());

        pending.extend_from_slice(&full[3..7]);
        assert!(take_message(&mut pending).unwrap().is_none());

        pending.extend_from_slice(&full[7..]);
        assert_eq!(take_message(&mut pending).unwrap().unwrap(), "txdelay=350");
    }

    #[test]
    fn verify_oversized_message_is_refused() {
        let mut pending = ((MAX_MESSAGE_SIZE + 1) as u32).to_le_bytes().to_vec();
        pending.extend_from_slice(&[b'a'; 16]);

        assert!(take_message(&mut pending).is_err());
    }

    #[test]
    fn verify_non_utf8_message_is_refused() {
        let mut pending = 2u32.to_le_bytes().to_vec();
        pending.extend_from_slice(&[0xff, 0xfe]);

        assert!(take_message(&mut pending).is_err());
    }
}
