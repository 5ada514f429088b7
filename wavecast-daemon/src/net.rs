// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Datagram transport for the block stream.

use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::thread;
use std::time::Duration;

use wavecast_core::errors::{Error, Result};
use wavecast_core::frame::Block;

/// How long a blocking receive waits before letting the caller observe the stop
/// flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sends frame blocks as individual datagrams with a pacing floor in between.
pub struct BlockSender {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl BlockSender {
    pub fn new(address: &str, port: u16) -> Result<BlockSender> {
        let destination = (address, port)
            .to_socket_addrs()?
            .next()
            .ok_or(Error::ConfigRejected("data address does not resolve"))?;

        let socket = UdpSocket::bind(("0.0.0.0", 0))?;

        Ok(BlockSender { socket, destination })
    }

    /// Sends each block in order, sleeping `delay_us` after every datagram.
    ///
    /// The delay is a floor: the operating system may stretch both the sleep and
    /// the send itself. Datagrams are never retried; loss is the erasure code's
    /// concern.
    pub fn send_blocks(&self, blocks: &[Block], delay_us: u32) -> Result<()> {
        for block in blocks {
            self.socket.send_to(block.as_bytes(), self.destination)?;

            if delay_us > 0 {
                thread::sleep(Duration::from_micros(u64::from(delay_us)));
            }
        }

        Ok(())
    }
}

/// Receives datagrams for the frame assembler.
pub struct BlockReceiver {
    socket: UdpSocket,
}

impl BlockReceiver {
    pub fn bind(address: &str, port: u16) -> Result<BlockReceiver> {
        let socket = UdpSocket::bind((address, port))?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;

        Ok(BlockReceiver { socket })
    }

    /// Waits for one datagram. Returns `None` on timeout so the caller can poll
    /// the stop flag.
    ///
    /// The buffer is larger than a block so oversized datagrams arrive with
    /// their real length and can be rejected instead of silently truncated.
    pub fn recv<'a>(&self, buf: &'a mut [u8; 1024]) -> Result<Option<&'a [u8]>> {
        match self.socket.recv_from(buf) {
            Ok((len, _)) => Ok(Some(&buf[..len])),
            Err(err)
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wavecast_core::frame::{BODY_SIZE, BLOCK_SIZE};

    #[test]
    fn verify_loopback_block_delivery() {
        let receiver = BlockReceiver::bind("127.0.0.1", 0).unwrap();
        let port = receiver.socket.local_addr().unwrap().port();

        let sender = BlockSender::new("127.0.0.1", port).unwrap();

        let body = [0x5au8; BODY_SIZE];
        let blocks = vec![Block::new(7, 0, &body), Block::new(7, 1, &body)];
        sender.send_blocks(&blocks, 0).unwrap();

        let mut buf = [0u8; 1024];

        let first = receiver.recv(&mut buf).unwrap().unwrap();
        assert_eq!(first.len(), BLOCK_SIZE);
        assert_eq!(&first[..4], &[7, 0, 0, 0]);

        let second = receiver.recv(&mut buf).unwrap().unwrap();
        assert_eq!(second[2], 1);
    }

    #[test]
    fn verify_pacing_floor() {
        let receiver = BlockReceiver::bind("127.0.0.1", 0).unwrap();
        let port = receiver.socket.local_addr().unwrap().port();
        let sender = BlockSender::new("127.0.0.1", port).unwrap();

        let body = [0u8; BODY_SIZE];
        let blocks: Vec<Block> = (0..10).map(|n| Block::new(0, n, &body)).collect();

        let start = std::time::Instant::now();
        sender.send_blocks(&blocks, 2_000).unwrap();

        // Ten datagrams, a 2 ms floor after each. The sleep may stretch but
        // never shrinks.
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn verify_recv_times_out_quietly() {
        let receiver = BlockReceiver::bind("127.0.0.1", 0).unwrap();

        let mut buf = [0u8; 1024];
        assert!(receiver.recv(&mut buf).unwrap().is_none());
    }
}
