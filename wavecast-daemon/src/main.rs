// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod adapters;
mod control;
mod controller;
mod net;
mod rx;
mod tx;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use clap::Arg;
use log::{error, info};

use wavecast_core::buffer::SampleQueue;
use wavecast_core::device::Direction;
use wavecast_core::errors::{Error, Result};
use wavecast_core::settings::{ChannelSettings, SharedSettings};

use crate::control::ControlServer;
use crate::controller::Controller;
use crate::net::{BlockReceiver, BlockSender};

enum Transport {
    Sender(BlockSender),
    Receiver(BlockReceiver),
}

fn main() {
    pretty_env_logger::init();

    let matches = clap::Command::new("wavecastd")
        .version("0.1.0")
        .about("Bidirectional SDR I/Q streaming daemon")
        .arg(
            Arg::new("device-type")
                .short('t')
                .long("device-type")
                .value_name("TYPE")
                .required(true)
                .help("Device type: rtlsdr|hackrf|airspy|bladerf|test|file"),
        )
        .arg(
            Arg::new("device")
                .short('d')
                .long("device")
                .value_name("INDEX")
                .default_value("0")
                .help("Device index, or 'list' to enumerate devices"),
        )
        .arg(
            Arg::new("address")
                .short('I')
                .long("address")
                .value_name("ADDRESS")
                .default_value("127.0.0.1")
                .help("Remote data address when receiving, local bind address when transmitting"),
        )
        .arg(
            Arg::new("data-port")
                .short('D')
                .long("data-port")
                .value_name("PORT")
                .default_value("9090")
                .value_parser(clap::value_parser!(u16))
                .help("Data datagram port"),
        )
        .arg(
            Arg::new("control-port")
                .short('C')
                .long("control-port")
                .value_name("PORT")
                .default_value("9091")
                .value_parser(clap::value_parser!(u16))
                .help("Control message port"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG")
                .help("Initial configuration string, same grammar as the control channel"),
        )
        .get_matches();

    if let Err(err) = run(&matches) {
        error!("fatal: {}", err);
        std::process::exit(1);
    }
}

fn run(matches: &clap::ArgMatches) -> Result<()> {
    let device_type = matches.get_one::<String>("device-type").unwrap();
    let selector = matches.get_one::<String>("device").unwrap();

    if selector == "list" {
        for (index, name) in adapters::list_devices(device_type)?.iter().enumerate() {
            println!("{}: {}", index, name);
        }
        return Ok(());
    }

    let index: usize =
        selector.parse().map_err(|_| Error::ConfigParseError("device index is not a number"))?;

    let device = adapters::open(device_type, index)?;
    let direction = device.direction();

    let address = matches.get_one::<String>("address").unwrap();
    let data_port = *matches.get_one::<u16>("data-port").unwrap();
    let control_port = *matches.get_one::<u16>("control-port").unwrap();

    // The process-wide stop flag, observed by every blocking loop.
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .map_err(|_| Error::DeviceError("cannot install signal handler"))?;
    }

    let shared = Arc::new(SharedSettings::new(ChannelSettings::default()));
    let controller = Arc::new(Mutex::new(Controller::new(device, Arc::clone(&shared))));

    // Transports and the control listener bind before streaming starts, so a
    // bad port or address is a startup failure rather than a mid-stream one.
    let transport = match direction {
        Direction::Producer => Transport::Sender(BlockSender::new(address, data_port)?),
        Direction::Consumer => Transport::Receiver(BlockReceiver::bind(address, data_port)?),
    };

    let server = ControlServer::bind("0.0.0.0", control_port)?;

    if let Some(config) = matches.get_one::<String>("config") {
        let reply = controller.lock().unwrap().apply(config);
        info!("initial configuration: {}", reply);
    }

    info!("{}", controller.lock().unwrap().describe_device());

    let queue = Arc::new(SampleQueue::new());
    controller.lock().unwrap().start_streaming(Arc::clone(&queue), Arc::clone(&stop))?;

    let control_thread = {
        let controller = Arc::clone(&controller);
        let stop = Arc::clone(&stop);

        thread::Builder::new()
            .name("wavecast-control".to_string())
            .spawn(move || server.run(controller, stop))?
    };

    match transport {
        Transport::Sender(sender) => rx::run(&controller, &queue, &shared, &sender, &stop),
        Transport::Receiver(receiver) => tx::run(&controller, &queue, &shared, &receiver, &stop),
    }

    // The worker has drained; release the control thread and join it.
    stop.store(true, Ordering::SeqCst);
    control_thread.join().map_err(|_| Error::DeviceError("control thread panicked"))?;

    info!("shutdown complete");
    Ok(())
}
