// This file is part of balboad, an application to reconfigure an attached FPGA on request from local clients.
//
// Copyright 2025 Canonical Ltd.
//
// SPDX-License-Identifier: GPL-3.0-only
//
// balboad is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// balboad is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

//! FPGA reconfiguration daemon (balboad).
//!
//! At startup the daemon:
//! 1. Sets up logging via `env_logger`
//! 2. Registers the built-in platforms and resolves the configuration
//! 3. Detaches from the terminal unless told to stay in the foreground
//! 4. Maps the FPGA bridge, binds the socket and serves clients until a fatal error
//!
//! A fatal error is logged and the process exits with status 1.
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (`trace`, `debug`, `info`, `warn`, `error`
//!   or `off`). When unset, defaults to `info`, raised by each `-v`

use balboad::comm::multiplexer::Multiplexer;
use balboad::comm::socket::bind_listener;
use balboad::config::config_files::{ConfigLayer, DaemonSection};
use balboad::config::{DaemonConfig, load_config};
use balboad::daemonize::daemonize;
use balboad::error::BalboadError;
use balboad::platforms::platform::{new_platform, register_platforms};
use balboad::reconfigure::channel::SpiDevChannel;
use balboad::reconfigure::engine::ReconfigurationEngine;
use balboad::reconfigure::image_store::ImageStore;
use clap::{ArgAction, Parser};
use log::{debug, error, info};
use std::convert::Infallible;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "balboad", version, about)]
struct Args {
    /// Stay in the foreground instead of daemonizing
    #[arg(short = 'd', long = "foreground")]
    foreground: bool,
    /// Config file to use instead of /etc/balboad/config.toml
    #[arg(short = 'f', long = "config")]
    config: Option<PathBuf>,
    /// Directory containing the bitstream images
    #[arg(short = 's', long = "stream-dir")]
    stream_dir: Option<PathBuf>,
    /// spidev node connected to the FPGA configuration port
    #[arg(long = "spi-device")]
    spi_device: Option<PathBuf>,
    /// Path of the listening socket
    #[arg(long = "socket")]
    socket: Option<PathBuf>,
    /// More log output; repeat for even more
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            daemon: Some(DaemonSection {
                daemonize: self.foreground.then_some(false),
                stream_dir: self.stream_dir.clone(),
                spi_device: self.spi_device.clone(),
                socket_path: self.socket.clone(),
            }),
            hardware: None,
        }
    }
}

fn default_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Build the reconfiguration engine, bind the socket and run the event loop.
async fn serve(config: &DaemonConfig) -> Result<Infallible, BalboadError> {
    let mut hardware = new_platform(&config.hardware)?;
    hardware.enable_mapping()?;
    let engine = ReconfigurationEngine::new(
        hardware,
        ImageStore::new(&config.stream_dir),
        SpiDevChannel::new(&config.spi_device),
    );
    let listener = bind_listener(&config.socket_path)?;
    info!(
        "serving cores from {:?} through {:?}",
        config.stream_dir, config.spi_device
    );
    Multiplexer::new(listener, engine).run().await
}

fn start(args: &Args) -> Result<Infallible, BalboadError> {
    register_platforms();
    let config = load_config(args.config_layer(), args.config.as_deref())?;
    debug!("resolved config: {config:?}");

    if config.daemonize {
        daemonize()?;
    }

    // after daemonize(): fork only carries the calling thread into the child
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BalboadError::Internal(format!("failed to build runtime: {e}")))?;
    runtime.block_on(serve(&config))
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_log_level(args.verbose)),
    )
    .init();
    debug!("parsed arguments: {args:?}");

    match start(&args) {
        Ok(never) => match never {},
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
