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

//! `balboa`, command-line client for balboad.
//!
//! ```bash
//! # check the daemon is up
//! balboa ping
//!
//! # load /usr/share/balboa/blinky into the FPGA
//! balboa load blinky
//! ```

mod client;

use crate::client::{SOCKET_PATH, Session};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "balboa")]
#[command(bin_name = "balboa")]
#[command(version, about)]
struct Cli {
    #[arg(
        long = "socket",
        default_value = SOCKET_PATH,
        help = "path of the socket balboad listens on"
    )]
    socket: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect and complete the handshake, then disconnect
    Ping,
    /// Ask the daemon to load a bitstream from its stream directory
    Load {
        /// Name of the bitstream, without any directory
        core: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    debug!("parsed cli command with {cli:?}");

    let mut session = Session::open(&cli.socket).await?;
    match cli.command {
        Commands::Ping => {
            println!("ok");
        }
        Commands::Load { core } => {
            session.load_core(&core).await?;
            info!("requested '{core}'");
        }
    }
    Ok(())
}
