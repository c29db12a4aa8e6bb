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

//! balboad reconfigures an FPGA on request from local clients.
//!
//! Clients connect to a Unix socket, say `hi`, and then ask for bitstreams by name with
//! `core <name>`. The daemon looks the name up in its stream directory, takes the FPGA
//! off the bus and holds it in reset, streams the bitstream to the programming
//! interface, and brings it back.
//!
//! # Modules
//!
//! - [`comm`] - listening socket, wire protocol and the event loop
//! - [`reconfigure`] - image lookup and the reconfiguration sequence
//! - [`platforms`] - board support behind the [`HardwareControl`](platforms::platform::HardwareControl) trait
//! - [`config`] - layered configuration from flags and TOML files
//! - [`daemonize`] - detaching from the terminal
//! - [`error`] - the shared error type and its fatal/recoverable split
//! - [`system_io`] - logged file system helpers

pub mod comm;
pub mod config;
pub mod daemonize;
pub mod error;
pub mod platforms;
pub mod reconfigure;
pub mod system_io;
