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

//! Daemon configuration.
//!
//! The configuration is resolved exactly once at startup from, in decreasing priority:
//! command-line flags, the user config file, the vendor config file and the hardcoded
//! values in this module. The resulting [`DaemonConfig`] is immutable for the lifetime
//! of the process.
//!
//! See [`config_files`] for the file format.

pub mod config_files;

use crate::config::config_files::{ConfigLayer, layer_from_file};
use crate::error::BalboadError;
use log::{trace, warn};
use std::path::{Path, PathBuf};

/// Directory holding the bitstream images that clients refer to by name.
pub static STREAM_DIR: &str = "/usr/share/balboa";

/// The spidev node wired to the FPGA's serial configuration port.
pub static SPI_DEVICE: &str = "/dev/spidev2.0";

/// Filesystem address of the listening socket.
pub static SOCKET_PATH: &str = "/tmp/balboa.sock";

/// Name of the [`HardwareControl`](crate::platforms::platform::HardwareControl)
/// implementation to use.
pub static PLATFORM: &str = "novena-eim";

/// Root of the sysfs GPIO class. Typically `/sys/class/gpio`.
pub static GPIO_SYSFS_DIR: &str = "/sys/class/gpio";

/// Kernel GPIO number of the FPGA reset line on Novena.
pub const RESET_GPIO: u32 = 135;

pub static VENDOR_CONFIG_PATH: &str = "/usr/lib/balboad/config.toml";
pub static USER_CONFIG_PATH: &str = "/etc/balboad/config.toml";

/// Fully resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub daemonize: bool,
    pub stream_dir: PathBuf,
    pub spi_device: PathBuf,
    pub socket_path: PathBuf,
    pub hardware: HardwareConfig,
}

/// Settings consumed by the hardware platform constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareConfig {
    pub platform: String,
    pub reset_gpio: u32,
    pub reset_active_low: bool,
    pub gpio_sysfs_dir: PathBuf,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        ConfigLayer::default().resolve()
    }
}

/// Resolve the daemon configuration.
///
/// `cli_layer` holds whatever was given on the command line. When `explicit_file` is
/// set it replaces the user config file and, unlike the default locations, failing to
/// read or parse it is an error.
///
/// # Returns: `Result<DaemonConfig, BalboadError>`
/// * `Ok(DaemonConfig)` - The merged configuration
/// * `Err(BalboadError)` - The explicitly requested config file was unusable
pub fn load_config(
    cli_layer: ConfigLayer,
    explicit_file: Option<&Path>,
) -> Result<DaemonConfig, BalboadError> {
    let vendor_layer = layer_from_file(Path::new(VENDOR_CONFIG_PATH)).unwrap_or_else(|e| {
        warn!("Using hardcoded values for vendor config because loading config failed: {e}");
        ConfigLayer::default()
    });
    let user_layer = match explicit_file {
        Some(path) => layer_from_file(path)?,
        None => layer_from_file(Path::new(USER_CONFIG_PATH)).unwrap_or_else(|e| {
            warn!("Using hardcoded values for user config because loading config failed: {e}");
            ConfigLayer::default()
        }),
    };
    trace!("Merging cli: {cli_layer:?}, user: {user_layer:?}, vendor: {vendor_layer:?}");
    let config = cli_layer.merge(user_layer).merge(vendor_layer).resolve();
    trace!("Resulting config: {config:?}");
    Ok(config)
}
