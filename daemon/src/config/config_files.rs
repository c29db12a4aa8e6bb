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

//! TOML config file layers.
//!
//! A config file looks like this, with every key optional:
//!
//! ```toml
//! [daemon]
//! daemonize = false
//! stream_dir = "/usr/share/balboa"
//! spi_device = "/dev/spidev2.0"
//! socket_path = "/tmp/balboa.sock"
//!
//! [hardware]
//! platform = "novena-eim"
//! reset_gpio = 135
//! reset_active_low = true
//! gpio_sysfs_dir = "/sys/class/gpio"
//! ```

use crate::config::{self, DaemonConfig, HardwareConfig};
use crate::error::BalboadError;
use crate::system_io::fs_read;
use log::trace;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One source of configuration values. Unset values defer to lower-priority layers.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub daemon: Option<DaemonSection>,
    pub hardware: Option<HardwareSection>,
}

/// This is the "daemon" section struct
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonSection {
    pub daemonize: Option<bool>,
    pub stream_dir: Option<PathBuf>,
    pub spi_device: Option<PathBuf>,
    pub socket_path: Option<PathBuf>,
}

/// This is the "hardware" section struct
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HardwareSection {
    pub platform: Option<String>,
    pub reset_gpio: Option<u32>,
    pub reset_active_low: Option<bool>,
    pub gpio_sysfs_dir: Option<PathBuf>,
}

impl DaemonSection {
    fn merge(self, fallback: DaemonSection) -> DaemonSection {
        DaemonSection {
            daemonize: self.daemonize.or(fallback.daemonize),
            stream_dir: self.stream_dir.or(fallback.stream_dir),
            spi_device: self.spi_device.or(fallback.spi_device),
            socket_path: self.socket_path.or(fallback.socket_path),
        }
    }
}

impl HardwareSection {
    fn merge(self, fallback: HardwareSection) -> HardwareSection {
        HardwareSection {
            platform: self.platform.or(fallback.platform),
            reset_gpio: self.reset_gpio.or(fallback.reset_gpio),
            reset_active_low: self.reset_active_low.or(fallback.reset_active_low),
            gpio_sysfs_dir: self.gpio_sysfs_dir.or(fallback.gpio_sysfs_dir),
        }
    }
}

fn merge_sections<T>(primary: Option<T>, fallback: Option<T>, merge: fn(T, T) -> T) -> Option<T> {
    match (primary, fallback) {
        (Some(p), Some(f)) => Some(merge(p, f)),
        (p, f) => p.or(f),
    }
}

impl ConfigLayer {
    /// Combine two layers, preferring values from `self`.
    pub fn merge(self, fallback: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            daemon: merge_sections(self.daemon, fallback.daemon, DaemonSection::merge),
            hardware: merge_sections(self.hardware, fallback.hardware, HardwareSection::merge),
        }
    }

    /// Fill every unset value from the hardcoded defaults.
    pub fn resolve(self) -> DaemonConfig {
        let daemon = self.daemon.unwrap_or_default();
        let hardware = self.hardware.unwrap_or_default();
        DaemonConfig {
            daemonize: daemon.daemonize.unwrap_or(true),
            stream_dir: daemon.stream_dir.unwrap_or_else(|| {
                trace!("No stream_dir provided. Using hardcoded value.");
                PathBuf::from(config::STREAM_DIR)
            }),
            spi_device: daemon.spi_device.unwrap_or_else(|| {
                trace!("No spi_device provided. Using hardcoded value.");
                PathBuf::from(config::SPI_DEVICE)
            }),
            socket_path: daemon.socket_path.unwrap_or_else(|| {
                trace!("No socket_path provided. Using hardcoded value.");
                PathBuf::from(config::SOCKET_PATH)
            }),
            hardware: HardwareConfig {
                platform: hardware.platform.unwrap_or_else(|| config::PLATFORM.to_string()),
                reset_gpio: hardware.reset_gpio.unwrap_or(config::RESET_GPIO),
                reset_active_low: hardware.reset_active_low.unwrap_or(true),
                gpio_sysfs_dir: hardware
                    .gpio_sysfs_dir
                    .unwrap_or_else(|| PathBuf::from(config::GPIO_SYSFS_DIR)),
            },
        }
    }
}

/// Parse one config layer from a TOML string. `file` is only used for error context.
pub(crate) fn toml_str_to_layer(toml_string: &str, file: &Path) -> Result<ConfigLayer, BalboadError> {
    toml::from_str(toml_string).map_err(|e| BalboadError::TomlDe {
        file: file.into(),
        e,
    })
}

/// Read and parse the config layer stored at `file_path`.
pub fn layer_from_file(file_path: &Path) -> Result<ConfigLayer, BalboadError> {
    if !file_path.is_file() {
        return Err(BalboadError::Internal(format!(
            "Config file not found in {file_path:?}"
        )));
    }
    toml_str_to_layer(&fs_read(file_path)?, file_path)
}
