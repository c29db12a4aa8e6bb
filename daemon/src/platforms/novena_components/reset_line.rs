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

//! FPGA reset line driven through the sysfs GPIO class.
//!
//! ```text
//! /sys/class/gpio
//! ├── export
//! └── gpio135
//!     ├── direction
//!     └── value
//! ```
//! The line is exported on first use if `gpio<N>` doesn't exist yet, then switched to
//! an output.

use crate::error::BalboadError;
use crate::system_io::fs_write;
use log::trace;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct SysfsResetLine {
    sysfs_dir: PathBuf,
    number: u32,
    active_low: bool,
    configured: bool,
}

impl SysfsResetLine {
    pub fn new(sysfs_dir: &Path, number: u32, active_low: bool) -> Self {
        SysfsResetLine {
            sysfs_dir: sysfs_dir.to_owned(),
            number,
            active_low,
            configured: false,
        }
    }

    fn line_dir(&self) -> PathBuf {
        self.sysfs_dir.join(format!("gpio{}", self.number))
    }

    fn configure(&mut self) -> Result<(), BalboadError> {
        if self.configured {
            return Ok(());
        }
        if !self.line_dir().exists() {
            trace!("exporting gpio{}", self.number);
            fs_write(&self.sysfs_dir.join("export"), false, self.number.to_string())?;
        }
        fs_write(&self.line_dir().join("direction"), false, "out")?;
        self.configured = true;
        Ok(())
    }

    /// Drive the line to its active (`true`) or inactive level.
    pub fn set_asserted(&mut self, asserted: bool) -> Result<(), BalboadError> {
        self.configure()?;
        let high = asserted != self.active_low;
        fs_write(
            &self.line_dir().join("value"),
            false,
            if high { "1" } else { "0" },
        )
    }
}
