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

//! Headless platform for bring-up on machines without an FPGA bridge.
//!
//! Every operation succeeds and is logged. GPIO lines read back whatever was last
//! driven onto them.

use crate::error::BalboadError;
use crate::platforms::platform::{HardwareControl, validate_pin};
use log::info;

#[derive(Debug, Default)]
pub struct NullHardware {
    cached_dout: u8,
    cached_dir: u8,
}

impl NullHardware {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HardwareControl for NullHardware {
    fn enable_mapping(&mut self) -> Result<(), BalboadError> {
        info!("null platform: enable mapping");
        Ok(())
    }

    fn disable_mapping(&mut self) -> Result<(), BalboadError> {
        info!("null platform: disable mapping");
        Ok(())
    }

    fn assert_reset(&mut self) -> Result<(), BalboadError> {
        info!("null platform: assert reset");
        Ok(())
    }

    fn deassert_reset(&mut self) -> Result<(), BalboadError> {
        info!("null platform: deassert reset");
        Ok(())
    }

    fn set_gpio(&mut self, pin: u8, value: bool) -> Result<(), BalboadError> {
        validate_pin(pin)?;
        if value {
            self.cached_dout |= 1 << pin;
        } else {
            self.cached_dout &= !(1 << pin);
        }
        Ok(())
    }

    fn set_gpio_direction(&mut self, pin: u8, output: bool) -> Result<(), BalboadError> {
        validate_pin(pin)?;
        if output {
            self.cached_dir |= 1 << pin;
        } else {
            self.cached_dir &= !(1 << pin);
        }
        Ok(())
    }

    fn get_gpio(&mut self, pin: u8) -> Result<bool, BalboadError> {
        validate_pin(pin)?;
        Ok((self.cached_dout >> pin) & 1 == 1)
    }
}
