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

//! Hardware abstraction for the FPGA bridge.
//!
//! The reconfiguration sequence only needs a handful of operations from the board:
//! take the memory-mapped bridge down and bring it back, hold the FPGA in reset and
//! release it, and poke a few general purpose lines. These are collected in the
//! [`HardwareControl`] trait.
//!
//! # Platform Registration
//!
//! Implementations register a constructor under a short name at daemon startup using
//! [`register_platform`]. The `platform` key of the `[hardware]` config section picks
//! one by name through [`new_platform`].
//!
//! ```rust,no_run
//! # use balboad::config::HardwareConfig;
//! # use balboad::platforms::platform::{new_platform, register_platforms};
//! # fn example(config: &HardwareConfig) -> Result<(), balboad::error::BalboadError> {
//! register_platforms();
//! let mut hardware = new_platform(config)?;
//! hardware.enable_mapping()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Ownership
//!
//! A [`HardwareControl`] instance is owned by exactly one
//! [`ReconfigurationEngine`](crate::reconfigure::engine::ReconfigurationEngine). Nothing
//! else holds a handle to it, which is what keeps the cached GPIO masks consistent with
//! the device registers.

use crate::config::HardwareConfig;
use crate::error::BalboadError;
use crate::platforms::novena::NovenaEim;
use crate::platforms::null::NullHardware;
use log::trace;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// Type alias for platform constructor functions.
type PlatformConstructor = fn(&HardwareConfig) -> Result<Box<dyn HardwareControl>, BalboadError>;

/// Global registry of platform implementations, keyed by platform name.
static PLATFORM_REGISTRY: OnceLock<Mutex<HashMap<&'static str, PlatformConstructor>>> =
    OnceLock::new();

/// Control surface of the board that hosts the FPGA.
pub trait HardwareControl {
    /// Map the FPGA bridge into the process so the CPU can reach the fabric.
    fn enable_mapping(&mut self) -> Result<(), BalboadError>;

    /// Unmap the FPGA bridge. Must be done before the fabric is reprogrammed.
    fn disable_mapping(&mut self) -> Result<(), BalboadError>;

    /// Hold the FPGA in reset.
    fn assert_reset(&mut self) -> Result<(), BalboadError>;

    /// Release the FPGA from reset.
    fn deassert_reset(&mut self) -> Result<(), BalboadError>;

    /// Drive a general purpose line high or low without disturbing the others.
    fn set_gpio(&mut self, pin: u8, value: bool) -> Result<(), BalboadError>;

    /// Configure a general purpose line as an output (`true`) or an input (`false`).
    fn set_gpio_direction(&mut self, pin: u8, output: bool) -> Result<(), BalboadError>;

    /// Sample a general purpose line.
    fn get_gpio(&mut self, pin: u8) -> Result<bool, BalboadError>;
}

impl<H: HardwareControl + ?Sized> HardwareControl for Box<H> {
    fn enable_mapping(&mut self) -> Result<(), BalboadError> {
        (**self).enable_mapping()
    }

    fn disable_mapping(&mut self) -> Result<(), BalboadError> {
        (**self).disable_mapping()
    }

    fn assert_reset(&mut self) -> Result<(), BalboadError> {
        (**self).assert_reset()
    }

    fn deassert_reset(&mut self) -> Result<(), BalboadError> {
        (**self).deassert_reset()
    }

    fn set_gpio(&mut self, pin: u8, value: bool) -> Result<(), BalboadError> {
        (**self).set_gpio(pin, value)
    }

    fn set_gpio_direction(&mut self, pin: u8, output: bool) -> Result<(), BalboadError> {
        (**self).set_gpio_direction(pin, output)
    }

    fn get_gpio(&mut self, pin: u8) -> Result<bool, BalboadError> {
        (**self).get_gpio(pin)
    }
}

/// Number of general purpose lines exposed by the bridge.
pub const GPIO_COUNT: u8 = 8;

/// Reject pins the bridge doesn't have.
pub(crate) fn validate_pin(pin: u8) -> Result<(), BalboadError> {
    if pin >= GPIO_COUNT {
        return Err(BalboadError::Argument(format!(
            "GPIO {pin} does not exist, valid pins are 0..{GPIO_COUNT}"
        )));
    }
    Ok(())
}

/// Register a platform implementation in the global registry.
///
/// Registering the same name twice replaces the earlier constructor.
pub fn register_platform(name: &'static str, constructor: PlatformConstructor) {
    let mut registry = PLATFORM_REGISTRY
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    registry.insert(name, constructor);
}

/// Register all platforms built into the daemon.
pub fn register_platforms() {
    register_platform("novena-eim", novena_eim_platform);
    register_platform("null", null_platform);
}

fn novena_eim_platform(config: &HardwareConfig) -> Result<Box<dyn HardwareControl>, BalboadError> {
    Ok(Box::new(NovenaEim::from_config(config)))
}

fn null_platform(_config: &HardwareConfig) -> Result<Box<dyn HardwareControl>, BalboadError> {
    Ok(Box::new(NullHardware::new()))
}

/// Construct the platform named by `config.platform`.
///
/// # Returns: `Result<Box<dyn HardwareControl>, BalboadError>`
/// * `Ok(Box<dyn HardwareControl>)` - Newly constructed platform instance
/// * `Err(BalboadError::Internal)` - Registry not initialized
/// * `Err(BalboadError::Argument)` - No platform registered under that name
pub fn new_platform(config: &HardwareConfig) -> Result<Box<dyn HardwareControl>, BalboadError> {
    let constructor = {
        let registry = PLATFORM_REGISTRY
            .get()
            .ok_or(BalboadError::Internal(String::from(
                "couldn't get PLATFORM_REGISTRY",
            )))?
            .lock()
            .map_err(|_| BalboadError::Internal(String::from("couldn't lock PLATFORM_REGISTRY")))?;
        *registry.get(config.platform.as_str()).ok_or_else(|| {
            BalboadError::Argument(format!(
                "balboad could not match {} to a known platform.",
                config.platform
            ))
        })?
    };
    trace!("constructing platform '{}'", config.platform);
    constructor(config)
}
