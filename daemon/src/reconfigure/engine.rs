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

//! The reconfiguration sequence.
//!
//! ```text
//!  Mapped-Idle ──unmap──> Unmapped ──reset──> In-Reset ──stream──> Streamed
//!       ^                                                              │
//!       └──────────────remap────────── Released <──────release─────────┘
//! ```
//!
//! The image is read and validated before the first hardware step, so a bad request
//! never disturbs a running FPGA. Once the hardware has been touched, any failure is
//! fatal: the engine makes no attempt to roll back, and the error is handed up for the
//! daemon to exit on.

use crate::error::BalboadError;
use crate::platforms::platform::HardwareControl;
use crate::reconfigure::channel::{ProgrammingChannel, stream_blocks};
use crate::reconfigure::image_store::{CoreIdentifier, ImageStore};
use log::{debug, info};

/// Sole owner of the FPGA hardware and the programming channel.
///
/// Reconfigurations are serialized by `&mut self`; there's no way to start a second one
/// while the first is in flight.
pub struct ReconfigurationEngine<H: HardwareControl, C: ProgrammingChannel> {
    hardware: H,
    images: ImageStore,
    channel: C,
}

impl<H: HardwareControl, C: ProgrammingChannel> ReconfigurationEngine<H, C> {
    pub fn new(hardware: H, images: ImageStore, channel: C) -> Self {
        ReconfigurationEngine {
            hardware,
            images,
            channel,
        }
    }

    /// Load the bitstream named `core` into the FPGA.
    ///
    /// Runs to completion before returning: unmap the bridge, assert reset, stream the
    /// image in 128-byte blocks, release reset, map the bridge again.
    ///
    /// # Returns: `Result<(), BalboadError>`
    /// * `Ok(())` - The FPGA is running the new image and the bridge is mapped
    /// * `Err(BalboadError)` - Either an image problem, reported before any hardware step
    ///   and not fatal, or a hardware or channel failure, which is fatal (see
    ///   [`BalboadError::is_fatal`])
    pub fn load_core(&mut self, core: &CoreIdentifier) -> Result<(), BalboadError> {
        info!("loading core '{core}'");
        let image = self.images.load(core)?;
        debug!("read {} bytes from {:?}", image.len(), image.path());

        self.hardware.disable_mapping()?;
        self.hardware.assert_reset()?;

        let mut writer = self.channel.open()?;
        let blocks = stream_blocks(&mut writer, image.as_bytes())?;
        drop(writer);
        debug!("wrote {blocks} blocks");

        self.hardware.deassert_reset()?;
        self.hardware.enable_mapping()?;
        info!("core '{core}' loaded");
        Ok(())
    }
}
