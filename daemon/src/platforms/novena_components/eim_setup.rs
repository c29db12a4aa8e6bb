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

//! i.MX6 register setup for the EIM bus that connects the CPU to the Novena FPGA.
//!
//! The values are fixed by the i.MX6 reference manual and the FPGA design: pad muxing
//! and drive strength for the EIM data/address/control pads, the EIM clock gate, and the
//! chip-select 0 timing for a 16-bit multiplexed, fixed-latency asynchronous bus.

use crate::error::BalboadError;
use crate::platforms::novena_components::physmap::{RegisterMapper, RegisterWindow};
use log::{debug, trace};

/// Physical base of the FPGA's chip-select 0 window.
pub const EIM_CS0_BASE: u64 = 0x0804_0000;
/// Portion of the CS0 window used for the bridge registers.
pub const EIM_WINDOW_SIZE: usize = 0x1_0000;

/// Bridge register offsets within the CS0 window.
pub const GPIOA_DOUT: usize = 0x0010;
pub const GPIOA_DIR: usize = 0x0012;
pub const GPIOA_DIN: usize = 0x1010;

/// Setup registers are mapped in 64 KiB pages.
const SETUP_PAGE_SIZE: usize = 0x1_0000;
const SETUP_PAGE_MASK: u64 = !(SETUP_PAGE_SIZE as u64 - 1);

/// Pad mux mode 0 selects the EIM function.
const PAD_MUX_EIM: u32 = 0x0;
/// Pad control for a 100MHz bus: hysteresis, 100k pull-up, fast slew, 40 ohm drive.
const PAD_STRENGTH: u32 = 0xb0b1;

/// First of the 16 contiguous EIM data pad mux registers.
const DATA_PAD_MUX_BASE: u64 = 0x020e_0114;
/// First of the 16 contiguous EIM data pad control registers.
const DATA_PAD_CTL_BASE: u64 = 0x020e_0428;
/// Distance from a control pad's strength register back to its mux register.
const PAD_MUX_DELTA: u64 = 0x314;

/// Pad control registers of the EIM control and upper address pads.
const CONTROL_PAD_CTL: [u64; 10] = [
    0x020e_046c, // BCLK
    0x020e_040c, // CS0
    0x020e_0410, // CS1
    0x020e_0414, // OE
    0x020e_0418, // RW
    0x020e_041c, // LBA
    0x020e_0468, // WAIT
    0x020e_0408, // A16
    0x020e_0404, // A17
    0x020e_0400, // A18
];

/// CCM_CCGR6, ungates the EIM slow clock.
const CCM_CCGR6: (u64, u32) = (0x020c_4080, 0xcf3);

/// EIM chip-select 0 configuration and the global EIM registers.
const EIM_TIMING: [(u64, u32); 7] = [
    // CS0GCR1: 256 word page, 16-bit port on DATA[15:0], multiplexed, fixed latency
    (0x021b_8000, 0x5191_c0b9),
    // CS0GCR2: MUX16_BYP_GRANT, 1 cycle address hold
    (0x021b_8004, 0x0000_1001),
    // CS0RCR1: read wait states and OE/CS timing
    (0x021b_8008, 0x0a02_4000),
    // CS0RCR2: asynchronous reads
    (0x021b_800c, 0x0000_0000),
    // CS0WCR1: 4 write wait states, WE asserted 2 cycles in
    (0x021b_8010, 0x0908_0800),
    // WCR: free running BCLK
    (0x021b_8090, 0x0000_0001),
    // WIAR: ACLK_EN
    (0x021b_8094, 0x0000_0010),
];

/// The full setup sequence, in the order it must be applied.
pub fn setup_sequence() -> Vec<(u64, u32)> {
    let mut sequence = Vec::with_capacity(16 * 2 + CONTROL_PAD_CTL.len() * 2 + 1 + EIM_TIMING.len());
    for i in 0..16u64 {
        sequence.push((DATA_PAD_MUX_BASE + i * 4, PAD_MUX_EIM));
        sequence.push((DATA_PAD_CTL_BASE + i * 4, PAD_STRENGTH));
    }
    sequence.extend(
        CONTROL_PAD_CTL
            .iter()
            .map(|ctl| (ctl - PAD_MUX_DELTA, PAD_MUX_EIM)),
    );
    sequence.extend(CONTROL_PAD_CTL.iter().map(|ctl| (*ctl, PAD_STRENGTH)));
    sequence.push(CCM_CCGR6);
    sequence.extend(EIM_TIMING);
    sequence
}

/// Apply [`setup_sequence`] through `mapper`, mapping each 64 KiB page once.
pub fn prep_eim<M: RegisterMapper>(mapper: &mut M) -> Result<(), BalboadError> {
    debug!("configuring EIM pads and chip-select timing");
    let mut page: Option<(u64, M::Window)> = None;
    for (address, value) in setup_sequence() {
        let base = address & SETUP_PAGE_MASK;
        if page.as_ref().map(|(current, _)| *current) != Some(base) {
            page = Some((base, mapper.map(base, SETUP_PAGE_SIZE)?));
        }
        if let Some((_, window)) = page.as_mut() {
            trace!("{address:#010x} <- {value:#x}");
            window.write32((address - base) as usize, value);
        }
    }
    Ok(())
}
