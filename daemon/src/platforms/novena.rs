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

//! Novena platform: the FPGA sits on the i.MX6 EIM bus.
//!
//! # Components
//!
//! - [`eim_setup`](crate::platforms::novena_components::eim_setup) - pad and timing
//!   registers written once before the first mapping
//! - [`physmap`](crate::platforms::novena_components::physmap) - `/dev/mem` windows
//! - [`reset_line`](crate::platforms::novena_components::reset_line) - the FPGA reset
//!   GPIO
//!
//! # GPIO
//!
//! The FPGA design exposes eight general purpose lines through three 16-bit bridge
//! registers: output (`GPIOA_DOUT`), direction (`GPIOA_DIR`) and input (`GPIOA_DIN`).
//! The output and direction registers are written whole from cached masks, so setting
//! one line never picks up stale values from the others. The caches survive
//! [`disable_mapping`](HardwareControl::disable_mapping); lines can only be changed
//! while the bridge is mapped.

use crate::config::HardwareConfig;
use crate::error::BalboadError;
use crate::platforms::novena_components::eim_setup::{
    EIM_CS0_BASE, EIM_WINDOW_SIZE, GPIOA_DIN, GPIOA_DIR, GPIOA_DOUT, prep_eim,
};
use crate::platforms::novena_components::physmap::{DevMemMapper, RegisterMapper, RegisterWindow};
use crate::platforms::novena_components::reset_line::SysfsResetLine;
use crate::platforms::platform::{HardwareControl, validate_pin};
use log::{debug, info};

pub struct NovenaEim<M: RegisterMapper = DevMemMapper> {
    mapper: M,
    prepared: bool,
    window: Option<M::Window>,
    cached_dout: u8,
    cached_dir: u8,
    reset: SysfsResetLine,
}

impl NovenaEim<DevMemMapper> {
    pub fn from_config(config: &HardwareConfig) -> Self {
        NovenaEim::new(
            DevMemMapper,
            SysfsResetLine::new(
                &config.gpio_sysfs_dir,
                config.reset_gpio,
                config.reset_active_low,
            ),
        )
    }
}

impl<M: RegisterMapper> NovenaEim<M> {
    pub fn new(mapper: M, reset: SysfsResetLine) -> Self {
        NovenaEim {
            mapper,
            prepared: false,
            window: None,
            cached_dout: 0,
            cached_dir: 0,
            reset,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.window.is_some()
    }

    fn window(&mut self) -> Result<&mut M::Window, BalboadError> {
        self.window
            .as_mut()
            .ok_or_else(|| BalboadError::Hardware("EIM window is not mapped".into()))
    }
}

fn with_bit(mask: u8, pin: u8, set: bool) -> u8 {
    if set { mask | (1 << pin) } else { mask & !(1 << pin) }
}

impl<M: RegisterMapper> HardwareControl for NovenaEim<M> {
    fn enable_mapping(&mut self) -> Result<(), BalboadError> {
        if self.window.is_some() {
            return Ok(());
        }
        if !self.prepared {
            prep_eim(&mut self.mapper)?;
            self.prepared = true;
        }
        self.window = Some(self.mapper.map(EIM_CS0_BASE, EIM_WINDOW_SIZE)?);
        info!("EIM bridge mapped at {EIM_CS0_BASE:#010x}");
        Ok(())
    }

    fn disable_mapping(&mut self) -> Result<(), BalboadError> {
        if self.window.take().is_some() {
            info!("EIM bridge unmapped");
        }
        Ok(())
    }

    fn assert_reset(&mut self) -> Result<(), BalboadError> {
        debug!("asserting FPGA reset");
        self.reset.set_asserted(true)
    }

    fn deassert_reset(&mut self) -> Result<(), BalboadError> {
        debug!("releasing FPGA reset");
        self.reset.set_asserted(false)
    }

    fn set_gpio(&mut self, pin: u8, value: bool) -> Result<(), BalboadError> {
        validate_pin(pin)?;
        let dout = with_bit(self.cached_dout, pin, value);
        self.window()?.write16(GPIOA_DOUT, u16::from(dout));
        self.cached_dout = dout;
        Ok(())
    }

    fn set_gpio_direction(&mut self, pin: u8, output: bool) -> Result<(), BalboadError> {
        validate_pin(pin)?;
        let dir = with_bit(self.cached_dir, pin, output);
        self.window()?.write16(GPIOA_DIR, u16::from(dir));
        self.cached_dir = dir;
        Ok(())
    }

    fn get_gpio(&mut self, pin: u8) -> Result<bool, BalboadError> {
        validate_pin(pin)?;
        Ok((self.window()?.read16(GPIOA_DIN) >> pin) & 1 == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    type Memory = Rc<RefCell<HashMap<u64, u32>>>;

    struct FakeWindow {
        base: u64,
        memory: Memory,
    }

    impl RegisterWindow for FakeWindow {
        fn read16(&self, offset: usize) -> u16 {
            let value = self.memory.borrow().get(&(self.base + offset as u64)).copied();
            value.unwrap_or(0) as u16
        }

        fn write16(&mut self, offset: usize, value: u16) {
            self.memory
                .borrow_mut()
                .insert(self.base + offset as u64, u32::from(value));
        }

        fn write32(&mut self, offset: usize, value: u32) {
            self.memory.borrow_mut().insert(self.base + offset as u64, value);
        }
    }

    #[derive(Default)]
    struct FakeMapper {
        memory: Memory,
        maps: Rc<RefCell<Vec<u64>>>,
    }

    impl RegisterMapper for FakeMapper {
        type Window = FakeWindow;

        fn map(&mut self, phys_addr: u64, _size: usize) -> Result<FakeWindow, BalboadError> {
            self.maps.borrow_mut().push(phys_addr);
            Ok(FakeWindow {
                base: phys_addr,
                memory: self.memory.clone(),
            })
        }
    }

    fn novena() -> (NovenaEim<FakeMapper>, Memory, Rc<RefCell<Vec<u64>>>, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let line = dir.path().join("gpio135");
        std::fs::create_dir(&line).expect("line dir");
        std::fs::write(line.join("direction"), "in").expect("direction");
        std::fs::write(line.join("value"), "1").expect("value");

        let mapper = FakeMapper::default();
        let memory = mapper.memory.clone();
        let maps = mapper.maps.clone();
        let reset = SysfsResetLine::new(dir.path(), 135, true);
        (NovenaEim::new(mapper, reset), memory, maps, dir)
    }

    const DOUT: u64 = EIM_CS0_BASE + GPIOA_DOUT as u64;
    const DIR: u64 = EIM_CS0_BASE + GPIOA_DIR as u64;
    const DIN: u64 = EIM_CS0_BASE + GPIOA_DIN as u64;

    #[gtest]
    fn first_mapping_programs_the_bus_once() {
        let (mut eim, memory, maps, _dir) = novena();

        eim.enable_mapping().expect("map");
        eim.disable_mapping().expect("unmap");
        eim.enable_mapping().expect("remap");

        expect_that!(memory.borrow().get(&0x021b_8000).copied(), some(eq(0x5191_c0b9)));
        // three setup pages, then the bridge window twice
        expect_that!(
            maps.borrow().clone(),
            eq(&vec![
                0x020e_0000,
                0x020c_0000,
                0x021b_0000,
                EIM_CS0_BASE,
                EIM_CS0_BASE
            ])
        );
    }

    #[gtest]
    fn gpio_writes_keep_unrelated_bits() {
        let (mut eim, memory, _maps, _dir) = novena();
        eim.enable_mapping().expect("map");

        eim.set_gpio_direction(0, true).expect("dir 0");
        eim.set_gpio_direction(3, true).expect("dir 3");
        eim.set_gpio(3, true).expect("set 3");
        eim.set_gpio(5, true).expect("set 5");
        // the live register is clobbered behind our back; the cache wins
        memory.borrow_mut().insert(DOUT, 0xff);
        eim.set_gpio(5, false).expect("clear 5");

        expect_that!(memory.borrow().get(&DIR).copied(), some(eq(0b0000_1001)));
        expect_that!(memory.borrow().get(&DOUT).copied(), some(eq(0b0000_1000)));
    }

    #[gtest]
    fn gpio_reads_the_input_register() {
        let (mut eim, memory, _maps, _dir) = novena();
        eim.enable_mapping().expect("map");
        memory.borrow_mut().insert(DIN, 0b0100_0000);

        expect_that!(eim.get_gpio(6), ok(eq(&true)));
        expect_that!(eim.get_gpio(1), ok(eq(&false)));
        expect_that!(eim.get_gpio(8), err(displays_as(contains_substring("does not exist"))));
    }

    #[gtest]
    fn gpio_requires_mapping() {
        let (mut eim, _memory, _maps, _dir) = novena();
        expect_that!(
            eim.set_gpio(0, true),
            err(displays_as(contains_substring("not mapped")))
        );
        expect_that!(eim.is_mapped(), eq(false));
    }

    #[gtest]
    fn reset_drives_the_sysfs_line() {
        let (mut eim, _memory, _maps, dir) = novena();
        let value = dir.path().join("gpio135/value");

        eim.assert_reset().expect("assert");
        expect_that!(std::fs::read_to_string(&value).ok(), some(eq("0")));
        eim.deassert_reset().expect("deassert");
        expect_that!(std::fs::read_to_string(&value).ok(), some(eq("1")));
    }
}
