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

//! Physical memory windows for MMIO access.
//!
//! [`RegisterMapper`] hands out [`RegisterWindow`]s over physical address ranges. The
//! production mapper, [`DevMemMapper`], maps them from `/dev/mem`, which requires root.
//! Everything above this module only talks to the traits, so the register sequences
//! can be exercised against an in-memory stand-in.

use crate::error::BalboadError;
use log::trace;

/// A mapped range of device registers. Offsets are relative to the start of the range.
pub trait RegisterWindow {
    fn read16(&self, offset: usize) -> u16;
    fn write16(&mut self, offset: usize, value: u16);
    fn write32(&mut self, offset: usize, value: u32);
}

/// Source of register windows.
pub trait RegisterMapper {
    type Window: RegisterWindow;

    /// Map `size` bytes of physical address space starting at `phys_addr`.
    fn map(&mut self, phys_addr: u64, size: usize) -> Result<Self::Window, BalboadError>;
}

/// Maps windows from `/dev/mem`.
#[derive(Debug, Default)]
pub struct DevMemMapper;

impl RegisterMapper for DevMemMapper {
    type Window = PhysMap;

    fn map(&mut self, phys_addr: u64, size: usize) -> Result<PhysMap, BalboadError> {
        PhysMap::new(phys_addr, size)
    }
}

/// A mapped region of physical memory. Unmapped on drop.
///
/// # Panics
///
/// The [`RegisterWindow`] accessors panic on an out-of-bounds or unaligned offset
/// rather than touching memory outside the mapping.
#[derive(Debug)]
pub struct PhysMap {
    /// Start of the requested region inside the mapping
    ptr: *mut u8,
    /// Bytes usable from `ptr`
    len: usize,
    /// Page offset of `phys_addr`, needed to recover the mmap base
    offset: usize,
    /// Size of the whole mapping
    map_size: usize,
    phys_addr: u64,
}

impl PhysMap {
    /// Map a region of physical memory for MMIO access.
    ///
    /// The region is widened to page boundaries for `mmap`; accessors only accept
    /// offsets inside the requested `size`.
    pub fn new(phys_addr: u64, size: usize) -> Result<Self, BalboadError> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        let map_err = |e: std::io::Error| BalboadError::MemoryMap {
            address: phys_addr,
            size,
            e,
        };

        // O_SYNC for uncached access
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open("/dev/mem")
            .map_err(map_err)?;

        // SAFETY: sysconf has no preconditions.
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let page_mask = page_size - 1;
        let offset = (phys_addr as usize) & page_mask;
        let aligned_addr = phys_addr & !(page_mask as u64);
        let map_size = (size + offset + page_mask) & !page_mask;

        // SAFETY: a fresh shared mapping of a file we hold open; the kernel picks the
        // address, so no existing memory is aliased.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned_addr as libc::off_t,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(map_err(std::io::Error::last_os_error()));
        }
        trace!("mapped {size:#x} bytes at {phys_addr:#010x}");

        Ok(Self {
            // SAFETY: offset < page_size <= map_size
            ptr: unsafe { (ptr as *mut u8).add(offset) },
            len: size,
            offset,
            map_size,
            phys_addr,
        })
    }

    pub fn phys_addr(&self) -> u64 {
        self.phys_addr
    }

    fn check(&self, offset: usize, width: usize) {
        check_access(self.len, offset, width);
    }
}

/// Bounds and alignment check for a `width`-byte register access into a `len`-byte window.
///
/// # Panics
///
/// If the access runs past the end of the window or `offset` is not a multiple of
/// `width`. Register offsets are compile-time constants, so this only fires on a
/// wrong entry in a register table.
fn check_access(len: usize, offset: usize, width: usize) {
    assert!(
        offset + width <= len && offset % width == 0,
        "register access at {offset:#x} (width {width}) outside window of {len:#x} bytes"
    );
}

impl RegisterWindow for PhysMap {
    fn read16(&self, offset: usize) -> u16 {
        self.check(offset, 2);
        // SAFETY: bounds and alignment checked above
        unsafe { core::ptr::read_volatile(self.ptr.add(offset) as *const u16) }
    }

    fn write16(&mut self, offset: usize, value: u16) {
        self.check(offset, 2);
        // SAFETY: bounds and alignment checked above
        unsafe { core::ptr::write_volatile(self.ptr.add(offset) as *mut u16, value) }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        self.check(offset, 4);
        // SAFETY: bounds and alignment checked above
        unsafe { core::ptr::write_volatile(self.ptr.add(offset) as *mut u32, value) }
    }
}

impl Drop for PhysMap {
    fn drop(&mut self) {
        trace!("unmapping window at {:#010x}", self.phys_addr);
        // SAFETY: reverses the pointer adjustment made in `new`, unmapping exactly what
        // was mapped.
        unsafe {
            libc::munmap(
                self.ptr.sub(self.offset) as *mut libc::c_void,
                self.map_size,
            );
        }
    }
}
