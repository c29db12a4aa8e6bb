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

//! Error Wrapping File System I/O Helpers
//!
//! Thin wrappers around the standard library file operations used by the daemon:
//! config files, bitstream images and sysfs GPIO attributes. Each helper trace-logs
//! what it touches and converts failures into a [`BalboadError`] that carries the path.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use balboad::system_io::{fs_read, fs_write};
//! # use std::path::Path;
//! # fn example() -> Result<(), balboad::error::BalboadError> {
//! let config = fs_read(Path::new("/etc/balboad/config.toml"))?;
//! fs_write(Path::new("/sys/class/gpio/gpio135/value"), false, "0")?;
//! # Ok(())
//! # }
//! ```

use crate::error::BalboadError;
use log::trace;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::Path;

/// Read the contents of a file to a String.
///
/// # Returns: `Result<String, BalboadError>`
/// * `Ok(String)` - The complete contents of the file
/// * `Err(BalboadError::IORead)` - If the file cannot be read (doesn't exist, permissions, etc.)
pub fn fs_read(file_path: &Path) -> Result<String, BalboadError> {
    trace!("Attempting to read from {file_path:?}");
    let mut buf: String = String::new();
    let result = OpenOptions::new()
        .read(true)
        .open(file_path)
        .and_then(|mut f| f.read_to_string(&mut buf));

    match result {
        Ok(_) => {
            trace!("Reading done");
            Ok(buf)
        }
        Err(e) => Err(BalboadError::IORead {
            file: file_path.into(),
            e,
        }),
    }
}

/// Read at most `limit` bytes of a file into memory.
///
/// The read stops at `limit` even if the file grew after the caller checked its size,
/// so the returned buffer never exceeds what the caller agreed to hold.
///
/// # Returns: `Result<Vec<u8>, BalboadError>`
/// * `Ok(Vec<u8>)` - The bytes read
/// * `Err(BalboadError::IORead)` - If the file cannot be opened or read
pub fn fs_read_bytes(file_path: &Path, limit: u64) -> Result<Vec<u8>, BalboadError> {
    trace!("Attempting to read up to {limit} bytes from {file_path:?}");
    let mut buf: Vec<u8> = Vec::new();
    let result = OpenOptions::new()
        .read(true)
        .open(file_path)
        .and_then(|f| f.take(limit).read_to_end(&mut buf));

    match result {
        Ok(n) => {
            trace!("Read {n} bytes");
            Ok(buf)
        }
        Err(e) => Err(BalboadError::IORead {
            file: file_path.into(),
            e,
        }),
    }
}

/// Size in bytes of the regular file at `file_path`.
///
/// # Returns: `Result<u64, BalboadError>`
/// * `Ok(u64)` - File length from metadata
/// * `Err(BalboadError::IORead)` - If the path can't be stat'ed or is not a regular file
pub fn fs_file_size(file_path: &Path) -> Result<u64, BalboadError> {
    trace!("Attempting to stat {file_path:?}");
    let metadata = std::fs::metadata(file_path).map_err(|e| BalboadError::IORead {
        file: file_path.into(),
        e,
    })?;
    if !metadata.is_file() {
        return Err(BalboadError::IORead {
            file: file_path.into(),
            e: std::io::Error::other("not a regular file"),
        });
    }
    Ok(metadata.len())
}

/// Write a string value to a file.
///
/// # Arguments
///
/// * `file_path` - Path to the file to write
/// * `create` - If `true`, create the file if it doesn't exist; if `false`, file must already exist
/// * `value` - The string value to write
///
/// # Returns: `Result<(), BalboadError>`
/// * `Ok(())` - Write succeeded
/// * `Err(BalboadError::IOWrite)` - If the write fails
pub fn fs_write(file_path: &Path, create: bool, value: impl AsRef<str>) -> Result<(), BalboadError> {
    trace!(
        "Attempting to write {:?} to {:?}",
        value.as_ref(),
        file_path
    );
    let result = OpenOptions::new()
        .create(create)
        .read(false)
        .write(true)
        .open(file_path)
        .and_then(|mut f| write!(f, "{}", value.as_ref()));
    match result {
        Ok(_) => {
            trace!("Write done.");
            Ok(())
        }
        Err(e) => Err(BalboadError::IOWrite {
            file: file_path.into(),
            e,
        }),
    }
}
