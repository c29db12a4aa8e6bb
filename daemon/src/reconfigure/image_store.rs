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

//! Bitstream images, looked up by core name in the configured stream directory.

use crate::error::BalboadError;
use crate::system_io::{fs_file_size, fs_read_bytes};
use log::trace;
use std::fmt;
use std::path::{Path, PathBuf};

/// Largest image that will be read into memory, 512 MiB.
pub const MAX_IMAGE_SIZE: u64 = 512 * 1024 * 1024;

/// Characters that end a core name.
const CORE_NAME_TERMINATORS: &[u8] = b"/ \t\n\r";

/// Name of a bitstream image as requested by a client.
///
/// Built from the raw request text by cutting it at the first `/`, space, tab, `\n`
/// or `\r`. Anything after that point is dropped without complaint, so
/// `core ../etc/passwd` asks for a core named `..` and `core a b` for `a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreIdentifier(String);

impl CoreIdentifier {
    pub fn from_request(raw: &[u8]) -> Self {
        let end = raw
            .iter()
            .position(|b| CORE_NAME_TERMINATORS.contains(b))
            .unwrap_or(raw.len());
        CoreIdentifier(String::from_utf8_lossy(&raw[..end]).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoreIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bitstream read in full from disk.
#[derive(Debug)]
pub struct BitstreamImage {
    path: PathBuf,
    data: Vec<u8>,
}

impl BitstreamImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Directory of bitstream images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    limit: u64,
}

impl ImageStore {
    pub fn new(dir: &Path) -> Self {
        Self::with_limit(dir, MAX_IMAGE_SIZE)
    }

    /// A store that accepts images of up to `limit` bytes instead of [`MAX_IMAGE_SIZE`].
    pub fn with_limit(dir: &Path, limit: u64) -> Self {
        ImageStore {
            dir: dir.to_owned(),
            limit,
        }
    }

    pub fn path_for(&self, core: &CoreIdentifier) -> PathBuf {
        self.dir.join(core.as_str())
    }

    /// Read the image for `core`.
    ///
    /// The size is checked before reading, so an oversized file never gets pulled into
    /// memory.
    ///
    /// # Returns: `Result<BitstreamImage, BalboadError>`
    /// * `Ok(BitstreamImage)` - The whole image, at least one byte long
    /// * `Err(BalboadError::Argument)` - The core name is empty
    /// * `Err(BalboadError::IORead)` - Missing, not a regular file, or unreadable
    /// * `Err(BalboadError::ImageTooLarge)` - Larger than the store's limit, [`MAX_IMAGE_SIZE`]
    ///   unless built with [`ImageStore::with_limit`]
    /// * `Err(BalboadError::ImageEmpty)` - Zero bytes
    pub fn load(&self, core: &CoreIdentifier) -> Result<BitstreamImage, BalboadError> {
        if core.as_str().is_empty() {
            return Err(BalboadError::Argument("empty core name".into()));
        }
        let path = self.path_for(core);
        let size = fs_file_size(&path)?;
        if size > self.limit {
            return Err(BalboadError::ImageTooLarge {
                file: path,
                size_mib: size / 1024 / 1024,
            });
        }
        let data = fs_read_bytes(&path, self.limit)?;
        if data.is_empty() {
            return Err(BalboadError::ImageEmpty { file: path });
        }
        trace!("read {} bytes from {path:?}", data.len());
        Ok(BitstreamImage { path, data })
    }
}
