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

//! The byte channel bitstreams are pushed through, normally a spidev node.

use crate::error::BalboadError;
use log::trace;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Bytes handed to the channel per write.
pub const BLOCK_SIZE: usize = 128;

/// Something a bitstream can be written into.
///
/// A fresh writer is opened for every reconfiguration and dropped when streaming ends.
pub trait ProgrammingChannel {
    type Writer: Write;

    fn open(&mut self) -> Result<Self::Writer, BalboadError>;
}

/// A spidev character device, opened write-only.
#[derive(Debug, Clone)]
pub struct SpiDevChannel {
    path: PathBuf,
}

impl SpiDevChannel {
    pub fn new(path: &Path) -> Self {
        SpiDevChannel {
            path: path.to_owned(),
        }
    }
}

impl ProgrammingChannel for SpiDevChannel {
    type Writer = File;

    fn open(&mut self) -> Result<File, BalboadError> {
        trace!("opening programming channel {:?}", self.path);
        OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| BalboadError::ChannelOpen {
                file: self.path.clone(),
                e,
            })
    }
}

/// Push `image` through `writer` in [`BLOCK_SIZE`] pieces, the last one possibly shorter.
///
/// Each piece gets exactly one `write` call. Anything less than the whole piece being
/// accepted is an error; there is no retry, since a partially clocked-in block leaves
/// the FPGA configuration logic in an unknown state.
///
/// # Returns: `Result<usize, BalboadError>`
/// * `Ok(usize)` - Number of blocks written
/// * `Err(BalboadError::ChannelWrite)` - The write call failed
/// * `Err(BalboadError::ShortWrite)` - The write call accepted fewer bytes than offered
pub fn stream_blocks<W: Write>(writer: &mut W, image: &[u8]) -> Result<usize, BalboadError> {
    let mut blocks = 0;
    for block in image.chunks(BLOCK_SIZE) {
        let written = writer.write(block).map_err(BalboadError::ChannelWrite)?;
        if written != block.len() {
            return Err(BalboadError::ShortWrite {
                written,
                requested: block.len(),
            });
        }
        blocks += 1;
    }
    writer.flush().map_err(BalboadError::ChannelWrite)?;
    trace!("streamed {} bytes in {blocks} blocks", image.len());
    Ok(blocks)
}
