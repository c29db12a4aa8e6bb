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

//! Error type shared by every part of the daemon.
//!
//! Errors fall into two classes. Fatal errors mean the daemon can no longer vouch for
//! its listening socket or for the state of the FPGA; they are propagated all the way
//! out of [`Multiplexer::run`](crate::comm::multiplexer::Multiplexer::run) and the
//! binary terminates on them. Everything else only affects the connection or the
//! request that caused it. Use [`BalboadError::is_fatal`] to tell them apart.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BalboadError {
    #[error("BalboadError::Argument: {0}")]
    Argument(String),
    #[error("BalboadError::IORead: An IO error occurred when reading from {file:?}: {e}")]
    IORead { file: PathBuf, e: std::io::Error },
    #[error("BalboadError::IOWrite: An IO error occurred when writing to {file:?}: {e}")]
    IOWrite { file: PathBuf, e: std::io::Error },
    #[error("BalboadError::ImageTooLarge: refusing to read {size_mib} MiB image {file:?}")]
    ImageTooLarge { file: PathBuf, size_mib: u64 },
    #[error("BalboadError::ImageEmpty: image {file:?} contains no data")]
    ImageEmpty { file: PathBuf },
    #[error("BalboadError::Handshake: bad hello from client: {0:?}")]
    Handshake(String),
    #[error("BalboadError::Reply: failed to send {reply:?} to client: {e}")]
    Reply {
        reply: &'static str,
        e: std::io::Error,
    },
    #[error("BalboadError::Socket: failed to set up listening socket {path:?}: {e}")]
    Socket { path: PathBuf, e: std::io::Error },
    #[error("BalboadError::Readiness: waiting for readiness failed: {0}")]
    Readiness(std::io::Error),
    #[error("BalboadError::Accept: accept failed: {0}")]
    Accept(std::io::Error),
    #[error("BalboadError::TooManyClients: too many clients! {count} > {capacity}")]
    TooManyClients { count: usize, capacity: usize },
    #[error("BalboadError::ChannelOpen: failed to open programming channel {file:?}: {e}")]
    ChannelOpen { file: PathBuf, e: std::io::Error },
    #[error("BalboadError::ChannelWrite: programming channel write failed: {0}")]
    ChannelWrite(std::io::Error),
    #[error("BalboadError::ShortWrite: short write to programming channel ({written} of {requested})")]
    ShortWrite { written: usize, requested: usize },
    #[error("BalboadError::MemoryMap: failed to map {size:#x} bytes at {address:#010x}: {e}")]
    MemoryMap {
        address: u64,
        size: usize,
        e: std::io::Error,
    },
    #[error("BalboadError::Hardware: {0}")]
    Hardware(String),
    #[error("BalboadError::TomlDe: failed to parse config {file:?}: {e}")]
    TomlDe { file: PathBuf, e: toml::de::Error },
    #[error("BalboadError::Daemonize: {0}")]
    Daemonize(nix::Error),
    #[error("BalboadError::Internal: An Internal error occurred: {0}")]
    Internal(String),
}

impl BalboadError {
    /// Whether this error must take the whole daemon down.
    ///
    /// Recoverable errors are scoped to a single connection or a single reconfiguration
    /// request and never leave the hardware or the listening socket in an unknown state.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            BalboadError::Argument(..)
                | BalboadError::IORead { .. }
                | BalboadError::ImageTooLarge { .. }
                | BalboadError::ImageEmpty { .. }
                | BalboadError::Handshake(..)
                | BalboadError::Reply { .. }
        )
    }
}
