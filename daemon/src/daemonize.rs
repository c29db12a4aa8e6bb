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

//! Detaching from the controlling terminal.

use crate::error::BalboadError;
use log::debug;
use nix::unistd::{ForkResult, fork, setsid};

/// Move the process into the background with the classic double fork.
///
/// Both intermediate parents exit with status 0. The surviving grandchild is not a
/// session leader, so it can never reacquire a controlling terminal. Standard streams
/// are left as they are, so log output keeps going wherever stderr pointed.
///
/// Must run before the tokio runtime is built: `fork` only carries the calling thread
/// into the child.
///
/// # Returns: `Result<(), BalboadError>`
/// * `Ok(())` - Returned in the detached grandchild only
/// * `Err(BalboadError::Daemonize)` - A fork or `setsid` failed
pub fn daemonize() -> Result<(), BalboadError> {
    fork_and_exit_parent()?;
    setsid().map_err(BalboadError::Daemonize)?;
    fork_and_exit_parent()?;
    debug!("detached as pid {}", std::process::id());
    Ok(())
}

fn fork_and_exit_parent() -> Result<(), BalboadError> {
    // SAFETY: called while the process is still single-threaded, before any runtime or
    // worker threads exist.
    match unsafe { fork() }.map_err(BalboadError::Daemonize)? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => Ok(()),
    }
}
