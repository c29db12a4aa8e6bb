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

//! The listening Unix socket.

use crate::error::BalboadError;
use log::{debug, info};
use nix::sys::socket::{Backlog, listen};
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use tokio::net::UnixListener;

/// Pending connections the kernel queues before refusing new ones.
pub const LISTEN_BACKLOG: i32 = 10;

/// Delete a socket left behind by an earlier run.
///
/// Only sockets are removed. Anything else at `path` is left alone and reported, so a
/// mistyped `socket_path` can't delete an unrelated file.
fn remove_stale_socket(path: &Path) -> Result<(), BalboadError> {
    let socket_err = |e| BalboadError::Socket {
        path: path.to_owned(),
        e,
    };
    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_socket() => {
            debug!("removing stale socket {path:?}");
            std::fs::remove_file(path).map_err(socket_err)
        }
        Ok(_) => Err(socket_err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "path exists and is not a socket",
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(socket_err(e)),
    }
}

/// Bind and listen on `path`, registered with the current tokio runtime.
///
/// # Returns: `Result<UnixListener, BalboadError>`
/// * `Ok(UnixListener)` - Listening with a backlog of [`LISTEN_BACKLOG`]
/// * `Err(BalboadError::Socket)` - Any step failed; this is fatal
pub fn bind_listener(path: &Path) -> Result<UnixListener, BalboadError> {
    let socket_err = |e| BalboadError::Socket {
        path: path.to_owned(),
        e,
    };
    remove_stale_socket(path)?;

    let listener = std::os::unix::net::UnixListener::bind(path).map_err(socket_err)?;
    // std listens with its own backlog; listening again only resizes the queue
    let backlog = Backlog::new(LISTEN_BACKLOG).map_err(|e| socket_err(e.into()))?;
    listen(&listener, backlog).map_err(|e| socket_err(e.into()))?;
    listener.set_nonblocking(true).map_err(socket_err)?;

    let listener = UnixListener::from_std(listener).map_err(socket_err)?;
    info!("listening on {path:?}");
    Ok(listener)
}
