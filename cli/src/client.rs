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

//! Client side of the balboad socket protocol.

use log::{debug, trace};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Default address of the daemon's socket.
pub static SOCKET_PATH: &str = "/tmp/balboa.sock";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("ClientError::Connect: couldn't connect to {path:?}: {e}")]
    Connect { path: PathBuf, e: io::Error },
    #[error("ClientError::Io: {0}")]
    Io(#[from] io::Error),
    #[error("ClientError::Refused: daemon answered {0:?} instead of \"ok\"")]
    Refused(String),
    #[error("ClientError::Argument: {0}")]
    Argument(String),
}

/// A connection that has completed the handshake.
pub struct Session {
    stream: UnixStream,
}

impl Session {
    /// Connect to the daemon at `path` and say hello.
    ///
    /// # Returns: `Result<Session, ClientError>`
    /// * `Ok(Session)` - The daemon answered `ok`
    /// * `Err(ClientError::Connect)` - Nothing is listening at `path`
    /// * `Err(ClientError::Refused)` - The daemon answered something else, or hung up
    pub async fn open(path: &Path) -> Result<Session, ClientError> {
        let mut stream = UnixStream::connect(path)
            .await
            .map_err(|e| ClientError::Connect {
                path: path.to_owned(),
                e,
            })?;
        trace!("connected to {path:?}");
        stream.write_all(b"hi\n").await?;

        let mut buf = [0u8; 1024];
        let n = stream.read(&mut buf).await?;
        if &buf[..n] != b"ok\n" {
            return Err(ClientError::Refused(
                String::from_utf8_lossy(&buf[..n]).into_owned(),
            ));
        }
        debug!("handshake with {path:?} done");
        Ok(Session { stream })
    }

    /// Ask the daemon to load `core`.
    ///
    /// The daemon doesn't answer this request; success only means it was sent. Names the
    /// daemon would silently cut short are refused here instead.
    pub async fn load_core(&mut self, core: &str) -> Result<(), ClientError> {
        validate_core_name(core)?;
        self.stream
            .write_all(format!("core {core}\n").as_bytes())
            .await?;
        debug!("requested core '{core}'");
        Ok(())
    }
}

fn validate_core_name(core: &str) -> Result<(), ClientError> {
    if core.is_empty() {
        return Err(ClientError::Argument("core name is empty".into()));
    }
    if let Some(c) = core.chars().find(|c| "/ \t\n\r".contains(*c)) {
        return Err(ClientError::Argument(format!(
            "core name {core:?} contains {c:?}"
        )));
    }
    Ok(())
}
