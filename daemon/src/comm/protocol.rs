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

//! The line protocol spoken on the socket.
//!
//! A session is a handshake followed by any number of requests:
//!
//! ```text
//! client: hi\n
//! daemon: ok\n
//! client: core blinky\n      (no reply)
//! client: status\n
//! daemon: err\n
//! ```
//!
//! Each read is treated as exactly one message. Nothing is buffered across reads, so a
//! command split over two writes by the client is seen as two unknown commands.

use crate::error::BalboadError;
use crate::platforms::platform::HardwareControl;
use crate::reconfigure::channel::ProgrammingChannel;
use crate::reconfigure::engine::ReconfigurationEngine;
use crate::reconfigure::image_store::CoreIdentifier;
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest message taken from a client in one read.
pub const MAX_MESSAGE_SIZE: usize = 1024;

pub const HELLO: &[u8] = b"hi\n";
pub const OK_REPLY: &str = "ok\n";
pub const ERR_REPLY: &str = "err\n";
const CORE_PREFIX: &[u8] = b"core ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `core <name>`
    LoadCore(CoreIdentifier),
    Unknown,
}

impl Request {
    pub fn parse(message: &[u8]) -> Request {
        match message.strip_prefix(CORE_PREFIX) {
            Some(rest) => Request::LoadCore(CoreIdentifier::from_request(rest)),
            None => Request::Unknown,
        }
    }
}

/// What to do with a connection after servicing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    KeepOpen,
    Close,
}

/// Check that a freshly accepted client opens with exactly `hi\n` and answer `ok\n`.
///
/// # Returns: `Result<(), BalboadError>`
/// * `Ok(())` - The client may send requests
/// * `Err(BalboadError::Handshake)` - Wrong greeting, or the read failed
/// * `Err(BalboadError::Reply)` - The `ok` could not be sent
pub async fn handshake<S>(stream: &mut S) -> Result<(), BalboadError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; MAX_MESSAGE_SIZE];
    let n = stream
        .read(&mut buf)
        .await
        .map_err(|e| BalboadError::Handshake(format!("read failed: {e}")))?;
    if &buf[..n] != HELLO {
        return Err(BalboadError::Handshake(
            String::from_utf8_lossy(&buf[..n]).into_owned(),
        ));
    }
    send(stream, OK_REPLY).await
}

async fn send<S>(stream: &mut S, reply: &'static str) -> Result<(), BalboadError>
where
    S: AsyncWrite + Unpin,
{
    stream
        .write_all(reply.as_bytes())
        .await
        .map_err(|e| BalboadError::Reply { reply, e })
}

/// Act on one message from an admitted client.
///
/// Reconfiguration runs inline, so this returns only once the FPGA has been reloaded.
/// Problems with the request or the connection are logged here and turn into a
/// [`Disposition`]; only fatal errors are returned.
///
/// # Returns: `Result<Disposition, BalboadError>`
/// * `Ok(Disposition::Close)` - A reply could not be sent
/// * `Ok(Disposition::KeepOpen)` - The request was handled, successfully or not
/// * `Err(BalboadError)` - A fatal error from the reconfiguration engine
pub async fn handle_message<S, H, C>(
    stream: &mut S,
    engine: &mut ReconfigurationEngine<H, C>,
    message: &[u8],
) -> Result<Disposition, BalboadError>
where
    S: AsyncWrite + Unpin,
    H: HardwareControl,
    C: ProgrammingChannel,
{
    match Request::parse(message) {
        Request::LoadCore(core) => match engine.load_core(&core) {
            Ok(()) => Ok(Disposition::KeepOpen),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("can't load core '{core}': {e}");
                Ok(Disposition::KeepOpen)
            }
        },
        Request::Unknown => {
            debug!("unknown command {:?}", String::from_utf8_lossy(message));
            match send(stream, ERR_REPLY).await {
                Ok(()) => Ok(Disposition::KeepOpen),
                Err(e) => {
                    warn!("{e}");
                    Ok(Disposition::Close)
                }
            }
        }
    }
}
