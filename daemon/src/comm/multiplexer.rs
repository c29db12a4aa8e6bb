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

//! Single-task event loop over the listening socket and every connected client.
//!
//! Each [`turn`](Multiplexer::turn) waits until the listener or at least one client is
//! readable, then:
//!
//! 1. accepts at most one new connection and runs its handshake to completion,
//! 2. services every client that was readable, in registry order, one message each,
//! 3. drops the clients that hung up or failed, all at once.
//!
//! Everything runs on the one task, so a reconfiguration or a slow handshake holds up
//! every other client until it's done. Requests are therefore strictly serialized,
//! and a client that connects without saying `hi` stalls the loop until it either
//! sends something or disconnects.

use crate::comm::protocol::{Disposition, MAX_MESSAGE_SIZE, handle_message, handshake};
use crate::comm::registry::ClientRegistry;
use crate::error::BalboadError;
use crate::platforms::platform::HardwareControl;
use crate::reconfigure::channel::ProgrammingChannel;
use crate::reconfigure::engine::ReconfigurationEngine;
use log::{debug, info, warn};
use std::convert::Infallible;
use std::future::poll_fn;
use std::io;
use std::task::Poll;
use tokio::net::{UnixListener, UnixStream};

enum Received {
    Message(usize),
    /// Readiness was stale; the next wait re-arms it.
    Nothing,
    HungUp,
}

/// Take one message from a client that was reported readable, without waiting.
fn receive(stream: &UnixStream, buf: &mut [u8]) -> Received {
    match stream.try_read(buf) {
        Ok(0) => {
            debug!("client hung up");
            Received::HungUp
        }
        Ok(n) => Received::Message(n),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Received::Nothing,
        Err(e) => {
            warn!("dropping client after failed read: {e}");
            Received::HungUp
        }
    }
}

/// Result of one readiness wait.
#[derive(Debug, Default)]
struct Ready {
    incoming: Option<UnixStream>,
    clients: Vec<usize>,
}

pub struct Multiplexer<H: HardwareControl, C: ProgrammingChannel> {
    listener: UnixListener,
    clients: ClientRegistry<UnixStream>,
    engine: ReconfigurationEngine<H, C>,
}

impl<H: HardwareControl, C: ProgrammingChannel> Multiplexer<H, C> {
    pub fn new(listener: UnixListener, engine: ReconfigurationEngine<H, C>) -> Self {
        Self::with_registry(listener, engine, ClientRegistry::default())
    }

    pub fn with_registry(
        listener: UnixListener,
        engine: ReconfigurationEngine<H, C>,
        clients: ClientRegistry<UnixStream>,
    ) -> Self {
        Multiplexer {
            listener,
            clients,
            engine,
        }
    }

    /// Clients that completed the handshake and are still connected.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Serve until a fatal error.
    pub async fn run(&mut self) -> Result<Infallible, BalboadError> {
        loop {
            self.turn().await?;
        }
    }

    /// One iteration of the event loop.
    ///
    /// # Returns: `Result<(), BalboadError>`
    /// * `Ok(())` - Everything that was ready has been serviced
    /// * `Err(BalboadError)` - A fatal error; the daemon must stop
    pub async fn turn(&mut self) -> Result<(), BalboadError> {
        let ready = self.wait_ready().await?;

        if let Some(stream) = ready.incoming {
            self.admit(stream).await?;
        }

        let mut closed = Vec::new();
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        for index in ready.clients {
            let Some(stream) = self.clients.get_mut(index) else {
                continue;
            };
            let n = match receive(stream, &mut buf) {
                Received::Message(n) => n,
                Received::Nothing => continue,
                Received::HungUp => {
                    closed.push(index);
                    continue;
                }
            };
            if handle_message(stream, &mut self.engine, &buf[..n]).await? == Disposition::Close {
                closed.push(index);
            }
        }
        if !closed.is_empty() {
            let dropped = self.clients.remove_marked(closed);
            info!(
                "closed {} client(s), {} remain",
                dropped.len(),
                self.clients.len()
            );
        }
        Ok(())
    }

    /// Wait for the listener or any client to become readable.
    ///
    /// Failing to wait at all is fatal. Errors on an individual connection show up as
    /// readiness, and the read that follows closes it.
    async fn wait_ready(&self) -> Result<Ready, BalboadError> {
        let listener = &self.listener;
        let clients = &self.clients;
        poll_fn(|cx| {
            let mut ready = Ready::default();
            match listener.poll_accept(cx) {
                Poll::Ready(Ok((stream, _))) => ready.incoming = Some(stream),
                Poll::Ready(Err(e)) => return Poll::Ready(Err(BalboadError::Accept(e))),
                Poll::Pending => {}
            }
            for (index, client) in clients.iter().enumerate() {
                match client.poll_read_ready(cx) {
                    Poll::Ready(Ok(())) => ready.clients.push(index),
                    Poll::Ready(Err(e)) => return Poll::Ready(Err(BalboadError::Readiness(e))),
                    Poll::Pending => {}
                }
            }
            if ready.incoming.is_none() && ready.clients.is_empty() {
                Poll::Pending
            } else {
                Poll::Ready(Ok(ready))
            }
        })
        .await
    }

    /// Handshake with a new connection and register it.
    ///
    /// A failed handshake only costs that connection. A full registry is fatal.
    async fn admit(&mut self, mut stream: UnixStream) -> Result<(), BalboadError> {
        if let Err(e) = handshake(&mut stream).await {
            warn!("rejecting client: {e}");
            return Ok(());
        }
        self.clients.insert(stream)?;
        info!("client connected ({} total)", self.clients.len());
        Ok(())
    }
}
