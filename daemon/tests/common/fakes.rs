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

use balboad::comm::multiplexer::Multiplexer;
use balboad::comm::registry::ClientRegistry;
use balboad::comm::socket::bind_listener;
use balboad::error::BalboadError;
use balboad::platforms::platform::HardwareControl;
use balboad::reconfigure::channel::ProgrammingChannel;
use balboad::reconfigure::engine::ReconfigurationEngine;
use balboad::reconfigure::image_store::ImageStore;
use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

/// Everything the daemon did to the hardware and the programming channel, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Unmap,
    Map,
    AssertReset,
    DeassertReset,
    Write(usize),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub struct RecordingHardware {
    log: EventLog,
}

impl HardwareControl for RecordingHardware {
    fn enable_mapping(&mut self) -> Result<(), BalboadError> {
        self.log.borrow_mut().push(Event::Map);
        Ok(())
    }

    fn disable_mapping(&mut self) -> Result<(), BalboadError> {
        self.log.borrow_mut().push(Event::Unmap);
        Ok(())
    }

    fn assert_reset(&mut self) -> Result<(), BalboadError> {
        self.log.borrow_mut().push(Event::AssertReset);
        Ok(())
    }

    fn deassert_reset(&mut self) -> Result<(), BalboadError> {
        self.log.borrow_mut().push(Event::DeassertReset);
        Ok(())
    }

    fn set_gpio(&mut self, _pin: u8, _value: bool) -> Result<(), BalboadError> {
        Ok(())
    }

    fn set_gpio_direction(&mut self, _pin: u8, _output: bool) -> Result<(), BalboadError> {
        Ok(())
    }

    fn get_gpio(&mut self, _pin: u8) -> Result<bool, BalboadError> {
        Ok(false)
    }
}

/// Accepts at most `accept` bytes per write call.
pub struct RecordingChannel {
    log: EventLog,
    accept: usize,
}

pub struct RecordingWriter {
    log: EventLog,
    accept: usize,
}

impl Write for RecordingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.accept);
        self.log.borrow_mut().push(Event::Write(n));
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ProgrammingChannel for RecordingChannel {
    type Writer = RecordingWriter;

    fn open(&mut self) -> Result<RecordingWriter, BalboadError> {
        Ok(RecordingWriter {
            log: self.log.clone(),
            accept: self.accept,
        })
    }
}

pub type TestMultiplexer = Multiplexer<RecordingHardware, RecordingChannel>;

/// A multiplexer on a socket in a scratch directory, with recording fakes behind it.
pub struct Harness {
    pub mux: TestMultiplexer,
    pub log: EventLog,
    pub socket_path: PathBuf,
    _dir: tempfile::TempDir,
}

pub struct HarnessBuilder {
    images: Vec<(&'static str, usize)>,
    accept: usize,
    capacity: usize,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        HarnessBuilder {
            images: Vec::new(),
            accept: usize::MAX,
            capacity: balboad::comm::registry::MAX_CLIENTS,
        }
    }
}

impl HarnessBuilder {
    pub fn image(mut self, name: &'static str, size: usize) -> Self {
        self.images.push((name, size));
        self
    }

    pub fn short_writes(mut self, accept: usize) -> Self {
        self.accept = accept;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Must be called from inside a tokio runtime.
    pub fn build(self) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let stream_dir = dir.path().join("streams");
        std::fs::create_dir(&stream_dir).expect("stream dir");
        for (name, size) in &self.images {
            std::fs::write(stream_dir.join(name), vec![0x3cu8; *size]).expect("write image");
        }
        let socket_path = dir.path().join("balboa.sock");

        let log = EventLog::default();
        let engine = ReconfigurationEngine::new(
            RecordingHardware { log: log.clone() },
            ImageStore::new(&stream_dir),
            RecordingChannel {
                log: log.clone(),
                accept: self.accept,
            },
        );
        let listener = bind_listener(&socket_path).expect("bind");
        let mux = Multiplexer::with_registry(
            listener,
            engine,
            ClientRegistry::with_capacity(self.capacity),
        );
        Harness {
            mux,
            log,
            socket_path,
            _dir: dir,
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    /// Connect and send `hello`. The daemon only sees it on the next turn.
    pub fn connect(&self, hello: &[u8]) -> Client {
        let stream = UnixStream::connect(&self.socket_path).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .expect("read timeout");
        let mut client = Client { stream };
        client.send(hello);
        client
    }

    /// Connect, say hi and let the daemon admit the client.
    pub async fn connect_and_greet(&mut self) -> Client {
        let mut client = self.connect(b"hi\n");
        self.mux.turn().await.expect("handshake turn");
        assert_eq!(client.receive(), b"ok\n");
        client
    }
}

/// Blocking client end. Reads only ever happen after the daemon has had its turn, so
/// anything it sent is already buffered.
pub struct Client {
    stream: UnixStream,
}

impl Client {
    pub fn send(&mut self, message: &[u8]) {
        self.stream.write_all(message).expect("send");
    }

    /// Whatever is waiting, or nothing if the daemon hung up. Panics if the daemon
    /// neither replied nor hung up.
    pub fn receive(&mut self) -> Vec<u8> {
        let mut buf = [0u8; 64];
        let n = self.stream.read(&mut buf).expect("daemon sent nothing");
        buf[..n].to_vec()
    }

    /// True if nothing is waiting and the connection is still up.
    pub fn nothing_pending(&mut self) -> bool {
        self.stream.set_nonblocking(true).expect("nonblocking");
        let mut buf = [0u8; 1];
        let idle = matches!(
            self.stream.read(&mut buf),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock
        );
        self.stream.set_nonblocking(false).expect("blocking");
        idle
    }
}

/// A full reconfiguration of an image of `size` bytes.
pub fn reconfiguration(size: usize) -> Vec<Event> {
    let mut events = vec![Event::Unmap, Event::AssertReset];
    let mut left = size;
    while left > 0 {
        let block = left.min(128);
        events.push(Event::Write(block));
        left -= block;
    }
    events.extend([Event::DeassertReset, Event::Map]);
    events
}
