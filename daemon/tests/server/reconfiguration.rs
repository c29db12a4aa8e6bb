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

use crate::common::fakes::{Event, Harness, reconfiguration};
use googletest::prelude::*;

#[gtest]
#[tokio::test]
async fn image_is_streamed_in_128_byte_blocks_while_in_reset() {
    let mut harness = Harness::builder().image("demo", 4096).build();
    let mut client = harness.connect_and_greet().await;

    client.send(b"core demo\n");
    harness.mux.turn().await.expect("turn");

    let events = harness.events();
    expect_that!(events.len(), eq(2 + 32 + 2));
    expect_that!(events.first().copied(), some(eq(Event::Unmap)));
    expect_that!(events.get(1).copied(), some(eq(Event::AssertReset)));
    expect_that!(
        events.iter().filter(|e| **e == Event::Write(128)).count(),
        eq(32)
    );
    expect_that!(events.get(34).copied(), some(eq(Event::DeassertReset)));
    expect_that!(events.last().copied(), some(eq(Event::Map)));
}

#[gtest]
#[tokio::test]
async fn trailing_partial_block_is_written_alone() {
    let mut harness = Harness::builder().image("odd", 129).build();
    let mut client = harness.connect_and_greet().await;

    client.send(b"core odd\n");
    harness.mux.turn().await.expect("turn");

    expect_that!(
        harness.events(),
        elements_are![
            eq(&Event::Unmap),
            eq(&Event::AssertReset),
            eq(&Event::Write(128)),
            eq(&Event::Write(1)),
            eq(&Event::DeassertReset),
            eq(&Event::Map)
        ]
    );
}

#[gtest]
#[tokio::test]
async fn requests_in_the_same_round_run_one_after_another() {
    let mut harness = Harness::builder()
        .image("alpha", 256)
        .image("beta", 130)
        .build();
    let mut first = harness.connect_and_greet().await;
    let mut second = harness.connect_and_greet().await;

    first.send(b"core alpha\n");
    second.send(b"core beta\n");
    harness.mux.turn().await.expect("turn");

    let mut expected = reconfiguration(256);
    expected.extend(reconfiguration(130));
    expect_that!(harness.events(), eq(&expected));
}

#[gtest]
#[tokio::test]
async fn short_write_is_fatal() {
    let mut harness = Harness::builder()
        .image("demo", 512)
        .short_writes(64)
        .build();
    let mut client = harness.connect_and_greet().await;

    client.send(b"core demo\n");
    let err = harness.mux.turn().await.expect_err("short write");

    expect_that!(err.is_fatal(), eq(true));
    expect_that!(err.to_string(), contains_substring("64 of 128"));
    // the FPGA is left in reset and unmapped
    expect_that!(
        harness.events(),
        eq(&vec![Event::Unmap, Event::AssertReset, Event::Write(64)])
    );
}

#[gtest]
#[tokio::test]
async fn reload_after_reload() {
    let mut harness = Harness::builder().image("demo", 128).build();
    let mut client = harness.connect_and_greet().await;

    for _ in 0..3 {
        client.send(b"core demo\n");
        harness.mux.turn().await.expect("turn");
    }

    expect_that!(harness.events(), eq(&reconfiguration(128).repeat(3)));
}
