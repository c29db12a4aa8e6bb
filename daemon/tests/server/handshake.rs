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

use crate::common::fakes::Harness;
use googletest::prelude::*;
use rstest::*;
use std::time::Duration;

#[gtest]
#[tokio::test]
async fn greeting_is_acknowledged() {
    let mut harness = Harness::builder().build();

    let _client = harness.connect_and_greet().await;

    expect_that!(harness.mux.client_count(), eq(1));
}

#[gtest]
#[tokio::test]
#[rstest]
#[case::wrong_word(b"hello\n")]
#[case::no_newline(b"hi")]
#[case::crlf(b"hi\r\n")]
#[case::upper_case(b"HI\n")]
#[case::command_instead(b"core demo\n")]
async fn bad_greeting_is_dropped(#[case] hello: &[u8]) {
    let mut harness = Harness::builder().image("demo", 128).build();
    let mut client = harness.connect(hello);

    expect_that!(harness.mux.turn().await, ok(anything()));

    // nothing was sent before the daemon hung up
    expect_that!(client.receive(), is_empty());
    expect_that!(harness.mux.client_count(), eq(0));
    expect_that!(harness.events(), is_empty());
}

#[gtest]
#[tokio::test]
async fn silent_hang_up_is_dropped() {
    let mut harness = Harness::builder().build();
    drop(harness.connect(b""));

    expect_that!(harness.mux.turn().await, ok(anything()));
    expect_that!(harness.mux.client_count(), eq(0));
}

#[gtest]
#[tokio::test]
async fn rejection_does_not_affect_others() {
    let mut harness = Harness::builder().build();
    let _first = harness.connect_and_greet().await;
    let _rude = harness.connect(b"yo\n");
    harness.mux.turn().await.expect("turn");

    let _second = harness.connect_and_greet().await;

    expect_that!(harness.mux.client_count(), eq(2));
}

#[gtest]
#[tokio::test]
async fn silent_newcomer_stalls_established_clients() {
    let mut harness = Harness::builder().build();
    let mut established = harness.connect_and_greet().await;
    established.send(b"bogus\n");
    let _silent = harness.connect(b"");

    // the newcomer's handshake is awaited before anyone else is read
    let stalled = tokio::time::timeout(Duration::from_millis(300), harness.mux.turn()).await;
    expect_that!(stalled.is_err(), eq(true));
    expect_that!(established.nothing_pending(), eq(true));

    harness.mux.turn().await.expect("turn");
    expect_that!(established.receive(), eq(b"err\n"));
    expect_that!(harness.mux.client_count(), eq(1));
}
