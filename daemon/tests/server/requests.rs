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

use crate::common::fakes::{Harness, reconfiguration};
use googletest::prelude::*;
use rstest::*;

#[gtest]
#[tokio::test]
async fn unknown_command_gets_err_and_the_session_continues() {
    let mut harness = Harness::builder().image("demo", 4096).build();
    let mut client = harness.connect_and_greet().await;

    client.send(b"bogus\n");
    harness.mux.turn().await.expect("turn");
    expect_that!(client.receive(), eq(b"err\n"));

    client.send(b"core demo\n");
    harness.mux.turn().await.expect("turn");
    expect_that!(harness.events(), eq(&reconfiguration(4096)));
    expect_that!(harness.mux.client_count(), eq(1));
}

#[gtest]
#[tokio::test]
#[rstest]
#[case::no_space(b"coredemo\n")]
#[case::bare(b"core\n")]
#[case::greeting_again(b"hi\n")]
#[case::leading_space(b" core demo\n")]
async fn near_misses_are_unknown(#[case] message: &[u8]) {
    let mut harness = Harness::builder().image("demo", 256).build();
    let mut client = harness.connect_and_greet().await;

    client.send(message);
    harness.mux.turn().await.expect("turn");

    expect_that!(client.receive(), eq(b"err\n"));
    expect_that!(harness.events(), is_empty());
}

#[gtest]
#[tokio::test]
async fn successful_load_is_not_acknowledged() {
    let mut harness = Harness::builder().image("demo", 300).build();
    let mut client = harness.connect_and_greet().await;

    client.send(b"core demo\n");
    harness.mux.turn().await.expect("turn");

    expect_that!(harness.events(), eq(&reconfiguration(300)));
    expect_that!(client.nothing_pending(), eq(true));
}

#[gtest]
#[tokio::test]
#[rstest]
#[case::missing(b"core nonexistent\n")]
#[case::empty_name(b"core \n")]
#[case::empty_file(b"core empty\n")]
#[case::directory(b"core ..\n")]
async fn unusable_images_are_skipped_silently(#[case] message: &[u8]) {
    let mut harness = Harness::builder().image("empty", 0).build();
    let mut client = harness.connect_and_greet().await;

    client.send(message);
    expect_that!(harness.mux.turn().await, ok(anything()));

    expect_that!(harness.events(), is_empty());
    expect_that!(client.nothing_pending(), eq(true));
    expect_that!(harness.mux.client_count(), eq(1));
}

#[gtest]
#[tokio::test]
#[rstest]
#[case::path_traversal(b"core demo/../../etc/passwd\n")]
#[case::extra_words(b"core demo now please\n")]
#[case::no_newline(b"core demo")]
#[case::crlf(b"core demo\r\n")]
async fn core_name_stops_at_separators(#[case] message: &[u8]) {
    let mut harness = Harness::builder().image("demo", 200).build();
    let mut client = harness.connect_and_greet().await;

    client.send(message);
    harness.mux.turn().await.expect("turn");

    expect_that!(harness.events(), eq(&reconfiguration(200)));
}

#[gtest]
#[tokio::test]
async fn hang_up_removes_the_client() {
    let mut harness = Harness::builder().build();
    let stays = harness.connect_and_greet().await;
    let leaves = harness.connect_and_greet().await;
    expect_that!(harness.mux.client_count(), eq(2));

    drop(leaves);
    harness.mux.turn().await.expect("turn");

    expect_that!(harness.mux.client_count(), eq(1));
    drop(stays);
    harness.mux.turn().await.expect("turn");
    expect_that!(harness.mux.client_count(), eq(0));
}
