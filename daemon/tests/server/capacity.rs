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
use balboad::comm::registry::MAX_CLIENTS;
use googletest::prelude::*;

#[gtest]
#[tokio::test]
async fn client_past_the_limit_is_fatal() {
    let mut harness = Harness::builder().build();
    let mut clients = Vec::new();
    for _ in 0..MAX_CLIENTS {
        clients.push(harness.connect_and_greet().await);
    }
    expect_that!(harness.mux.client_count(), eq(MAX_CLIENTS));

    let _one_too_many = harness.connect(b"hi\n");
    let err = harness
        .mux
        .turn()
        .await
        .expect_err("registry is full");

    expect_that!(err.is_fatal(), eq(true));
    expect_that!(
        err.to_string(),
        contains_substring("too many clients! 101 > 100")
    );
}

#[gtest]
#[tokio::test]
async fn departures_free_slots() {
    let mut harness = Harness::builder().capacity(2).build();
    let first = harness.connect_and_greet().await;
    let _second = harness.connect_and_greet().await;

    drop(first);
    harness.mux.turn().await.expect("turn");
    let _third = harness.connect_and_greet().await;

    expect_that!(harness.mux.client_count(), eq(2));
}

#[gtest]
#[tokio::test]
async fn run_returns_the_fatal_error() {
    let mut harness = Harness::builder().capacity(0).build();
    let _client = harness.connect(b"hi\n");

    let result = harness.mux.run().await;

    expect_that!(
        result.map(|_| ()),
        err(displays_as(contains_substring("BalboadError::TooManyClients")))
    );
}
