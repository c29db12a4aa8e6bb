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

//! Board support.
//!
//! [`platform`] defines the [`HardwareControl`](platform::HardwareControl) trait and the
//! registry that maps config names to implementations. The implementations are
//! [`novena`] (`novena-eim`), the i.MX6 EIM bridge on the Novena board, and [`null`]
//! (`null`), which only logs and lets the daemon run on machines without an FPGA.

pub mod novena;
pub mod novena_components;
pub mod null;
pub mod platform;
