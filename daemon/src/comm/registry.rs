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

//! Fixed-capacity table of connected clients.
//!
//! Entries keep their index until the next batch removal, so indices collected while
//! servicing a round of ready clients stay valid for the whole round. Removal swaps the
//! last live entry into each vacated slot; order is not preserved.

use crate::error::BalboadError;

/// Most clients that can be connected at once.
pub const MAX_CLIENTS: usize = 100;

#[derive(Debug)]
pub struct ClientRegistry<T> {
    entries: Vec<T>,
    capacity: usize,
}

impl<T> Default for ClientRegistry<T> {
    fn default() -> Self {
        Self::with_capacity(MAX_CLIENTS)
    }
}

impl<T> ClientRegistry<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        ClientRegistry {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a client.
    ///
    /// # Returns: `Result<usize, BalboadError>`
    /// * `Ok(usize)` - Index of the new entry
    /// * `Err(BalboadError::TooManyClients)` - The table is full. The client is dropped.
    pub fn insert(&mut self, client: T) -> Result<usize, BalboadError> {
        if self.entries.len() >= self.capacity {
            return Err(BalboadError::TooManyClients {
                count: self.entries.len() + 1,
                capacity: self.capacity,
            });
        }
        self.entries.push(client);
        Ok(self.entries.len() - 1)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.entries.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Remove every entry in `marked` and return them.
    ///
    /// Indices are handled from the highest down, so each swap only ever pulls in an
    /// entry that is not itself marked. Duplicates and out-of-range indices are ignored.
    pub fn remove_marked(&mut self, mut marked: Vec<usize>) -> Vec<T> {
        marked.sort_unstable_by(|a, b| b.cmp(a));
        marked.dedup();
        let mut removed = Vec::with_capacity(marked.len());
        for index in marked {
            if index < self.entries.len() {
                removed.push(self.entries.swap_remove(index));
            }
        }
        removed
    }
}
