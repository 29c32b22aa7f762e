// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::dispatch::Transport;

/// Discards every record (`output-none`).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn write(&self, _bytes: &[u8]) {}
}
