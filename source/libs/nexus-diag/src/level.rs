// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Severity levels and the build-time gate
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 5 unit tests + level matrix property test
//! INVARIANTS: None < Error < Warn < Info < Debug; `None` is never emitted

use crate::config::THRESHOLD;

/// Logging severity. Also used as the threshold type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    None = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl Level {
    pub const ALL: [Level; 5] = [Level::None, Level::Error, Level::Warn, Level::Info, Level::Debug];

    /// Short tag placed in front of every record of this severity.
    pub const fn tag(self) -> &'static str {
        match self {
            Level::None => "",
            Level::Error => "ERR",
            Level::Warn => "WRN",
            Level::Info => "INF",
            Level::Debug => "DBG",
        }
    }

    /// Returns true when a call at `self` is emitted under `threshold`.
    #[inline(always)]
    pub const fn enabled_at(self, threshold: Level) -> bool {
        !matches!(self, Level::None) && self as u8 <= threshold as u8
    }

    /// Gate against the threshold selected for this build.
    #[inline(always)]
    pub const fn is_enabled(self) -> bool {
        self.enabled_at(THRESHOLD)
    }

    /// Parses a level name (`none`, `error`, `warn`, `info`, `debug`), ignoring ASCII case.
    pub const fn parse(raw: &str) -> Option<Level> {
        let raw = raw.as_bytes();
        if eq_ignore_ascii_case(raw, b"none") {
            Some(Level::None)
        } else if eq_ignore_ascii_case(raw, b"error") {
            Some(Level::Error)
        } else if eq_ignore_ascii_case(raw, b"warn") {
            Some(Level::Warn)
        } else if eq_ignore_ascii_case(raw, b"info") {
            Some(Level::Info)
        } else if eq_ignore_ascii_case(raw, b"debug") {
            Some(Level::Debug)
        } else {
            None
        }
    }
}

const fn eq_ignore_ascii_case(lhs: &[u8], rhs: &[u8]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }
    let mut idx = 0;
    while idx < lhs.len() {
        if lhs[idx].to_ascii_lowercase() != rhs[idx].to_ascii_lowercase() {
            return false;
        }
        idx += 1;
    }
    true
}
