// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Logging macros (per-severity, system, kernel, fatal)
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: `tests/macros.rs`, `tests/level_matrix.rs`
//! INVARIANTS: The gate is evaluated before `format_args!`; a disabled call evaluates nothing
//!
//! Every macro accepts an optional leading `sink: <&dyn Transport>,` to bypass
//! the installed transport.

/// Compile-time call-site token for the invoking line.
#[macro_export]
macro_rules! call_site {
    () => {{
        const SITE: $crate::CallSite = $crate::CallSite::new(file!(), line!());
        SITE
    }};
}

/// Ungated record with the caller's location.
#[macro_export]
macro_rules! sdk_log {
    (sink: $sink:expr, $tag:expr, $($arg:tt)+) => {
        $crate::dispatch::emit_to($sink, $tag, Some($crate::call_site!()), format_args!($($arg)+))
    };
    ($tag:expr, $($arg:tt)+) => {
        $crate::dispatch::emit($tag, Some($crate::call_site!()), format_args!($($arg)+))
    };
}

/// Record gated against an explicit threshold.
///
/// `log_at!(threshold: T, Level::Warn, "...")` tags with the level's own tag;
/// `log_at!(threshold: T, Level::Info => "KRN", "...")` overrides the tag.
#[macro_export]
macro_rules! log_at {
    (threshold: $threshold:expr, $level:expr => $tag:expr, sink: $sink:expr, $($arg:tt)+) => {{
        let level: $crate::Level = $level;
        if level.enabled_at($threshold) {
            $crate::sdk_log!(sink: $sink, $tag, $($arg)+);
        }
    }};
    (threshold: $threshold:expr, $level:expr => $tag:expr, $($arg:tt)+) => {{
        let level: $crate::Level = $level;
        if level.enabled_at($threshold) {
            $crate::sdk_log!($tag, $($arg)+);
        }
    }};
    (threshold: $threshold:expr, $level:expr, sink: $sink:expr, $($arg:tt)+) => {{
        let level: $crate::Level = $level;
        if level.enabled_at($threshold) {
            $crate::sdk_log!(sink: $sink, level.tag(), $($arg)+);
        }
    }};
    (threshold: $threshold:expr, $level:expr, $($arg:tt)+) => {{
        let level: $crate::Level = $level;
        if level.enabled_at($threshold) {
            $crate::sdk_log!(level.tag(), $($arg)+);
        }
    }};
}

#[macro_export]
macro_rules! log_error {
    (sink: $sink:expr, $($arg:tt)+) => {
        $crate::log_at!(threshold: $crate::THRESHOLD, $crate::Level::Error, sink: $sink, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log_at!(threshold: $crate::THRESHOLD, $crate::Level::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_warn {
    (sink: $sink:expr, $($arg:tt)+) => {
        $crate::log_at!(threshold: $crate::THRESHOLD, $crate::Level::Warn, sink: $sink, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log_at!(threshold: $crate::THRESHOLD, $crate::Level::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_info {
    (sink: $sink:expr, $($arg:tt)+) => {
        $crate::log_at!(threshold: $crate::THRESHOLD, $crate::Level::Info, sink: $sink, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log_at!(threshold: $crate::THRESHOLD, $crate::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_debug {
    (sink: $sink:expr, $($arg:tt)+) => {
        $crate::log_at!(threshold: $crate::THRESHOLD, $crate::Level::Debug, sink: $sink, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log_at!(threshold: $crate::THRESHOLD, $crate::Level::Debug, $($arg)+)
    };
}

/// Kernel/RTOS channel: `KRN` tag, gated like `log_info!`.
#[macro_export]
macro_rules! log_kernel {
    (sink: $sink:expr, $($arg:tt)+) => {
        $crate::log_at!(threshold: $crate::THRESHOLD, $crate::Level::Info => $crate::tag::KERNEL, sink: $sink, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log_at!(threshold: $crate::THRESHOLD, $crate::Level::Info => $crate::tag::KERNEL, $($arg)+)
    };
}

/// System channel: `SYS` tag, no location, emitted at every threshold.
#[macro_export]
macro_rules! log_sys {
    (sink: $sink:expr, $($arg:tt)+) => {
        $crate::dispatch::emit_to($sink, $crate::tag::SYS, None, format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::dispatch::emit($crate::tag::SYS, None, format_args!($($arg)+))
    };
}

/// Fatal assertion: suspend all tasks, dying gasp, `ASRT` record. Never returns.
#[macro_export]
macro_rules! log_assert {
    ($($arg:tt)+) => {
        $crate::fatal::assert_failed($crate::call_site!(), format_args!($($arg)+))
    };
}

/// Checks `cond` and takes the fatal path when it does not hold.
#[macro_export]
macro_rules! diag_assert {
    ($cond:expr $(,)?) => {
        $crate::diag_assert!($cond, "assertion failed: {}", stringify!($cond))
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::log_assert!($($arg)+);
        }
    };
}
