// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Bounded line rendering for log records
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 5 unit tests + truncation property test
//! INVARIANTS: Never writes past N bytes; the final byte is reserved for '\n';
//!             truncation happens on a char boundary and is silent

use core::fmt::{self, Write};

use static_assertions::const_assert;

use crate::site::CallSite;

/// Capacity of the stack buffer each record is rendered into.
pub const MAX_LINE_LEN: usize = 256;

// Room for the longest header ("[ASRT " + basename + ":4294967295] ") and some text.
const_assert!(MAX_LINE_LEN >= 64);
const_assert!(MAX_LINE_LEN <= 1024);

/// Fixed-size line buffer with silent truncation.
pub struct LineBuffer<const N: usize = MAX_LINE_LEN> {
    buf: [u8; N],
    len: usize,
    truncated: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self { buf: [0u8; N], len: 0, truncated: false }
    }

    /// Bytes available for text; one byte stays free for the line terminator.
    const fn text_capacity() -> usize {
        N.saturating_sub(1)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn as_str(&self) -> &str {
        // Only whole chars are ever copied in.
        core::str::from_utf8(self.as_bytes()).unwrap_or("")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.truncated = false;
    }

    fn push_str(&mut self, s: &str) {
        if self.truncated {
            return;
        }
        let room = Self::text_capacity().saturating_sub(self.len);
        let mut take = s.len();
        if take > room {
            self.truncated = true;
            take = room;
            while take > 0 && !s.is_char_boundary(take) {
                take -= 1;
            }
        }
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
    }

    /// Appends the terminating newline into the reserved byte.
    pub fn finish(&mut self) {
        if self.len < N {
            self.buf[self.len] = b'\n';
            self.len += 1;
        }
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Write for LineBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

/// Renders `[TAG file:line] message\n` (or `[TAG] message\n` without a call site).
pub fn render<const N: usize>(
    line: &mut LineBuffer<N>,
    tag: &str,
    site: Option<CallSite>,
    args: fmt::Arguments<'_>,
) {
    line.push_str("[");
    line.push_str(tag);
    if let Some(site) = site {
        line.push_str(" ");
        let _ = write!(line, "{site}");
    }
    line.push_str("] ");
    // User `Display` impls may report errors; whatever they wrote is kept.
    let _ = line.write_fmt(args);
    line.finish();
}

#[cfg(test)]
mod tests {
    use super::{render, LineBuffer, MAX_LINE_LEN};
    use crate::site::CallSite;
    use proptest::prelude::*;

    #[test]
    fn renders_tag_site_and_message() {
        let mut line = LineBuffer::<MAX_LINE_LEN>::new();
        render(&mut line, "ERR", Some(CallSite::new("src/app/main.rs", 12)), format_args!("code {}", 7));
        assert_eq!(line.as_str(), "[ERR main.rs:12] code 7\n");
        assert!(!line.is_truncated());
    }

    #[test]
    fn renders_without_site() {
        let mut line = LineBuffer::<MAX_LINE_LEN>::new();
        render(&mut line, "SYS", None, format_args!("boot"));
        assert_eq!(line.as_str(), "[SYS] boot\n");
    }

    #[test]
    fn overlong_message_is_truncated_and_terminated() {
        let mut line = LineBuffer::<16>::new();
        render(&mut line, "INF", None, format_args!("{}", "x".repeat(64)));
        assert!(line.is_truncated());
        assert_eq!(line.len(), 16);
        assert_eq!(line.as_str(), "[INF] xxxxxxxxx\n");
    }

    #[test]
    fn truncation_keeps_whole_chars() {
        let mut line = LineBuffer::<8>::new();
        render(&mut line, "I", None, format_args!("ééé"));
        // "[I] " is 4 bytes, 3 bytes of text room: one 'é' fits.
        assert_eq!(line.as_str(), "[I] é\n");
    }

    #[test]
    fn clear_resets_state() {
        let mut line = LineBuffer::<8>::new();
        render(&mut line, "WRN", None, format_args!("too long to fit"));
        line.clear();
        assert!(line.is_empty());
        assert!(!line.is_truncated());
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(msg in ".{0,400}") {
            let mut line = LineBuffer::<MAX_LINE_LEN>::new();
            render(&mut line, "DBG", Some(CallSite::new("x.rs", 1)), format_args!("{msg}"));
            prop_assert!(line.len() <= MAX_LINE_LEN);
            prop_assert!(line.as_bytes().ends_with(b"\n"));
            prop_assert!(core::str::from_utf8(line.as_bytes()).is_ok());
        }
    }
}
