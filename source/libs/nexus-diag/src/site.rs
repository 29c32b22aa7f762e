// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Call-site tokens: file basename plus line number.
//!
//! `basename` is a `const fn`, so `call_site!()` folds the token into a
//! constant per call site; calling it at runtime gives the same answer.

use core::fmt;

/// Returns the part of `path` after the last `/` or `\`, or all of `path`.
pub const fn basename(path: &str) -> &str {
    let bytes = path.as_bytes();
    let mut start = 0;
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'/' || bytes[idx] == b'\\' {
            start = idx + 1;
        }
        idx += 1;
    }
    // Separators are ASCII, so `start` always lands on a char boundary.
    let (_, tail) = bytes.split_at(start);
    match core::str::from_utf8(tail) {
        Ok(name) => name,
        Err(_) => path,
    }
}

/// Source location attached to a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    /// Builds a token from a full source path, keeping only the basename.
    pub const fn new(path: &'static str, line: u32) -> Self {
        Self { file: basename(path), line }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::{basename, CallSite};
    use proptest::prelude::*;

    #[test]
    fn basename_cases() {
        assert_eq!(basename(""), "");
        assert_eq!(basename("main.c"), "main.c");
        assert_eq!(basename("a/b/c.c"), "c.c");
        assert_eq!(basename("a\\b\\c.c"), "c.c");
        assert_eq!(basename("a/b\\c/d.c"), "d.c");
    }

    #[test]
    fn trailing_separator_yields_empty_token() {
        assert_eq!(basename("src/"), "");
    }

    #[test]
    fn folds_at_compile_time() {
        const NAME: &str = basename("source/libs/nexus-diag/src/site.rs");
        assert_eq!(NAME, "site.rs");
    }

    #[test]
    fn call_site_macro_points_here() {
        let site = crate::call_site!();
        assert_eq!(site.file, "site.rs");
        assert_eq!(site.line, line!() - 2);
    }

    #[test]
    fn display_is_file_colon_line() {
        let site = CallSite::new("a/b/main.rs", 42);
        let mut buf = crate::line::LineBuffer::<32>::new();
        core::fmt::Write::write_fmt(&mut buf, format_args!("{site}")).unwrap();
        assert_eq!(buf.as_str(), "main.rs:42");
    }

    proptest! {
        #[test]
        fn token_is_separator_free_suffix(path in "[a-z/\\\\.]{0,32}") {
            let token = basename(&path);
            prop_assert!(path.ends_with(token));
            prop_assert!(!token.contains('/') && !token.contains('\\'));
            if !path.contains('/') && !path.contains('\\') {
                prop_assert_eq!(token, path.as_str());
            }
        }
    }
}
