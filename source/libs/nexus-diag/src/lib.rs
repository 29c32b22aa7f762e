// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Compile-time gated firmware diagnostics with a fatal "dying gasp" path
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests per module + `tests/` (level matrix, macros, install, fatal ordering and entry points)
//! PUBLIC API: log_error!/log_warn!/log_info!/log_debug!, log_sys!, log_kernel!, log_assert!,
//!             log_at!, sdk_log!, call_site!, diag_assert!, init/deinit, install_fatal
//! DEPENDS_ON: spin (Once, Mutex), static_assertions
//! INVARIANTS: Disabled levels never evaluate their arguments; one transport write per record;
//!             fatal path order is suspend -> dying gasp -> ASRT record, and never returns
//!
//! Every record is rendered as a single line
//!
//! ```text
//! [ERR main.rs:42] code 7
//! [SYS] boot
//! ```
//!
//! into a bounded stack buffer and handed to the transport in one `write`. The
//! severity threshold is chosen at build time with the `level-*` features (or
//! the `NEXUS_DIAG_LEVEL` build environment override); the per-level macros
//! branch on a constant, so disabled calls cost nothing and their arguments are
//! never evaluated.
//!
//! ```ignore
//! static UART: nexus_diag::transport::BoardTransport = nexus_diag::transport::board_transport();
//!
//! nexus_diag::init(&UART).ok();
//! nexus_diag::log_sys!("boot");
//! nexus_diag::log_error!("code {}", 7);
//! ```

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod dispatch;
pub mod fatal;
pub mod level;
pub mod line;
mod macros;
pub mod site;
pub mod transport;

pub use config::{OutputMode, OUTPUT_MODE, THRESHOLD};
pub use dispatch::{deinit, emit, emit_to, halted, init, installed, stats, DiagStats, Transport};
pub use fatal::{
    install as install_fatal, DyingGasp, FatalHooks, FatalPath, FatalReport, FatalState, FlushBudget,
    FlushProgress, Scheduler,
};
pub use level::Level;
pub use line::{LineBuffer, MAX_LINE_LEN};
pub use site::{basename, CallSite};

/// Record tags for the channels that are not tied to a severity.
pub mod tag {
    /// Fatal assertion record.
    pub const ASSERT: &str = "ASRT";
    /// Always-on system channel.
    pub const SYS: &str = "SYS";
    /// Kernel/RTOS channel.
    pub const KERNEL: &str = "KRN";
}

/// Errors returned by the one-shot installation entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use = "install errors must be handled"]
pub enum InstallError {
    /// A process-wide handle was already installed; the first one stays active.
    AlreadyInstalled,
}
