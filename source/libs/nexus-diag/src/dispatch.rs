// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Record dispatch to the transport collaborator
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 4 unit tests; process-wide install covered by `tests/install.rs`
//! PUBLIC API: Transport, init/deinit, installed, emit/emit_to, stats
//! DEPENDS_ON: line::render, spin::Once
//! INVARIANTS: One transport write per record; the transport serializes concurrent writers;
//!             a missing transport drops the record (counted), never faults;
//!             once halted by the fatal path, only fatal writes reach a transport

use core::fmt::Arguments;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use spin::Once;

use crate::config::TX_POLL_LIMIT;
use crate::fatal::DyingGasp;
use crate::line::{render, LineBuffer, MAX_LINE_LEN};
use crate::site::CallSite;
use crate::InstallError;

/// Byte sink that delivers rendered records off-device.
///
/// Implementations own their own locking: the dispatcher calls `write` from any
/// task or interrupt context without coordination.
pub trait Transport: Sync {
    /// Writes one complete record. Best effort; failures are swallowed.
    fn write(&self, bytes: &[u8]);

    /// Write used by the fatal path after all other tasks are suspended. Must
    /// not wait on locks a suspended task may hold.
    fn write_fatal(&self, bytes: &[u8]) {
        self.write(bytes);
    }

    fn init(&self) {}

    fn deinit(&self) {}

    /// Buffered output the fatal path should push out before its record.
    fn dying_gasp(&self) -> Option<&dyn DyingGasp> {
        None
    }
}

static TRANSPORT: Once<&'static dyn Transport> = Once::new();

static EMITTED: AtomicU32 = AtomicU32::new(0);
static TRUNCATED: AtomicU32 = AtomicU32::new(0);
static UNROUTED: AtomicU32 = AtomicU32::new(0);
static SUPPRESSED: AtomicU32 = AtomicU32::new(0);

static HALTED: AtomicBool = AtomicBool::new(false);
static IN_FLIGHT: AtomicU32 = AtomicU32::new(0);

/// Snapshot of the process-wide dispatch counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiagStats {
    /// Records handed to a transport.
    pub emitted: u32,
    /// Records cut short to fit the line buffer.
    pub truncated: u32,
    /// Records dropped because no transport was installed.
    pub unrouted: u32,
    /// Records dropped because the fatal path had already halted dispatch.
    pub suppressed: u32,
}

/// Runs the transport's `init` hook and installs it as the process-wide
/// transport. Readers never see a transport whose hook has not run.
pub fn init(transport: &'static dyn Transport) -> Result<(), InstallError> {
    let mut fresh = false;
    TRANSPORT.call_once(|| {
        fresh = true;
        transport.init();
        transport
    });
    if fresh {
        Ok(())
    } else {
        Err(InstallError::AlreadyInstalled)
    }
}

/// Runs the `deinit` hook of the installed transport, if any.
pub fn deinit() {
    if let Some(transport) = installed() {
        transport.deinit();
    }
}

pub fn installed() -> Option<&'static dyn Transport> {
    TRANSPORT.get().copied()
}

pub fn stats() -> DiagStats {
    DiagStats {
        emitted: EMITTED.load(Ordering::Relaxed),
        truncated: TRUNCATED.load(Ordering::Relaxed),
        unrouted: UNROUTED.load(Ordering::Relaxed),
        suppressed: SUPPRESSED.load(Ordering::Relaxed),
    }
}

/// True once a process-wide fatal sequence has halted dispatch.
pub fn halted() -> bool {
    HALTED.load(Ordering::SeqCst)
}

/// Stops all non-fatal dispatch, then waits (bounded) for writes already past
/// the gate to finish. The wait gives up if the interrupted context is itself
/// mid-write and cannot make progress.
pub(crate) fn halt() {
    HALTED.store(true, Ordering::SeqCst);
    let mut polls = 0;
    while IN_FLIGHT.load(Ordering::SeqCst) != 0 && polls < TX_POLL_LIMIT {
        polls += 1;
        core::hint::spin_loop();
    }
}

/// Renders and forwards a record to the installed transport.
pub fn emit(tag: &str, site: Option<CallSite>, args: Arguments<'_>) {
    match installed() {
        Some(transport) => emit_to(transport, tag, site, args),
        None => {
            UNROUTED.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Renders and forwards a record to an explicit transport.
pub fn emit_to(transport: &dyn Transport, tag: &str, site: Option<CallSite>, args: Arguments<'_>) {
    // Announce the write before checking the gate; `halt` does the reverse.
    IN_FLIGHT.fetch_add(1, Ordering::SeqCst);
    if HALTED.load(Ordering::SeqCst) {
        IN_FLIGHT.fetch_sub(1, Ordering::SeqCst);
        SUPPRESSED.fetch_add(1, Ordering::Relaxed);
        return;
    }
    let line = render_counted(tag, site, args);
    transport.write(line.as_bytes());
    EMITTED.fetch_add(1, Ordering::Relaxed);
    IN_FLIGHT.fetch_sub(1, Ordering::SeqCst);
}

/// Fatal-path variant: same rendering, lock-free transport write.
pub(crate) fn emit_fatal(
    transport: Option<&dyn Transport>,
    tag: &str,
    site: Option<CallSite>,
    args: Arguments<'_>,
) {
    let Some(transport) = transport.or_else(|| installed().map(|t| t as &dyn Transport)) else {
        UNROUTED.fetch_add(1, Ordering::Relaxed);
        return;
    };
    let line = render_counted(tag, site, args);
    transport.write_fatal(line.as_bytes());
    EMITTED.fetch_add(1, Ordering::Relaxed);
}

fn render_counted(tag: &str, site: Option<CallSite>, args: Arguments<'_>) -> LineBuffer<MAX_LINE_LEN> {
    let mut line = LineBuffer::new();
    render(&mut line, tag, site, args);
    if line.is_truncated() {
        TRUNCATED.fetch_add(1, Ordering::Relaxed);
    }
    line
}
