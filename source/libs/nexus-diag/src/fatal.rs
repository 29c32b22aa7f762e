// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Fatal assertion path (suspend all tasks, dying gasp, final ASRT record)
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 3 unit tests + `tests/fatal_ordering.rs`, `tests/fatal_entry.rs`, `tests/diag_assert.rs`, `tests/unhooked_fatal.rs`
//! PUBLIC API: Scheduler, DyingGasp, FlushBudget, FatalPath, install(), assert_failed()
//! DEPENDS_ON: dispatch::emit_fatal, spin::Once
//! INVARIANTS: RUNNING -> HALTING -> FLUSHING -> REPORTED, no step skipped or reordered;
//!             the dying gasp is bounded by FlushBudget; assert_failed never returns;
//!             a fatal call during an active sequence parks without restarting it;
//!             the process-wide path halts all non-fatal dispatch before suspending tasks

use core::fmt::Arguments;
use core::sync::atomic::{AtomicU8, Ordering};

use spin::Once;

use crate::config::FLUSH_ATTEMPTS;
use crate::dispatch::{self, emit_fatal, Transport};
use crate::site::CallSite;
use crate::{tag, InstallError};

/// Scheduler collaborator.
pub trait Scheduler: Sync {
    /// Halts every other unit of work. Must be callable from a fatal context and
    /// must take effect system-wide before it returns.
    fn suspend_all(&self);

    /// Terminal wait once the assertion record is out. Boards may reset instead.
    fn park(&self) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}

/// Outcome of a single dying-gasp attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushProgress {
    /// Nothing left to push.
    Drained,
    /// Some output went out; more is pending.
    Pending,
    /// The transport cannot be used from this context; stop trying.
    Unavailable,
}

/// Best-effort flush of buffered diagnostics, invoked after suspension.
pub trait DyingGasp: Sync {
    /// One bounded attempt. Must not block and must not rely on the scheduler.
    fn try_flush(&self) -> FlushProgress;
}

/// Maximum number of `try_flush` attempts per fatal sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushBudget(u32);

impl FlushBudget {
    pub const fn attempts(n: u32) -> Self {
        Self(n)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for FlushBudget {
    fn default() -> Self {
        Self(FLUSH_ATTEMPTS)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FatalState {
    Running = 0,
    Halting = 1,
    Flushing = 2,
    Reported = 3,
}

impl FatalState {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => FatalState::Running,
            1 => FatalState::Halting,
            2 => FatalState::Flushing,
            _ => FatalState::Reported,
        }
    }
}

/// What a fatal sequence managed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FatalReport {
    /// State after the call; `Reported` unless another sequence was already running.
    pub state: FatalState,
    pub flush_attempts: u32,
    /// Last dying-gasp result; `None` if no attempt was made.
    pub flush: Option<FlushProgress>,
}

/// Fatal path controller bound to its collaborators.
pub struct FatalPath<'a> {
    scheduler: &'a dyn Scheduler,
    gasp: &'a dyn DyingGasp,
    transport: Option<&'a dyn Transport>,
    budget: FlushBudget,
    halt_dispatch: bool,
    state: AtomicU8,
}

impl<'a> FatalPath<'a> {
    /// `transport: None` reports through the process-wide transport.
    pub const fn new(
        scheduler: &'a dyn Scheduler,
        gasp: &'a dyn DyingGasp,
        transport: Option<&'a dyn Transport>,
        budget: FlushBudget,
    ) -> Self {
        Self {
            scheduler,
            gasp,
            transport,
            budget,
            halt_dispatch: false,
            state: AtomicU8::new(FatalState::Running as u8),
        }
    }

    /// Path behind `log_assert!`: reports through the installed transport and
    /// halts process-wide dispatch as part of the HALTING step.
    const fn process_wide(
        scheduler: &'a dyn Scheduler,
        gasp: &'a dyn DyingGasp,
        budget: FlushBudget,
    ) -> Self {
        let mut path = Self::new(scheduler, gasp, None, budget);
        path.halt_dispatch = true;
        path
    }

    pub fn state(&self) -> FatalState {
        FatalState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Runs the three fatal steps and returns instead of parking.
    pub fn run(&self, site: CallSite, args: Arguments<'_>) -> FatalReport {
        if self
            .state
            .compare_exchange(
                FatalState::Running as u8,
                FatalState::Halting as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return FatalReport { state: self.state(), flush_attempts: 0, flush: None };
        }

        if self.halt_dispatch {
            dispatch::halt();
        }
        self.scheduler.suspend_all();

        self.state.store(FatalState::Flushing as u8, Ordering::Release);
        let (flush_attempts, flush) = self.dying_gasp();

        emit_fatal(self.transport, tag::ASSERT, Some(site), args);
        self.state.store(FatalState::Reported as u8, Ordering::Release);

        FatalReport { state: FatalState::Reported, flush_attempts, flush }
    }

    /// Runs the fatal sequence, then parks forever.
    pub fn assert_failed(&self, site: CallSite, args: Arguments<'_>) -> ! {
        let _ = self.run(site, args);
        self.scheduler.park()
    }

    fn dying_gasp(&self) -> (u32, Option<FlushProgress>) {
        let mut attempts = 0;
        let mut last = None;
        while attempts < self.budget.get() {
            attempts += 1;
            let progress = self.gasp.try_flush();
            last = Some(progress);
            if progress != FlushProgress::Pending {
                break;
            }
        }
        (attempts, last)
    }
}

/// Process-wide collaborators used by `log_assert!`.
pub struct FatalHooks {
    pub scheduler: &'static dyn Scheduler,
    pub gasp: &'static dyn DyingGasp,
    pub budget: FlushBudget,
}

/// Suspension for contexts where nothing else runs yet (before the scheduler starts).
pub struct NoScheduler;

impl Scheduler for NoScheduler {
    fn suspend_all(&self) {}
}

/// Dying gasp for transports with nothing buffered.
pub struct NothingBuffered;

impl DyingGasp for NothingBuffered {
    fn try_flush(&self) -> FlushProgress {
        FlushProgress::Drained
    }
}

/// Dying gasp of whatever transport is installed (see `Transport::dying_gasp`).
pub struct InstalledGasp;

impl DyingGasp for InstalledGasp {
    fn try_flush(&self) -> FlushProgress {
        match dispatch::installed().and_then(|transport| transport.dying_gasp()) {
            Some(gasp) => gasp.try_flush(),
            None => FlushProgress::Drained,
        }
    }
}

static FATAL: Once<FatalPath<'static>> = Once::new();
static UNHOOKED: FatalPath<'static> =
    FatalPath::process_wide(&NoScheduler, &InstalledGasp, FlushBudget::attempts(FLUSH_ATTEMPTS));

/// Installs the scheduler and dying-gasp collaborators for `log_assert!`.
pub fn install(hooks: FatalHooks) -> Result<(), InstallError> {
    let mut fresh = false;
    FATAL.call_once(|| {
        fresh = true;
        FatalPath::process_wide(hooks.scheduler, hooks.gasp, hooks.budget)
    });
    if fresh {
        Ok(())
    } else {
        Err(InstallError::AlreadyInstalled)
    }
}

/// Entry point behind `log_assert!`. Dispatch is halted either way; without
/// installed hooks no task is suspended and the installed transport's own
/// dying gasp is flushed.
pub fn assert_failed(site: CallSite, args: Arguments<'_>) -> ! {
    FATAL.get().unwrap_or(&UNHOOKED).assert_failed(site, args)
}
