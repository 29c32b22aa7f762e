//! CONTEXT: Tests for the logging macro surface
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 9 tests
//!
//! TEST_SCOPE:
//!   - Threshold gating through log_at! and the per-level macros
//!   - Argument evaluation is skipped for disabled levels
//!   - System and kernel channels
//!   - Call-site tokens on emitted records
//!
//! TEST_SCENARIOS:
//!   - warn_threshold_end_to_end(): ERR emitted with payload, DBG dropped, SYS always out
//!   - disabled_level_skips_argument_evaluation(): side effects never run when gated off
//!   - system_channel_ignores_threshold(): SYS emitted at every threshold including NONE
//!   - kernel_channel_uses_krn_tag(): KRN tag with call site
//!   - per_level_macros_follow_build_threshold(): log_error!..log_debug! against THRESHOLD
//!   - level_expression_is_evaluated_once(): gate and tag share one evaluation
//!
//! DEPENDENCIES:
//!   - nexus_diag macros and Transport
use std::cell::Cell;
use std::sync::Mutex;

use nexus_diag::{log_at, log_debug, log_error, log_info, log_kernel, log_sys, log_warn, sdk_log};
use nexus_diag::{Level, Transport, THRESHOLD};

#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl Recorder {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Transport for Recorder {
    fn write(&self, bytes: &[u8]) {
        self.0.lock().unwrap().push(String::from_utf8_lossy(bytes).into_owned());
    }
}

#[test]
fn warn_threshold_end_to_end() {
    let rec = Recorder::default();
    log_at!(threshold: Level::Warn, Level::Error, sink: &rec, "code {}", 7);
    log_at!(threshold: Level::Warn, Level::Debug, sink: &rec, "x");
    log_sys!(sink: &rec, "boot");

    let lines = rec.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("[ERR macros.rs:"));
    assert!(lines[0].ends_with("] code 7\n"));
    assert_eq!(lines[1], "[SYS] boot\n");
}

#[test]
fn disabled_level_skips_argument_evaluation() {
    let rec = Recorder::default();
    let calls = Cell::new(0u32);
    let bump = || {
        calls.set(calls.get() + 1);
        calls.get()
    };
    for _ in 0..3 {
        log_at!(threshold: Level::Warn, Level::Info, sink: &rec, "{}", bump());
        log_at!(threshold: Level::None, Level::Error, sink: &rec, "{}", bump());
    }
    assert_eq!(calls.get(), 0);
    assert!(rec.lines().is_empty());

    log_at!(threshold: Level::Warn, Level::Warn, sink: &rec, "{}", bump());
    assert_eq!(calls.get(), 1);
    assert_eq!(rec.lines().len(), 1);
}

#[test]
fn disabled_level_never_evaluates_the_sink() {
    let sink_evaluations = Cell::new(0u32);
    let rec = Recorder::default();
    let sink = || {
        sink_evaluations.set(sink_evaluations.get() + 1);
        &rec
    };
    log_at!(threshold: Level::Error, Level::Debug, sink: sink(), "dropped");
    assert_eq!(sink_evaluations.get(), 0);
}

#[test]
fn system_channel_ignores_threshold() {
    let rec = Recorder::default();
    for threshold in Level::ALL {
        log_at!(threshold: threshold, Level::Error, sink: &rec, "gated");
        log_sys!(sink: &rec, "always {}", threshold as u8);
    }
    let sys = rec.lines().into_iter().filter(|l| l.starts_with("[SYS] always")).count();
    assert_eq!(sys, Level::ALL.len());
}

#[test]
fn kernel_channel_uses_krn_tag() {
    let rec = Recorder::default();
    log_at!(threshold: Level::Info, Level::Info => nexus_diag::tag::KERNEL, sink: &rec, "tick {}", 3);
    log_at!(threshold: Level::Warn, Level::Info => nexus_diag::tag::KERNEL, sink: &rec, "hidden");
    let lines = rec.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[KRN macros.rs:"));
    assert!(lines[0].ends_with("] tick 3\n"));
}

#[test]
fn record_carries_the_invoking_line() {
    let rec = Recorder::default();
    let line = line!() + 1;
    sdk_log!(sink: &rec, "DBG", "here");
    assert_eq!(rec.lines()[0], format!("[DBG macros.rs:{line}] here\n"));
}

#[test]
fn per_level_macros_follow_build_threshold() {
    let rec = Recorder::default();
    log_error!(sink: &rec, "e");
    log_warn!(sink: &rec, "w");
    log_info!(sink: &rec, "i");
    log_debug!(sink: &rec, "d");
    log_kernel!(sink: &rec, "k");

    let lines = rec.lines();
    let expected: Vec<&str> = [
        (Level::Error, "ERR"),
        (Level::Warn, "WRN"),
        (Level::Info, "INF"),
        (Level::Debug, "DBG"),
        (Level::Info, "KRN"),
    ]
    .iter()
    .filter(|(level, _)| level.enabled_at(THRESHOLD))
    .map(|(_, tag)| *tag)
    .collect();
    assert_eq!(lines.len(), expected.len());
    for (line, tag) in lines.iter().zip(expected) {
        assert!(line.starts_with(&format!("[{tag} macros.rs:")), "{line}");
    }
}

#[test]
fn overlong_record_is_truncated_and_next_is_whole() {
    let rec = Recorder::default();
    let big = "z".repeat(4 * nexus_diag::MAX_LINE_LEN);
    log_sys!(sink: &rec, "{big}");
    log_sys!(sink: &rec, "after");
    let lines = rec.lines();
    assert_eq!(lines[0].len(), nexus_diag::MAX_LINE_LEN);
    assert!(lines[0].ends_with('\n'));
    assert_eq!(lines[1], "[SYS] after\n");
}

#[test]
fn level_expression_is_evaluated_once() {
    let rec = Recorder::default();
    let picks = Cell::new(0u32);
    let pick = || {
        picks.set(picks.get() + 1);
        Level::Warn
    };
    log_at!(threshold: Level::Debug, pick(), sink: &rec, "once");
    assert_eq!(picks.get(), 1);
    log_at!(threshold: Level::Error, pick(), sink: &rec, "gated");
    assert_eq!(picks.get(), 2);
    let lines = rec.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[WRN macros.rs:"));
}
