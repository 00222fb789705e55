// The session-ending guarantees: at-most-once submission across racing
// triggers, the validation boundary, the fixed violation counting, and the
// best-effort evidence paths, all observed through the mock backend.

use std::time::{Duration, Instant};

use assert_matches::assert_matches;

use invigil::backend::MockBackend;
use invigil::controller::{SessionController, SessionPhase, SubmissionReason};
use invigil::session::SessionConfig;
use invigil::snapshot::{CommandSnapshotSource, NoCameraSource, SnapshotSource};
use invigil::violations::ProctorSignal;
use invigil::TICK_RATE_MS;

fn started<S: SnapshotSource>(
    config: SessionConfig,
    backend: MockBackend,
    camera: S,
    start: Instant,
) -> SessionController<MockBackend, S> {
    let mut controller = SessionController::new("prop-link", config, backend, camera);
    controller.load_task("candidate-session");
    controller.begin(start);
    controller
}

fn type_n(
    controller: &mut SessionController<MockBackend, impl SnapshotSource>,
    n: usize,
    at: Instant,
) {
    for _ in 0..n {
        controller.push_char('q', at);
    }
}

fn ticks_per_sec() -> u64 {
    1000 / TICK_RATE_MS
}

#[test]
fn expiry_idle_and_manual_in_one_tick_pick_one_winner() {
    // Deadline one second, last keystroke long enough ago that the idle
    // threshold has also been crossed: the first trigger processed wins.
    let mut config = SessionConfig::default();
    config.deadline_secs = 1;
    let backend = MockBackend::new();
    let calls = backend.calls();
    let start = Instant::now();
    let mut controller = started(config, backend, NoCameraSource, start);
    type_n(&mut controller, 60, start);

    let racy_now = start + Duration::from_secs(61);
    // First tick: idle fires before the clock has counted down
    controller.on_tick(racy_now);
    // Same logical instant: the losing triggers are no-ops
    assert!(!controller.submit_manual(racy_now));
    for _ in 0..ticks_per_sec() {
        controller.on_tick(racy_now);
    }

    assert_eq!(controller.phase(), SessionPhase::Submitted);
    assert_matches!(
        controller.submission().unwrap().reason,
        SubmissionReason::Idle
    );
    assert_eq!(calls.borrow().submissions.len(), 1);
}

#[test]
fn manual_wins_when_it_arrives_first() {
    let mut config = SessionConfig::default();
    config.deadline_secs = 1;
    let backend = MockBackend::new();
    let calls = backend.calls();
    let start = Instant::now();
    let mut controller = started(config, backend, NoCameraSource, start);
    type_n(&mut controller, 60, start);

    assert!(controller.submit_manual(start));
    // Expiry and idle arriving afterwards are no-ops
    for _ in 0..(2 * ticks_per_sec()) {
        controller.on_tick(start + Duration::from_secs(61));
    }

    assert_eq!(calls.borrow().submissions.len(), 1);
    assert_matches!(
        controller.submission().unwrap().reason,
        SubmissionReason::Manual
    );
}

#[test]
fn double_manual_trigger_submits_once() {
    let backend = MockBackend::new();
    let calls = backend.calls();
    let start = Instant::now();
    let mut controller = started(SessionConfig::default(), backend, NoCameraSource, start);
    type_n(&mut controller, 50, start);

    assert!(controller.submit_manual(start));
    assert!(!controller.submit_manual(start));
    assert_eq!(calls.borrow().submissions.len(), 1);
    assert_eq!(calls.borrow().task_fetches.len(), 1);
}

#[test]
fn validation_boundary_at_minimum_length() {
    let start = Instant::now();

    // 49 trimmed chars: rejected, no state change
    let mut rejected = started(
        SessionConfig::default(),
        MockBackend::new(),
        NoCameraSource,
        start,
    );
    type_n(&mut rejected, 49, start);
    assert!(!rejected.submit_manual(start));
    assert_eq!(rejected.phase(), SessionPhase::InProgress);

    // Exactly 50: accepted
    let mut accepted = started(
        SessionConfig::default(),
        MockBackend::new(),
        NoCameraSource,
        start,
    );
    type_n(&mut accepted, 50, start);
    assert!(accepted.submit_manual(start));
    assert_eq!(accepted.phase(), SessionPhase::Submitted);
}

#[test]
fn whitespace_padding_does_not_pass_validation() {
    let start = Instant::now();
    let mut controller = started(
        SessionConfig::default(),
        MockBackend::new(),
        NoCameraSource,
        start,
    );

    type_n(&mut controller, 49, start);
    for _ in 0..10 {
        controller.push_char(' ', start);
    }
    assert!(!controller.submit_manual(start));
}

#[test]
fn tab_hide_then_blur_yields_two_tab_switches_one_blur() {
    let backend = MockBackend::new();
    let start = Instant::now();
    let mut controller = started(SessionConfig::default(), backend, NoCameraSource, start);

    controller.on_signal(ProctorSignal::ViewHidden, start);
    controller.on_signal(ProctorSignal::FocusLost, start);

    assert_eq!(controller.warnings().len(), 2);

    type_n(&mut controller, 50, start);
    controller.submit_manual(start);
    let metrics = &controller.submission().unwrap().metrics;
    assert_eq!(metrics.tab_switch_count, 2);
    assert_eq!(metrics.window_blur_count, 1);
}

#[test]
fn warning_banner_retains_most_recent_four() {
    let start = Instant::now();
    let mut controller = started(
        SessionConfig::default(),
        MockBackend::new(),
        NoCameraSource,
        start,
    );

    for _ in 0..6 {
        controller.on_signal(ProctorSignal::FocusLost, start);
    }
    assert_eq!(controller.warnings().len(), 4);
    assert_eq!(
        controller.warnings().latest(),
        Some("⚠️ WINDOW_BLUR detected. Please stay focused on the test.")
    );
}

#[test]
fn camera_denied_submission_has_no_snapshots() {
    let backend = MockBackend::new();
    let calls = backend.calls();
    let start = Instant::now();
    let mut controller = started(SessionConfig::default(), backend, NoCameraSource, start);
    type_n(&mut controller, 50, start);

    assert!(controller.submit_manual(start));
    assert!(controller.submission().unwrap().snapshots.is_empty());
    assert!(calls.borrow().submissions[0].1.snapshots.is_empty());
}

#[cfg(unix)]
#[test]
fn capture_command_evidence_rides_along() {
    let backend = MockBackend::new();
    let calls = backend.calls();
    let start = Instant::now();
    // Stand-in capture command emitting fixed bytes as the "frame"
    let camera = CommandSnapshotSource::new("printf 'frame-bytes'");
    let mut controller = started(SessionConfig::default(), backend, camera, start);
    type_n(&mut controller, 50, start);

    assert!(controller.submit_manual(start));
    let submission = controller.submission().unwrap();
    assert_eq!(submission.snapshots.len(), 1);

    let calls = calls.borrow();
    let wire = &calls.submissions[0].1.snapshots;
    assert_eq!(wire.len(), 1);
    assert!(wire[0].starts_with("data:image/jpeg;base64,"));
}

#[test]
fn timeout_submission_reports_auto_submit_marker() {
    let mut config = SessionConfig::default();
    config.deadline_secs = 2;
    let backend = MockBackend::new();
    let calls = backend.calls();
    let start = Instant::now();
    let mut controller = started(config, backend, NoCameraSource, start);

    for i in 0..(3 * ticks_per_sec()) {
        controller.on_tick(start + Duration::from_millis(i * TICK_RATE_MS));
    }

    assert_eq!(controller.phase(), SessionPhase::Submitted);
    let calls = calls.borrow();
    let (link, event_type, payload) = calls.events.last().unwrap();
    assert_eq!(link, "prop-link");
    assert_eq!(event_type, "AUTO_SUBMIT");
    assert_eq!(payload["reason"], "TIMEOUT");
    assert_eq!(payload["charCount"], 0);
}

#[test]
fn first_idle_episode_ends_the_session() {
    // Re-arm across episodes is a monitor-level property; at session level
    // the first idle episode is already terminal and the frozen metrics
    // carry exactly one idle-driven focus loss.
    let backend = MockBackend::new();
    let start = Instant::now();
    let mut controller = started(SessionConfig::default(), backend, NoCameraSource, start);
    type_n(&mut controller, 10, start);

    controller.on_tick(start + Duration::from_secs(61));
    assert_eq!(controller.phase(), SessionPhase::Submitted);
    let metrics = &controller.submission().unwrap().metrics;
    assert_eq!(metrics.focus_loss_count, 1);
    assert_matches!(
        controller.submission().unwrap().reason,
        SubmissionReason::Idle
    );
}
