use std::time::Instant;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::backend::{Backend, SubmissionBody};
use crate::clock::Clock;
use crate::metrics::{BehaviorMetrics, MetricsAggregator};
use crate::session::{SessionConfig, WarningLog};
use crate::snapshot::{Snapshot, SnapshotSource};
use crate::task::{Task, TaskLoader};
use crate::util::trimmed_len;
use crate::violations::{ProctorSignal, ViolationKind, ViolationMonitor};

/// Lifecycle of one assessment attempt. Submitted and Failed are terminal;
/// Submitted is entered at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
    InProgress,
    Submitting,
    Submitted,
    Failed,
}

/// Why the session ended. Display names match the telemetry wire values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionReason {
    Manual,
    Timeout,
    ViolationEscalation,
    Idle,
}

/// The single immutable record a session terminates in.
#[derive(Clone, Debug)]
pub struct SubmissionPayload {
    pub answer_text: String,
    pub metrics: BehaviorMetrics,
    pub snapshots: Vec<Snapshot>,
    pub reason: SubmissionReason,
}

const AUTO_SUBMIT_PLACEHOLDER: &str = "(auto-submitted)";

/// The proctored session state machine.
///
/// Every trigger that could end the session (manual submit, clock expiry,
/// idle timeout, escalation limit) funnels through [`try_submit`], which
/// checks-and-sets the `submitted` guard before doing anything else. All
/// handlers run on one event loop, so the guard is a plain bool and no
/// handler can observe the state between check and set.
///
/// [`try_submit`]: SessionController::try_submit
pub struct SessionController<B: Backend, S: SnapshotSource> {
    test_link: String,
    config: SessionConfig,
    backend: B,
    camera: S,

    phase: SessionPhase,
    task: Option<Task>,
    load_error: Option<String>,
    answer: String,
    clock: Clock,
    monitor: ViolationMonitor,
    metrics: Option<MetricsAggregator>,
    warnings: WarningLog,

    // At-most-once submission guard
    submitted: bool,
    submission: Option<SubmissionPayload>,
}

impl<B: Backend, S: SnapshotSource> SessionController<B, S> {
    pub fn new(test_link: impl Into<String>, config: SessionConfig, backend: B, camera: S) -> Self {
        let clock = Clock::new(config.deadline_secs);
        let monitor = ViolationMonitor::new(config.idle_timeout_secs);
        Self {
            test_link: test_link.into(),
            config,
            backend,
            camera,
            phase: SessionPhase::Loading,
            task: None,
            load_error: None,
            answer: String::new(),
            clock,
            monitor,
            metrics: None,
            warnings: WarningLog::default(),
            submitted: false,
            submission: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn warnings(&self) -> &WarningLog {
        &self.warnings
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn camera_available(&self) -> bool {
        self.camera.is_available()
    }

    pub fn min_answer_chars(&self) -> usize {
        self.config.min_answer_chars
    }

    /// The payload produced by the one successful submission, if any.
    pub fn submission(&self) -> Option<&SubmissionPayload> {
        self.submission.as_ref()
    }

    /// One-shot task fetch. Loading -> Ready on success, Loading -> Failed
    /// with a user-facing message on failure; the candidate must reopen the
    /// session to retry.
    pub fn load_task(&mut self, prior_session_id: &str) {
        debug_assert_eq!(self.phase, SessionPhase::Loading);
        match TaskLoader::load(&self.backend, &self.test_link, prior_session_id) {
            Ok(task) => {
                info!(task = %task.name, "task loaded");
                self.task = Some(task);
                self.phase = SessionPhase::Ready;
            }
            Err(err) => {
                warn!(%err, "task load failed");
                self.load_error = Some(err.to_string());
                self.phase = SessionPhase::Failed;
            }
        }
    }

    /// Enter InProgress: the countdown and the metrics window start here,
    /// on the first render of the loaded task.
    pub fn begin(&mut self, now: Instant) {
        if self.phase != SessionPhase::Ready {
            return;
        }
        self.metrics = Some(MetricsAggregator::new(now));
        self.phase = SessionPhase::InProgress;
    }

    fn accepting_input(&self) -> bool {
        self.phase == SessionPhase::InProgress && !self.submitted
    }

    /// Candidate typed one character into the answer.
    pub fn push_char(&mut self, c: char, now: Instant) {
        if !self.accepting_input() {
            return;
        }
        self.answer.push(c);
        self.note_activity(now);
    }

    pub fn push_newline(&mut self, now: Instant) {
        self.push_char('\n', now);
    }

    pub fn backspace(&mut self, now: Instant) {
        if !self.accepting_input() {
            return;
        }
        self.answer.pop();
        self.note_activity(now);
    }

    /// Bracketed paste: the text still lands in the answer (detection is
    /// advisory, not preventive) and a PASTE_ATTEMPT is recorded.
    pub fn on_paste(&mut self, text: &str, now: Instant) {
        if !self.accepting_input() {
            return;
        }
        self.answer.push_str(text);
        self.note_activity(now);
        self.record_violation(ViolationKind::PasteAttempt, now);
    }

    fn note_activity(&mut self, now: Instant) {
        if let Some(metrics) = self.metrics.as_mut() {
            metrics.record_keystroke(now);
        }
        self.monitor.record_keystroke(now);
    }

    /// A raw proctoring signal observed by the runtime.
    pub fn on_signal(&mut self, signal: ProctorSignal, now: Instant) {
        if !self.accepting_input() {
            return;
        }
        let kind = ViolationMonitor::classify(signal);
        self.record_violation(kind, now);
    }

    /// Tick handler: countdown, expiry auto-submit, idle poll.
    pub fn on_tick(&mut self, now: Instant) {
        if !self.accepting_input() {
            return;
        }
        self.clock.on_tick();
        if self.clock.poll_expired() {
            self.try_submit(SubmissionReason::Timeout, now);
            return;
        }
        if let Some(event) = self.monitor.poll_idle(now) {
            self.record_violation(event.kind, now);
        }
    }

    /// Record a classified violation: counters, warning banner, telemetry.
    /// IDLE_TIMEOUT (and the optional escalation limit) end the session;
    /// everything else only counts and warns.
    pub fn record_violation(&mut self, kind: ViolationKind, now: Instant) {
        if !self.accepting_input() {
            return;
        }
        if let Some(metrics) = self.metrics.as_mut() {
            metrics.record_violation(kind);
        }
        self.warnings
            .push(format!("⚠️ {kind} detected. Please stay focused on the test."));
        self.report_event(&kind.to_string(), json!({}));

        if kind == ViolationKind::IdleTimeout {
            self.try_submit(SubmissionReason::Idle, now);
            return;
        }
        if let (Some(limit), Some(metrics)) = (self.config.max_violations, self.metrics.as_ref()) {
            if metrics.total_violations() >= limit {
                self.try_submit(SubmissionReason::ViolationEscalation, now);
            }
        }
    }

    /// Manual submit. Rejected without any state change when the trimmed
    /// answer is shorter than the minimum; that is validation, not a
    /// violation.
    pub fn submit_manual(&mut self, now: Instant) -> bool {
        if !self.accepting_input() {
            return false;
        }
        if trimmed_len(&self.answer) < self.config.min_answer_chars {
            self.warnings.push(format!(
                "Please write a longer answer (min {} characters)",
                self.config.min_answer_chars
            ));
            return false;
        }
        self.try_submit(SubmissionReason::Manual, now)
    }

    /// The single submission path. Returns true for the one winning trigger;
    /// every later trigger is a no-op.
    fn try_submit(&mut self, reason: SubmissionReason, now: Instant) -> bool {
        if self.submitted {
            return false;
        }
        // Guard first: no event handler may run between check and set
        self.submitted = true;
        self.phase = SessionPhase::Submitting;

        let answer_length = self.answer.chars().count();
        let metrics = match self.metrics.as_mut() {
            Some(aggregator) => aggregator.freeze(now, answer_length),
            None => MetricsAggregator::new(now).freeze(now, answer_length),
        };

        // Best-effort biometric evidence; failure yields no snapshot
        let snapshots: Vec<Snapshot> = self.camera.capture().into_iter().collect();

        let payload = SubmissionPayload {
            answer_text: self.answer.clone(),
            metrics: metrics.clone(),
            snapshots,
            reason,
        };

        if let Some(task) = &self.task {
            let explanation = if self.answer.is_empty() {
                AUTO_SUBMIT_PLACEHOLDER.to_string()
            } else {
                self.answer.clone()
            };
            let body = SubmissionBody {
                explanation,
                behavior_metrics: metrics,
                snapshots: payload.snapshots.iter().map(|s| s.data.clone()).collect(),
            };
            match self.backend.submit_answer(&task.attempt_session_id, &body) {
                Ok(()) => info!(%reason, "answer submitted"),
                // Deliberate policy: the candidate's flow is never blocked
                // on the submission transport; the failure is only logged.
                Err(err) => warn!(%err, %reason, "submission transport failed"),
            }
        }

        let (event_type, event_payload) = match reason {
            SubmissionReason::Manual => (
                "SUBMISSION",
                json!({ "charCount": answer_length }),
            ),
            _ => (
                "AUTO_SUBMIT",
                json!({ "charCount": answer_length, "reason": reason.to_string() }),
            ),
        };
        self.report_event(event_type, event_payload);

        self.submission = Some(payload);
        self.phase = SessionPhase::Submitted;
        true
    }

    /// Fire-and-forget telemetry; failures are swallowed so the candidate's
    /// flow is never disturbed by the reporting channel.
    fn report_event(&self, event_type: &str, payload: serde_json::Value) {
        if let Err(err) = self.backend.send_event(&self.test_link, event_type, payload) {
            debug!(%err, event_type, "telemetry event dropped");
        }
    }
}
