use std::time::Instant;

use serde::Serialize;

use crate::util::round_secs;
use crate::violations::ViolationKind;

/// Behavioral integrity profile attached to a submission. Frozen exactly
/// once; the wire form is camelCase per the submission contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorMetrics {
    pub total_time_seconds: u64,
    pub delay_before_typing_seconds: u64,
    pub typing_duration_seconds: u64,
    pub idle_time_seconds: u64,
    pub answer_length: usize,
    pub tab_switch_count: u32,
    pub window_blur_count: u32,
    pub copy_attempt_count: u32,
    pub focus_loss_count: u32,
}

/// Accumulates timing and violation counters for one session instance.
///
/// Counters are owned exclusively by the session controller; event handlers
/// report through it and never touch the fields directly. `freeze` is the
/// one-time conversion into an immutable [`BehaviorMetrics`]: after it runs,
/// any recording that still leaks through is a no-op and a repeated freeze
/// returns the same snapshot.
#[derive(Debug)]
pub struct MetricsAggregator {
    session_start: Instant,
    first_keystroke_at: Option<Instant>,
    tab_switch_count: u32,
    window_blur_count: u32,
    copy_attempt_count: u32,
    focus_loss_count: u32,
    frozen: Option<BehaviorMetrics>,
}

impl MetricsAggregator {
    pub fn new(session_start: Instant) -> Self {
        Self {
            session_start,
            first_keystroke_at: None,
            tab_switch_count: 0,
            window_blur_count: 0,
            copy_attempt_count: 0,
            focus_loss_count: 0,
            frozen: None,
        }
    }

    pub fn record_keystroke(&mut self, now: Instant) {
        if self.frozen.is_some() {
            return;
        }
        if self.first_keystroke_at.is_none() {
            self.first_keystroke_at = Some(now);
        }
    }

    pub fn record_violation(&mut self, kind: ViolationKind) {
        if self.frozen.is_some() {
            return;
        }
        match kind {
            ViolationKind::TabSwitch => {
                self.tab_switch_count += 1;
            }
            ViolationKind::WindowBlur => {
                // A blur is also counted as a tab switch
                self.tab_switch_count += 1;
                self.window_blur_count += 1;
            }
            ViolationKind::CopyAttempt | ViolationKind::PasteAttempt => {
                self.copy_attempt_count += 1;
            }
            ViolationKind::IdleTimeout => {
                self.focus_loss_count += 1;
            }
        }
    }

    pub fn total_violations(&self) -> u32 {
        self.tab_switch_count + self.copy_attempt_count + self.focus_loss_count
    }

    pub fn has_typed(&self) -> bool {
        self.first_keystroke_at.is_some()
    }

    /// One-shot conversion of the live counters into an immutable snapshot.
    pub fn freeze(&mut self, now: Instant, answer_length: usize) -> BehaviorMetrics {
        if let Some(ref snapshot) = self.frozen {
            return snapshot.clone();
        }

        let total_time_seconds = round_secs(now.duration_since(self.session_start));
        let delay_before_typing_seconds = match self.first_keystroke_at {
            Some(first) => round_secs(first.duration_since(self.session_start)),
            None => total_time_seconds,
        };
        let typing_duration_seconds = match self.first_keystroke_at {
            Some(first) => round_secs(now.duration_since(first)),
            None => 0,
        };

        let snapshot = BehaviorMetrics {
            total_time_seconds,
            delay_before_typing_seconds,
            typing_duration_seconds,
            idle_time_seconds: 0,
            answer_length,
            tab_switch_count: self.tab_switch_count,
            window_blur_count: self.window_blur_count,
            copy_attempt_count: self.copy_attempt_count,
            focus_loss_count: self.focus_loss_count,
        };
        self.frozen = Some(snapshot.clone());
        snapshot
    }
}
