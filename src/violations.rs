use std::time::Instant;

/// Raw proctoring signals as observed by the embedding runtime. The terminal
/// runtime wires focus loss, key combos, and bracketed paste; a different
/// host could also observe the view being hidden outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProctorSignal {
    ViewHidden,
    FocusLost,
    CopyKey,
    PasteKey,
}

/// Classified candidate behavior that may indicate rule-breaking.
/// Display names match the telemetry wire values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    TabSwitch,
    WindowBlur,
    CopyAttempt,
    PasteAttempt,
    IdleTimeout,
}

#[derive(Clone, Copy, Debug)]
pub struct ViolationEvent {
    pub kind: ViolationKind,
    pub at: Instant,
}

pub const IDLE_TIMEOUT_SECS: u64 = 60;
const IDLE_POLL_PERIOD_SECS: u64 = 1;

/// Watches activity and classifies proctoring signals.
///
/// Detection is advisory, never preventive: the monitor reports events to
/// whoever polls it and touches no session state of its own. The idle poll
/// runs at a fixed one-second cadence regardless of the tick rate, is exempt
/// until the first keystroke, and fires once per idle episode until the next
/// keystroke re-arms it.
#[derive(Debug)]
pub struct ViolationMonitor {
    idle_timeout_secs: u64,
    last_input_at: Option<Instant>,
    last_poll_at: Option<Instant>,
    idle_fired: bool,
}

impl ViolationMonitor {
    pub fn new(idle_timeout_secs: u64) -> Self {
        Self {
            idle_timeout_secs,
            last_input_at: None,
            last_poll_at: None,
            idle_fired: false,
        }
    }

    /// Map an observed signal 1:1 to its violation kind.
    pub fn classify(signal: ProctorSignal) -> ViolationKind {
        match signal {
            ProctorSignal::ViewHidden => ViolationKind::TabSwitch,
            ProctorSignal::FocusLost => ViolationKind::WindowBlur,
            ProctorSignal::CopyKey => ViolationKind::CopyAttempt,
            ProctorSignal::PasteKey => ViolationKind::PasteAttempt,
        }
    }

    /// Note candidate input. Starts idle tracking on the first call and
    /// re-arms the idle episode on every call.
    pub fn record_keystroke(&mut self, now: Instant) {
        self.last_input_at = Some(now);
        self.idle_fired = false;
    }

    /// Idle check, called from the tick handler. Internally rate-limited to
    /// the poll period, so the tick rate does not matter.
    pub fn poll_idle(&mut self, now: Instant) -> Option<ViolationEvent> {
        if let Some(last_poll) = self.last_poll_at {
            if now.duration_since(last_poll).as_secs() < IDLE_POLL_PERIOD_SECS {
                return None;
            }
        }
        self.last_poll_at = Some(now);

        // No keystroke yet: reading the task is not idling
        let last_input = self.last_input_at?;

        if self.idle_fired {
            return None;
        }

        if now.duration_since(last_input).as_secs() >= self.idle_timeout_secs {
            self.idle_fired = true;
            return Some(ViolationEvent {
                kind: ViolationKind::IdleTimeout,
                at: now,
            });
        }

        None
    }
}
