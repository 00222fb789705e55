use std::collections::VecDeque;

/// Warnings kept for on-screen display. Only the most recent few are
/// retained; older ones scroll away exactly like the source system's banner.
pub const WARNING_LOG_CAPACITY: usize = 4;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Countdown deadline for the whole attempt.
    pub deadline_secs: u64,
    /// Inactivity threshold before an IDLE_TIMEOUT fires.
    pub idle_timeout_secs: u64,
    /// Minimum trimmed answer length accepted by manual submit.
    pub min_answer_chars: usize,
    /// Optional escalation limit: when the total violation count reaches
    /// this, the session auto-submits. Off by default.
    pub max_violations: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            deadline_secs: 1800,
            idle_timeout_secs: 60,
            min_answer_chars: 50,
            max_violations: None,
        }
    }
}

/// Bounded log of candidate-facing warning messages.
#[derive(Debug, Default)]
pub struct WarningLog {
    entries: VecDeque<String>,
}

impl WarningLog {
    pub fn push(&mut self, message: String) {
        if self.entries.len() == WARNING_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
