use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the session loop. Focus changes and
/// bracketed paste are first-class here: they feed the violation monitor.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Key(KeyEvent),
    Paste(String),
    FocusGained,
    FocusLost,
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, focus, paste, resize)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<SessionEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => Some(SessionEvent::Key(key)),
                Ok(CtEvent::Paste(text)) => Some(SessionEvent::Paste(text)),
                Ok(CtEvent::FocusGained) => Some(SessionEvent::FocusGained),
                Ok(CtEvent::FocusLost) => Some(SessionEvent::FocusLost),
                Ok(CtEvent::Resize(_, _)) => Some(SessionEvent::Resize),
                Ok(_) => None,
                Err(_) => break,
            };

            if let Some(ev) = forwarded {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<SessionEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the session one event/tick at a time. Every signal
/// source funnels through this single consumer, so no two handlers ever run
/// concurrently.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> SessionEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                SessionEvent::Tick
            }
        }
    }
}
