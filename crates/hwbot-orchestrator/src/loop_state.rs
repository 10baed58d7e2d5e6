//! Cross-cycle state of the polling loop.
//!
//! The loop remembers the last status message it forwarded and the last
//! error message it logged, so that consecutive repeats of either are
//! suppressed. It also carries the poll cursor and a few counters.

use chrono::{DateTime, Utc};

// ============================================================================
// PollerStatus
// ============================================================================

/// Lifecycle of the polling loop.
///
/// `Starting` -> `Polling` on the first cycle; `Polling` -> `Stopped` when a
/// shutdown is requested. There is no other exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollerStatus {
    /// No cycle has run yet.
    #[default]
    Starting,
    /// Cycles are running.
    Polling,
    /// A shutdown was requested and the loop has exited.
    Stopped,
}

impl std::fmt::Display for PollerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::Polling => write!(f, "polling"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

// ============================================================================
// LoopState
// ============================================================================

/// State owned by the poller and mutated once per cycle.
#[derive(Debug, Clone)]
pub struct LoopState {
    /// Current lifecycle status.
    pub status: PollerStatus,

    /// The last status message forwarded to the chat.
    pub last_status_message: String,

    /// The last error message written to the log.
    pub last_error_message: String,

    /// Lower bound (unix seconds) sent with the next API request.
    pub cursor: i64,

    /// Number of cycles started so far.
    pub cycles: u64,

    /// When the loop was created.
    pub started_at: DateTime<Utc>,
}

impl Default for LoopState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl LoopState {
    /// Creates a new `LoopState` with the given starting cursor.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwbot_orchestrator::{LoopState, PollerStatus};
    ///
    /// let state = LoopState::new(0);
    /// assert_eq!(state.status, PollerStatus::Starting);
    /// assert!(state.last_status_message.is_empty());
    /// assert_eq!(state.cycles, 0);
    /// ```
    #[must_use]
    pub fn new(cursor: i64) -> Self {
        Self {
            status: PollerStatus::Starting,
            last_status_message: String::new(),
            last_error_message: String::new(),
            cursor,
            cycles: 0,
            started_at: Utc::now(),
        }
    }

    /// Marks the start of a new cycle and returns its 1-based number.
    pub fn begin_cycle(&mut self) -> u64 {
        self.status = PollerStatus::Polling;
        self.cycles += 1;
        self.cycles
    }

    /// Remembers `message` as the latest status.
    ///
    /// Returns `true` if it differs from the previous one, i.e. the caller
    /// should notify.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwbot_orchestrator::LoopState;
    ///
    /// let mut state = LoopState::new(0);
    /// assert!(state.record_status("reviewing"));
    /// assert!(!state.record_status("reviewing"));
    /// assert!(state.record_status("approved"));
    /// ```
    pub fn record_status(&mut self, message: &str) -> bool {
        if self.last_status_message == message {
            return false;
        }
        message.clone_into(&mut self.last_status_message);
        true
    }

    /// Remembers `message` as the latest error.
    ///
    /// Returns `true` if it differs from the previous one, i.e. the caller
    /// should log it.
    pub fn record_error(&mut self, message: &str) -> bool {
        if self.last_error_message == message {
            return false;
        }
        message.clone_into(&mut self.last_error_message);
        true
    }

    /// Moves the cursor. A cursor never moves backwards.
    pub fn advance_cursor(&mut self, to: i64) {
        if to > self.cursor {
            self.cursor = to;
        }
    }

    /// Marks the loop as stopped.
    pub fn stop(&mut self) {
        self.status = PollerStatus::Stopped;
    }

    /// Returns the duration since the loop started.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

// ============================================================================
// Tests
// ============================================================================
