//! The polling loop.
//!
//! Every cycle runs fetch -> validate -> translate -> notify to completion,
//! then waits for the poll interval. No failure inside a cycle escapes it:
//! fetch, validation and translation errors become one de-duplicated error
//! log line, and delivery errors are swallowed by [`notify`].
//!
//! The wait between cycles races a [`CancellationToken`], so a shutdown
//! request is honoured at the next cycle boundary without waiting out the
//! full interval.

use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::client::HomeworkApi;
use crate::config::{Config, CursorMode};
use crate::error::{HwbotError, Result};
use crate::homework::{self, Locale};
use crate::loop_state::LoopState;
use crate::notifier::{notify, Messenger};

/// Prefix of every error line logged by the loop.
const FAILURE_PREFIX: &str = "Program failure";

/// Result of a single polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new status message was produced and handed to the messenger.
    Notified {
        /// Whether the messenger reported a successful delivery.
        delivered: bool,
    },
    /// The status message equals the last one forwarded.
    Unchanged,
    /// There was nothing to translate: a blank latest record, or an empty
    /// list in advancing mode.
    NoUpdates,
    /// A fetch, validation or translation step failed.
    Failed {
        /// Whether the failure produced a log line (repeats are suppressed).
        logged: bool,
    },
}

/// What a successful fetch-and-translate pass produced.
enum Update {
    Message(String),
    Nothing,
}

/// Drives the fetch/validate/translate/notify cycle.
pub struct Poller<A, M> {
    api: A,
    messenger: M,
    chat_id: String,
    locale: Locale,
    cursor_mode: CursorMode,
    interval: Duration,
    state: LoopState,
}

impl<A, M> Poller<A, M>
where
    A: HomeworkApi,
    M: Messenger,
{
    /// Creates a poller from configuration and its two transports.
    pub fn new(config: &Config, api: A, messenger: M) -> Self {
        Self {
            api,
            messenger,
            chat_id: config.credentials.chat_destination_id().to_string(),
            locale: config.locale,
            cursor_mode: config.cursor_mode,
            interval: config.poll_interval(),
            state: LoopState::new(config.starting_cursor()),
        }
    }

    /// Overrides the interval between cycles.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Current loop state.
    #[must_use]
    pub const fn state(&self) -> &LoopState {
        &self.state
    }

    /// Runs cycles until `shutdown` is cancelled.
    ///
    /// Cancellation is observed only between cycles; a cycle in flight always
    /// completes.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            cursor = self.state.cursor,
            mode = ?self.cursor_mode,
            "Polling loop started"
        );

        while !shutdown.is_cancelled() {
            let outcome = self.run_cycle().await;
            tracing::debug!(cycle = self.state.cycles, ?outcome, "Cycle finished");

            tokio::select! {
                () = shutdown.cancelled() => {}
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        self.state.stop();
        tracing::info!(
            cycles = self.state.cycles,
            elapsed_secs = self.state.elapsed().num_seconds(),
            "Polling loop stopped"
        );
    }

    /// Runs exactly one cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let cycle = self.state.begin_cycle();
        let started_at = chrono::Utc::now().timestamp();

        let (update, server_time) = match self.check_for_update().await {
            Ok(result) => result,
            Err(error) => return self.record_failure(cycle, &error),
        };

        let outcome = match update {
            Update::Message(message) => {
                if self.state.record_status(&message) {
                    tracing::info!(cycle, "Homework status changed");
                    let delivered = notify(&self.messenger, &self.chat_id, &message).await;
                    CycleOutcome::Notified { delivered }
                } else {
                    tracing::debug!(cycle, "Homework status has not changed");
                    CycleOutcome::Unchanged
                }
            }
            Update::Nothing => {
                tracing::debug!(cycle, cursor = self.state.cursor, "No homework updates");
                CycleOutcome::NoUpdates
            }
        };

        if self.cursor_mode == CursorMode::Advance {
            self.state.advance_cursor(server_time.unwrap_or(started_at));
        }

        outcome
    }

    /// Fetches, validates and translates the latest record.
    ///
    /// Also returns the server timestamp of the response, if it carried one.
    async fn check_for_update(&self) -> Result<(Update, Option<i64>)> {
        let raw: Value = self.api.fetch_homeworks(self.state.cursor).await?;
        let server_time = homework::current_date(&raw);

        let update = match homework::extract_latest(&raw) {
            Ok(record) if homework::is_blank_record(record) => Update::Nothing,
            Ok(record) => Update::Message(homework::parse_status(record, self.locale)?),
            // Only an advancing cursor makes an empty list a normal answer.
            Err(HwbotError::EmptyHomeworks) if self.cursor_mode == CursorMode::Advance => {
                Update::Nothing
            }
            Err(error) => return Err(error),
        };

        Ok((update, server_time))
    }

    fn record_failure(&mut self, cycle: u64, error: &HwbotError) -> CycleOutcome {
        let message = format!("{FAILURE_PREFIX}: {}", error.with_causes());
        let logged = self.state.record_error(&message);
        if logged {
            match error {
                HwbotError::UnexpectedStatus { status } => {
                    tracing::error!(cycle, http_status = status, "{message}");
                }
                _ => tracing::error!(cycle, "{message}"),
            }
        }
        CycleOutcome::Failed { logged }
    }
}

// ============================================================================
// Tests
// ============================================================================
