//! The poll, compare, notify loop.
//!
//! Each tick fetches the statuses updated since `current_timestamp`, checks
//! the payload, and announces a change of the most recent submission's
//! status. Any failure in a tick becomes a single error notification; the
//! same error text is never sent twice in a row.

use std::time::Duration;
use tracing::{error, info, warn};

use crate::api::StatusSource;
use crate::error::{HeraldError, Result};
use crate::models::{parse_status, Homework, ReviewStatus};
use crate::notify::{send_message, Messenger};
use crate::shutdown::Shutdown;
use crate::validate::{check_response, current_date};

pub const ERROR_PREFIX: &str = "Сбой в работе программы";

/// Loop state, kept for the process lifetime only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    /// Lower bound (`from_date`) for the next fetch.
    pub current_timestamp: i64,
    /// Status of the most recent submission as last announced.
    pub last_status: ReviewStatus,
    /// Last error notification sent, for de-duplication.
    pub last_error_message: Option<String>,
}

impl PollState {
    pub fn new(current_timestamp: i64) -> Self {
        Self {
            current_timestamp,
            last_status: ReviewStatus::Reviewing,
            last_error_message: None,
        }
    }

    pub fn starting_now() -> Self {
        Self::new(chrono::Utc::now().timestamp())
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tracked submission changed status and a message was attempted.
    Notified { homework: Homework, delivered: bool },
    /// Nothing new, or the tracked status matches the last one.
    Unchanged,
    /// The tick failed. `reported` is false when the same message was
    /// already sent for an earlier failure.
    Failed { message: String, reported: bool },
}

pub struct Poller<'a> {
    source: &'a dyn StatusSource,
    messenger: &'a dyn Messenger,
    chat_id: &'a str,
    interval: Duration,
    state: PollState,
}

impl<'a> Poller<'a> {
    pub fn new(
        source: &'a dyn StatusSource,
        messenger: &'a dyn Messenger,
        chat_id: &'a str,
        interval: Duration,
        state: PollState,
    ) -> Self {
        Self {
            source,
            messenger,
            chat_id,
            interval,
            state,
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Run one fetch, validate, notify pass. Never fails; errors are
    /// reported through the messenger and returned as [`TickOutcome::Failed`].
    pub fn tick(&mut self) -> TickOutcome {
        match self.poll_once() {
            Ok(outcome) => {
                if outcome == TickOutcome::Unchanged {
                    info!(
                        from_date = self.state.current_timestamp,
                        "no status change, next poll in {} s",
                        self.interval.as_secs()
                    );
                }
                outcome
            }
            Err(e) => self.report_error(e),
        }
    }

    /// Tick until `shutdown` is requested, sleeping the interval after every
    /// tick regardless of its outcome.
    pub fn run(&mut self, shutdown: &Shutdown) {
        info!(interval_secs = self.interval.as_secs(), "polling started");
        while !shutdown.is_requested() {
            self.tick();
            if !shutdown.sleep(self.interval) {
                break;
            }
        }
        info!("polling stopped");
    }

    fn poll_once(&mut self) -> Result<TickOutcome> {
        let response = self.source.fetch(self.state.current_timestamp)?;
        let homeworks = check_response(&response)?;
        let next_timestamp = current_date(&response)?;

        let outcome = match homeworks.first() {
            Some(record) => {
                let homework = Homework::from_value(record)?;
                if homework.status != self.state.last_status {
                    let message = parse_status(record)?;
                    let delivered = send_message(self.messenger, self.chat_id, &message);
                    if !delivered {
                        warn!(
                            homework = %homework.name,
                            status = %homework.status,
                            "status change was not delivered"
                        );
                    }
                    self.state.last_status = homework.status;
                    TickOutcome::Notified {
                        homework,
                        delivered,
                    }
                } else {
                    TickOutcome::Unchanged
                }
            }
            None => TickOutcome::Unchanged,
        };

        if let Some(timestamp) = next_timestamp {
            self.state.current_timestamp = timestamp;
        }
        Ok(outcome)
    }

    fn report_error(&mut self, err: HeraldError) -> TickOutcome {
        let message = format!("{ERROR_PREFIX}: {err}");
        error!(kind = err.kind(), "{message}");

        if self.state.last_error_message.as_deref() == Some(message.as_str()) {
            return TickOutcome::Failed {
                message,
                reported: false,
            };
        }

        self.state.last_error_message = Some(message.clone());
        send_message(self.messenger, self.chat_id, &message);
        TickOutcome::Failed {
            message,
            reported: true,
        }
    }
}
