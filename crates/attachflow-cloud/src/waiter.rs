//! State-polling reconciler
//!
//! Polls a [`StatusProbe`] until the observed state lands in a target set, the deadline
//! passes, or something unexpected happens. Which states count as "still working" and
//! which count as "done" is data ([`WaitSpec`]), so create, delete and availability waits
//! share one loop.
//!
//! ```text
//!            ┌──────────── pending ────────────┐
//!            ▼                                 │
//!   ──▶  Polling ── probe ──▶ classify ────────┘
//!            │                   │
//!            │ deadline          ├── target / absent (deletion) ──▶ Resolved
//!            ▼                   ├── other state ─────────────────▶ Failed
//!         TimedOut               └── probe error ─────────────────▶ Failed
//! ```

use crate::error::{CloudError, Result};
use crate::operation::Operation;
use crate::probe::{Observation, StatusProbe};
use crate::provider::PollConfig;
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;

/// Absent observations tolerated by non-deletion waits before giving up
pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

/// What to wait for
#[derive(Debug, Clone)]
pub struct WaitSpec<S> {
    /// States that mean "keep polling"
    pub pending: HashSet<S>,

    /// States that mean "done". Empty means the resource has to disappear.
    pub target: HashSet<S>,

    pub timeout: Duration,

    /// Deletion waits: consecutive absent observations needed to resolve.
    /// Other waits: consecutive absent observations tolerated before failing.
    pub not_found_tolerance: u32,

    pub poll: PollConfig,
}

impl<S: Eq + Hash> WaitSpec<S> {
    pub fn new(
        pending: impl IntoIterator<Item = S>,
        target: impl IntoIterator<Item = S>,
        timeout: Duration,
    ) -> Self {
        Self {
            pending: pending.into_iter().collect(),
            target: target.into_iter().collect(),
            timeout,
            not_found_tolerance: DEFAULT_NOT_FOUND_CHECKS,
            poll: PollConfig::default(),
        }
    }

    /// Wait for the resource to disappear, accepting the first absent observation
    pub fn deletion(pending: impl IntoIterator<Item = S>, timeout: Duration) -> Self {
        Self {
            not_found_tolerance: 1,
            ..Self::new(pending, std::iter::empty(), timeout)
        }
    }

    pub fn with_not_found_tolerance(mut self, checks: u32) -> Self {
        self.not_found_tolerance = checks;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn is_deletion(&self) -> bool {
        self.target.is_empty()
    }
}

impl<S: Display> WaitSpec<S> {
    /// Sorted labels of every state the wait accepts
    pub fn expected_labels(&self) -> String {
        let mut labels: Vec<String> = self
            .pending
            .iter()
            .chain(self.target.iter())
            .map(|s| s.to_string())
            .collect();
        if self.target.is_empty() {
            labels.push("absent".to_string());
        }
        labels.sort();
        labels.join(", ")
    }
}

/// How a wait ended
#[derive(Debug)]
pub enum WaitOutcome<R, S> {
    /// Reached a target state. `None` when resolved through absence.
    Resolved(Option<R>),
    /// The deadline passed; `last` is the final observation acted upon, if any
    TimedOut { last: Option<Observation<R, S>> },
    Failed(WaitFailure<S>),
}

#[derive(Debug)]
pub enum WaitFailure<S> {
    /// The probe itself failed
    Probe(CloudError),
    /// A state in neither the pending nor the target set
    UnexpectedState(S),
    /// Too many absent observations outside a deletion wait
    NotFound { checks: u32 },
    Cancelled,
}

impl<R, S: Display> WaitOutcome<R, S> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, WaitOutcome::Resolved(_))
    }

    /// Convert into the crate error taxonomy, naming the operation and attachment
    pub fn into_result(
        self,
        operation: Operation,
        id: &str,
        spec: &WaitSpec<S>,
    ) -> Result<Option<R>> {
        let id = id.to_string();
        match self {
            WaitOutcome::Resolved(record) => Ok(record),
            WaitOutcome::TimedOut { last } => Err(CloudError::Timeout {
                operation,
                id,
                timeout: spec.timeout,
                last_state: last
                    .map(|o| o.label())
                    .unwrap_or_else(|| "none observed".to_string()),
            }),
            WaitOutcome::Failed(WaitFailure::Probe(err)) => Err(err),
            WaitOutcome::Failed(WaitFailure::UnexpectedState(state)) => {
                Err(CloudError::UnexpectedState {
                    operation,
                    id,
                    state: state.to_string(),
                    expected: spec.expected_labels(),
                })
            }
            WaitOutcome::Failed(WaitFailure::NotFound { .. }) => {
                Err(CloudError::NotFound { operation, id })
            }
            WaitOutcome::Failed(WaitFailure::Cancelled) => {
                Err(CloudError::Cancelled { operation, id })
            }
        }
    }
}

/// Poll `probe` until `spec` is satisfied, the deadline passes or `cancel` fires
///
/// The first probe runs immediately. Cancellation and the deadline are checked before
/// every probe and raced against both the probe and the sleep between probes, so no
/// observation is acted upon once the deadline has passed.
pub async fn wait_for_state<P>(
    probe: &P,
    spec: &WaitSpec<P::State>,
    cancel: &CancellationToken,
) -> WaitOutcome<P::Record, P::State>
where
    P: StatusProbe + ?Sized,
{
    let deadline = Instant::now() + spec.timeout;
    let mut last: Option<Observation<P::Record, P::State>> = None;
    let mut not_found: u32 = 0;
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Wait cancelled");
                return WaitOutcome::Failed(WaitFailure::Cancelled);
            }
            _ = sleep_until(deadline) => {
                return timed_out(spec, last);
            }
            result = probe.probe() => result,
        };

        let observation = match result {
            Ok(observation) => observation,
            Err(err) => {
                tracing::warn!("Probe failed: {}", err);
                return WaitOutcome::Failed(WaitFailure::Probe(err));
            }
        };

        tracing::debug!(attempt, state = %observation.label(), "Probed");

        match observation {
            Observation::Present { record, state } => {
                not_found = 0;

                if spec.target.contains(&state) {
                    tracing::info!("Reached target state {}", state);
                    return WaitOutcome::Resolved(Some(record));
                }

                if !spec.pending.contains(&state) {
                    tracing::warn!(
                        "Unexpected state {} (expected one of: {})",
                        state,
                        spec.expected_labels()
                    );
                    return WaitOutcome::Failed(WaitFailure::UnexpectedState(state));
                }

                last = Some(Observation::Present { record, state });
            }
            Observation::Absent => {
                not_found += 1;

                if spec.is_deletion() {
                    if not_found >= spec.not_found_tolerance.max(1) {
                        tracing::info!("Resource is gone");
                        return WaitOutcome::Resolved(None);
                    }
                } else if not_found > spec.not_found_tolerance {
                    tracing::warn!("Resource not found after {} checks", not_found);
                    return WaitOutcome::Failed(WaitFailure::NotFound { checks: not_found });
                } else {
                    tracing::warn!(
                        "Resource not found ({}/{}), retrying",
                        not_found,
                        spec.not_found_tolerance
                    );
                }

                last = Some(Observation::Absent);
            }
        }

        let delay = spec.poll.delay_for_attempt(attempt);
        attempt = attempt.saturating_add(1);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Wait cancelled");
                return WaitOutcome::Failed(WaitFailure::Cancelled);
            }
            _ = sleep_until(deadline) => {
                return timed_out(spec, last);
            }
            _ = sleep(delay) => {}
        }
    }
}

fn timed_out<R, S: Display>(
    spec: &WaitSpec<S>,
    last: Option<Observation<R, S>>,
) -> WaitOutcome<R, S> {
    tracing::warn!(
        "Timed out after {:?} (last state: {})",
        spec.timeout,
        last.as_ref()
            .map(|o| o.label())
            .unwrap_or_else(|| "none observed".to_string())
    );
    WaitOutcome::TimedOut { last }
}
