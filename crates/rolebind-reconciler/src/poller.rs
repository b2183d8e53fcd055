//! Convergence polling.
//!
//! The poller repeatedly looks an association up until a predicate on the
//! observed record holds. It returns as soon as the predicate is satisfied,
//! gives up with [`ReconcileError::ConvergenceTimeout`] once the next poll
//! would land outside the budget, and stops with
//! [`ReconcileError::Cancelled`] as soon as the caller's token fires, even in
//! the middle of a lookup.

use std::time::Duration;

use rolebind_core::{AssociationKey, AssociationRecord};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ObservedState, ReconcileError, Result};
use crate::reader::{AssociationLookup, Observation};

/// What to do when the parent resource turns out to be gone mid-wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentGonePolicy {
    /// A missing parent means the association is gone too.
    Converged,
    /// A missing parent means the target can never be reached.
    Fail,
}

/// Deadline used when `start + timeout` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

type Predicate = dyn Fn(Option<&AssociationRecord>) -> bool + Send + Sync;

/// Target condition for a wait.
pub struct WaitCondition {
    description: &'static str,
    predicate: Box<Predicate>,
    on_parent_gone: ParentGonePolicy,
}

impl WaitCondition {
    pub fn new(
        description: &'static str,
        on_parent_gone: ParentGonePolicy,
        predicate: impl Fn(Option<&AssociationRecord>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description,
            predicate: Box::new(predicate),
            on_parent_gone,
        }
    }

    /// The association exists and is ACTIVE.
    pub fn associated() -> Self {
        Self::new("associated", ParentGonePolicy::Fail, associated)
    }

    /// The association no longer exists.
    pub fn disassociated() -> Self {
        Self::new("disassociated", ParentGonePolicy::Converged, disassociated)
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn is_met(&self, record: Option<&AssociationRecord>) -> bool {
        (self.predicate)(record)
    }
}

impl std::fmt::Debug for WaitCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitCondition")
            .field("description", &self.description)
            .field("on_parent_gone", &self.on_parent_gone)
            .finish_non_exhaustive()
    }
}

/// Predicate: the association exists and is ACTIVE.
pub fn associated(record: Option<&AssociationRecord>) -> bool {
    record.is_some_and(AssociationRecord::is_active)
}

/// Predicate: the association does not exist.
pub fn disassociated(record: Option<&AssociationRecord>) -> bool {
    record.is_none()
}

/// Polls a lookup at a fixed, optionally jittered, interval.
#[derive(Debug, Clone)]
pub struct ConvergencePoller {
    poll_interval: Duration,
    jitter_ratio: f64,
}

impl ConvergencePoller {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            jitter_ratio: 0.0,
        }
    }

    /// Spread each pause uniformly over `interval * (1 ± ratio)`.
    ///
    /// The ratio is clamped to `[0, 1]`; a NaN or infinite ratio disables
    /// jitter.
    pub fn with_jitter(mut self, jitter_ratio: f64) -> Self {
        self.jitter_ratio = if jitter_ratio.is_finite() {
            jitter_ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn next_delay(&self) -> Duration {
        if self.jitter_ratio == 0.0 {
            return self.poll_interval;
        }
        let factor = 1.0 + self.jitter_ratio * (2.0 * fastrand::f64() - 1.0);
        Duration::try_from_secs_f64(self.poll_interval.as_secs_f64() * factor)
            .unwrap_or(self.poll_interval)
    }

    /// Waits until `condition` holds for `key`.
    ///
    /// Returns the record that satisfied the condition (`None` when the
    /// condition was met by absence). Retryable lookup failures are logged
    /// and polled through; any other lookup failure ends the wait. The
    /// budget also bounds a lookup that is still in flight.
    pub async fn wait_for(
        &self,
        reader: &dyn AssociationLookup,
        key: &AssociationKey,
        condition: &WaitCondition,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Option<AssociationRecord>> {
        let started = Instant::now();
        let deadline = started
            .checked_add(timeout)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let mut last_observed = ObservedState::Unobserved;
        let mut polls = 0u32;

        let timed_out = |last_observed: ObservedState| ReconcileError::ConvergenceTimeout {
            key: key.clone(),
            target: condition.description,
            waited: started.elapsed(),
            last_observed,
        };

        loop {
            polls += 1;

            let observed = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(ReconcileError::Cancelled { key: key.clone() });
                }
                result = reader.observe(key) => result,
                _ = tokio::time::sleep_until(deadline) => {
                    warn!(key = %key, polls, "Lookup still running at deadline");
                    return Err(timed_out(last_observed));
                }
            };

            match observed {
                Ok(Observation::ParentMissing) => {
                    return match condition.on_parent_gone {
                        ParentGonePolicy::Converged => {
                            debug!(key = %key, polls, "Parent gone, treating as converged");
                            Ok(None)
                        }
                        ParentGonePolicy::Fail => {
                            Err(ReconcileError::ParentNotFound { key: key.clone() })
                        }
                    };
                }
                Ok(observation) => {
                    last_observed = observation.state();
                    let record = observation.into_record();
                    if condition.is_met(record.as_ref()) {
                        debug!(
                            key = %key,
                            target = condition.description,
                            polls,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Association converged"
                        );
                        return Ok(record);
                    }
                    debug!(
                        key = %key,
                        target = condition.description,
                        state = %last_observed,
                        polls,
                        "Association not yet converged"
                    );
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        key = %key,
                        error = %e,
                        polls,
                        "Lookup failed transiently, polling again"
                    );
                }
                Err(e) => return Err(ReconcileError::from_api(key, e)),
            }

            let delay = self.next_delay();
            let next_poll = Instant::now().checked_add(delay);
            if next_poll.is_none_or(|at| at > deadline) {
                return Err(timed_out(last_observed));
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(ReconcileError::Cancelled { key: key.clone() });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
