use std::time::Duration;

/// Default pause between two lookups of the same association.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default budget for an association to become ACTIVE.
pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default budget for an association to disappear. Removal may cascade on
/// the remote side, so this is longer than the create budget.
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Default jitter applied to the poll interval, as a fraction of it.
pub const DEFAULT_JITTER_RATIO: f64 = 0.1;

/// Timing configuration for the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilerConfig {
    /// Pause between lookups while waiting for convergence
    pub poll_interval: Duration,
    /// Random spread applied to each pause: a ratio of 0.1 sleeps between
    /// 0.9x and 1.1x the interval. Zero disables jitter.
    pub jitter_ratio: f64,
    /// Overall budget of the create wait
    pub create_timeout: Duration,
    /// Overall budget of the delete wait
    pub delete_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            jitter_ratio: DEFAULT_JITTER_RATIO,
            create_timeout: DEFAULT_CREATE_TIMEOUT,
            delete_timeout: DEFAULT_DELETE_TIMEOUT,
        }
    }
}

impl ReconcilerConfig {
    /// Fixed interval without jitter, used where timing must be exact.
    pub fn fixed(poll_interval: Duration, create_timeout: Duration, delete_timeout: Duration) -> Self {
        Self {
            poll_interval,
            jitter_ratio: 0.0,
            create_timeout,
            delete_timeout,
        }
    }

    pub fn with_jitter_ratio(mut self, jitter_ratio: f64) -> Self {
        self.jitter_ratio = jitter_ratio;
        self
    }
}
