//! Configuration for client sessions.

use std::time::{Duration, SystemTime};
use tandem_protocol::DocumentId;

/// Configuration for one open document.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Document to open.
    pub document_id: DocumentId,
    /// User editing the document.
    pub author: String,
    /// Maximum entries per history request.
    pub history_batch_size: u32,
    /// Conflicts tolerated in one flush before the user is asked.
    pub max_resubmits: u32,
    /// Number of applied deltas kept for rebasing stale remote deltas.
    pub applied_window: usize,
    /// Retry configuration for reads.
    pub retry: RetryConfig,
}

impl SessionConfig {
    /// Creates a new session configuration.
    pub fn new(document_id: impl Into<DocumentId>, author: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            author: author.into(),
            history_batch_size: 100,
            max_resubmits: 3,
            applied_window: 1024,
            retry: RetryConfig::default(),
        }
    }

    /// Sets the history batch size.
    pub fn with_history_batch_size(mut self, size: u32) -> Self {
        self.history_batch_size = size.max(1);
        self
    }

    /// Sets how many conflicts one flush absorbs before asking the user.
    pub fn with_max_resubmits(mut self, max: u32) -> Self {
        self.max_resubmits = max;
        self
    }

    /// Sets the applied-delta window.
    pub fn with_applied_window(mut self, window: usize) -> Self {
        self.applied_window = window;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay before a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay = base.min(self.max_delay.as_secs_f64());

        if self.add_jitter {
            // Up to 25% extra.
            Duration::from_secs_f64(delay + delay * 0.25 * jitter_fraction())
        } else {
            Duration::from_secs_f64(delay)
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

/// A value in `[0, 1)` derived from the clock.
fn jitter_fraction() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    f64::from(nanos % 1000) / 1000.0
}
