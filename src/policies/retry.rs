//! # Retry policy for admission attempts.
//!
//! [`RetryPolicy`] decides whether a retryable failure
//! ([`ConcurrentModification`](crate::AdmissionError::ConcurrentModification) or
//! [`StoreUnavailable`](crate::AdmissionError::StoreUnavailable)) is retried inside
//! the same request.
//!
//! ```text
//! RetryPolicy::Never              → first failure is returned to the caller
//! RetryPolicy::UpTo { attempts }  → at most `attempts` attempts in total
//! ```
//!
//! A conflict retry starts again from the read step; an unavailable-store retry
//! after a committed eviction only repeats the admit step.

use serde::Deserialize;

/// Policy controlling retries of a failed admission attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Never retry: surface the first failure.
    Never,
    /// Retry until `attempts` attempts (including the first) have run.
    UpTo { attempts: u32 },
}

impl Default for RetryPolicy {
    /// Returns `UpTo { attempts: 3 }`.
    fn default() -> Self {
        RetryPolicy::UpTo { attempts: 3 }
    }
}

impl RetryPolicy {
    /// True if another attempt may run after `attempt` attempts have failed.
    #[inline]
    pub fn allows(&self, attempt: u32) -> bool {
        match self {
            RetryPolicy::Never => false,
            RetryPolicy::UpTo { attempts } => attempt < *attempts,
        }
    }
}
