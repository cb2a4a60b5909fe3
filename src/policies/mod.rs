//! Retry policies for admissions that hit a conflict or an unavailable store.
//!
//! ## Contents
//! - [`RetryPolicy`]   whether a failed attempt is retried, and how many times
//! - [`BackoffPolicy`] how long to wait between attempts (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization so racing editors do not retry in lockstep
//!
//! ## Quick wiring
//! ```text
//! Config { retry: RetryPolicy, backoff: BackoffPolicy, .. }
//!      └─► core::admission::Admission uses:
//!           - retry.allows(attempt) to decide retry/give up
//!           - backoff.next(attempt - 1) to sleep before the next attempt
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::UpTo { attempts: 3 }`.
//! - `BackoffPolicy::default()` → first=50ms, factor=2.0, max=2s, jitter=Equal.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
