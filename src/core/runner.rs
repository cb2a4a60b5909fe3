//! # Store calls with a deadline.
//!
//! Every store call made by an admission goes through [`with_deadline`]:
//!
//! ```text
//! Within deadline:
//!   store.call() → Ok / Err(store error)        (returned as is)
//!
//! Deadline exceeded:
//!   publish StoreTimeout{step, timeout_ms} → Err(StoreError::Timeout)
//! ```
//!
//! ## Rules
//! - A timed-out call is dropped; whether the store applied it is unknown, so the
//!   attempt stops issuing writes and reports `StoreUnavailable`.
//! - `None` (timeout `0s` in config) runs the call without a deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time;

use crate::error::{StoreError, Step};
use crate::events::{Bus, Event, EventKind};

/// Runs one store call under an optional deadline, publishing `StoreTimeout` on expiry.
pub(crate) async fn with_deadline<T, F>(
    bus: &Bus,
    step: Step,
    timeout: Option<Duration>,
    call: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    let Some(dur) = timeout.filter(|d| *d > Duration::ZERO) else {
        return call.await;
    };

    match time::timeout(dur, call).await {
        Ok(res) => res,
        Err(_elapsed) => {
            bus.publish(
                Event::new(EventKind::StoreTimeout)
                    .with_step(step)
                    .with_timeout(dur),
            );
            Err(StoreError::Timeout { timeout: dur })
        }
    }
}
