//! # Logging subscriber.
//!
//! [`LogWriter`] turns controller events into `tracing` records, so they reach
//! whatever subscriber the application installed (`tracing_subscriber::fmt`, JSON, ...).
//!
//! ## Levels
//! ```text
//! info   DocumentAdmitted, MemberEvicted, DocumentUnfeatured
//! debug  AdmissionRequested, RetryScheduled
//! warn   ConflictDetected, StoreTimeout, AdmissionFailed, VerifySkipped, Subscriber*
//! error  InvariantViolated
//! ```
//!
//! ## Example
//! ```no_run
//! # async fn demo(store: std::sync::Arc<spotlight::MemoryStore>) {
//! use std::sync::Arc;
//! use spotlight::{Config, Controller, LogWriter, Subscribe};
//!
//! let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
//! let controller = Controller::builder(Config::default(), store)
//!     .with_subscribers(subs)
//!     .build()
//!     .unwrap();
//! # }
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Subscriber that logs every event through `tracing`.
///
/// Enabled via the `logging` feature (on by default).
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let doc = e.document.as_deref().unwrap_or("-");
        let slot = e.slot.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::AdmissionRequested => {
                tracing::debug!(seq = e.seq, document = doc, slot, attempt = e.attempt, "admission requested");
            }
            EventKind::MemberEvicted => {
                tracing::info!(seq = e.seq, document = doc, slot, reason, "member evicted");
            }
            EventKind::DocumentAdmitted => {
                tracing::info!(seq = e.seq, document = doc, slot, evicted = e.count, "document admitted");
            }
            EventKind::DocumentUnfeatured => {
                tracing::info!(seq = e.seq, document = doc, records = e.count, "document unfeatured");
            }
            EventKind::ConflictDetected => {
                tracing::warn!(seq = e.seq, document = doc, step = ?e.step, reason, "revision conflict");
            }
            EventKind::RetryScheduled => {
                tracing::debug!(
                    seq = e.seq,
                    document = doc,
                    after_attempt = e.attempt,
                    delay_ms = e.delay_ms,
                    reason,
                    "retry scheduled"
                );
            }
            EventKind::StoreTimeout => {
                tracing::warn!(seq = e.seq, step = ?e.step, timeout_ms = e.timeout_ms, "store call timed out");
            }
            EventKind::AdmissionFailed => {
                tracing::warn!(
                    seq = e.seq,
                    document = doc,
                    step = ?e.step,
                    attempt = e.attempt,
                    reason,
                    "request failed"
                );
            }
            EventKind::VerifySkipped => {
                tracing::warn!(seq = e.seq, document = doc, slot, reason, "featured set re-read failed; capacity not checked");
            }
            EventKind::InvariantViolated => {
                tracing::error!(seq = e.seq, document = doc, slot, observed = e.count, reason, "featured set over capacity");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                tracing::warn!(seq = e.seq, subscriber = doc, reason, kind = ?e.kind, "subscriber failed to handle an event");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
