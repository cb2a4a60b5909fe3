//! # Events emitted by the admission controller.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Featured-set events**: requests, evictions, admissions, un-features
//! - **Failure events**: conflicts, retries, timeouts, failures, invariant breaches
//! - **Subscriber events**: overflow and panics in subscriber workers
//!
//! The [`Event`] struct carries metadata such as timestamps, the document, the
//! featured set (slot), the failing step and retry delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use spotlight::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_document("news-7")
//!     .with_reason("revision conflict")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(80));
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.document.as_deref(), Some("news-7"));
//! assert_eq!(ev.delay_ms, Some(80));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::error::Step;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of controller events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Featured-set events ===
    /// A feature request started an attempt.
    ///
    /// Sets: `document`, `doc_type`, `slot`, `attempt`
    AdmissionRequested,

    /// A member was un-featured to make room.
    ///
    /// Sets: `document` (evicted id), `reason` (admitted id), `slot`
    MemberEvicted,

    /// A document joined the featured set.
    ///
    /// Sets: `document`, `doc_type`, `slot`, `count` (evictions)
    DocumentAdmitted,

    /// A document was un-featured on request.
    ///
    /// Sets: `document`, `count` (records patched, 0 = already unfeatured)
    DocumentUnfeatured,

    // === Failure events ===
    /// A revision check failed.
    ///
    /// Sets: `document`, `step`, `reason`
    ConflictDetected,

    /// Another attempt will run after a delay.
    ///
    /// Sets: `document`, `attempt` (failed attempt), `delay_ms`, `reason`
    RetryScheduled,

    /// A store call exceeded its deadline.
    ///
    /// Sets: `step`, `timeout_ms`
    StoreTimeout,

    /// An operation gave up.
    ///
    /// Sets: `document`, `step` (if store-level), `reason`, `attempt`
    AdmissionFailed,

    /// The set exceeded capacity after admission.
    ///
    /// Sets: `slot`, `count` (observed members), `reason`
    InvariantViolated,

    /// The post-admission re-read failed; capacity went unchecked.
    ///
    /// Sets: `document`, `slot`, `step`, `reason`
    VerifySkipped,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `document` (subscriber name), `reason` (panic message)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `document` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Controller event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Canonical document id (or subscriber name for subscriber events).
    pub document: Option<Arc<str>>,
    /// Document type.
    pub doc_type: Option<Arc<str>>,
    /// Featured set the event belongs to.
    pub slot: Option<Arc<str>>,
    /// Operation step, for store-level events.
    pub step: Option<Step>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Generic counter (evictions, observed members, patched records).
    pub count: Option<u32>,
    /// Retry delay in milliseconds.
    pub delay_ms: Option<u32>,
    /// Store timeout in milliseconds.
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            document: None,
            doc_type: None,
            slot: None,
            step: None,
            reason: None,
            attempt: None,
            count: None,
            delay_ms: None,
            timeout_ms: None,
        }
    }

    #[inline]
    pub fn with_document(mut self, id: impl AsRef<str>) -> Self {
        self.document = Some(Arc::from(id.as_ref()));
        self
    }

    #[inline]
    pub fn with_doc_type(mut self, doc_type: impl AsRef<str>) -> Self {
        self.doc_type = Some(Arc::from(doc_type.as_ref()));
        self
    }

    #[inline]
    pub fn with_slot(mut self, slot: impl ToString) -> Self {
        self.slot = Some(Arc::from(slot.to_string()));
        self
    }

    #[inline]
    pub fn with_step(mut self, step: Step) -> Self {
        self.step = Some(step);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n.min(u32::MAX as usize) as u32);
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    /// Attaches a store timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_document(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_document(subscriber)
            .with_reason(info)
    }

    /// True for events that report a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ConflictDetected
                | EventKind::StoreTimeout
                | EventKind::AdmissionFailed
                | EventKind::InvariantViolated
                | EventKind::VerifySkipped
        )
    }
}
