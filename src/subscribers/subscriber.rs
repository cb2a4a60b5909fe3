//! # Subscribe: hook for controller events.
//!
//! Implement [`Subscribe`] to react to admissions, evictions and failures, e.g.
//! to audit who pushed a story off the homepage or to page someone when the
//! featured set is found over capacity.
//!
//! The [`SubscriberSet`](super::SubscriberSet) gives every subscriber its own
//! bounded queue and worker, so a slow or panicking subscriber never delays a
//! request. Overflow drops the event for that subscriber and publishes
//! `SubscriberOverflow`; a panic is caught and published as `SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use spotlight::{Event, EventKind, Subscribe};
//!
//! struct EvictionAudit;
//!
//! #[async_trait]
//! impl Subscribe for EvictionAudit {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::MemberEvicted) {
//!             // record who pushed whom out of the featured set
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "eviction-audit" }
//!     fn queue_capacity(&self) -> usize { 256 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for controller observability.
///
/// Events arrive one at a time, in publish order. Prefer async I/O and keep
/// errors inside the implementation.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event on this subscriber's worker task.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose; override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber (clamped to at least 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
