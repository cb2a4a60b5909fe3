//! Controller events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to what the admission controller does.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Admission` (requests, evictions, admissions, retries,
//!   invariant checks), the store deadline wrapper (timeouts) and
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the controller's subscriber listener, which fans out to a
//!   `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
