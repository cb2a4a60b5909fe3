//! # spotlight
//!
//! **Spotlight** keeps a bounded "featured" set of CMS documents.
//!
//! At most `capacity` documents (default 4) across the eligible types are
//! featured at once. Featuring one more evicts the oldest member by
//! `featuredAt`; undated legacy members count as oldest, ties break on id. A
//! draft and its published record are one document.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ControllerHandle  ControllerHandle  ControllerHandle   (cloneable)
//!          │                 │                 │
//!          └─────────────────┼─────────────────┘
//!                            ▼
//!                  [submission queue, bounded]
//!                            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Controller                                                       │
//! │  - run loop: routes each request to the slot of its featured set  │
//! │  - slot workers: one FIFO worker per SlotKey (global / per type)  │
//! │  - subscriber_listener: Bus ─► SubscriberSet                      │
//! └──────┬──────────────────────────────┬─────────────────────────────┘
//!        ▼                              ▼
//!   slot "global"                  slot "type:..."
//!        │                              │
//!        └──────────► Admission ◄───────┘
//!                        │  lookup ─► query ─► plan ─► evict ─► admit ─► verify
//!                        │  (each call under store_timeout, revision-checked)
//!                        ▼
//!                  DocumentStore (MemoryStore, or your CMS adapter)
//!
//!   Admission ── publish(Event) ──► Bus ──► SubscriberSet ──► LogWriter / custom
//! ```
//!
//! ### Request lifecycle
//! ```text
//! request_feature(raw_id, type)
//!
//! loop {
//!   ├─► attempt += 1, publish AdmissionRequested
//!   ├─► full attempt, or resume if evictions already committed (re-plan, never re-evict)
//!   │       ├─ Ok  ──► publish DocumentAdmitted, return AdmissionResult
//!   │       └─ Err ──► ConcurrentModification → ConflictDetected
//!   │                  ├─ retryable && RetryPolicy allows
//!   │                  │     ├─ publish RetryScheduled{ delay }
//!   │                  │     └─ sleep(backoff.next(attempt)), continue
//!   │                  └─ otherwise ─► publish AdmissionFailed, return error
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                              |
//! |-------------------|--------------------------------------------------------------|-------------------------------------------------|
//! | **Controller**    | Serialized feature/un-feature requests per featured set.     | [`Controller`], [`ControllerHandle`]            |
//! | **Rule**          | Admission, eviction planning, read-only preview.             | [`Admission`], [`AdmissionPlan`]                |
//! | **Store adapter** | Plug in the CMS; in-memory reference store included.         | [`DocumentStore`], [`MemoryStore`]              |
//! | **Identity**      | Fold draft/published ids into one document.                  | [`IdentityResolver`], [`DraftPrefix`]           |
//! | **Subscriber API**| Observe admissions, evictions and failures.                  | [`Subscribe`], [`Event`]                        |
//! | **Policies**      | Retry and backoff between attempts.                          | [`RetryPolicy`], [`BackoffPolicy`]              |
//! | **Errors**        | Typed errors with the failing step and committed progress.   | [`AdmissionError`], [`StoreError`]              |
//! | **Configuration** | Capacity, eligible types, scope, timeouts.                   | [`Config`], [`ControllerConfig`]                |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], which logs events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use spotlight::{Config, Controller, MemoryStore};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     for id in ["a1", "a2", "a3", "a4", "a5"] {
//!         store.create(id, "newsItem").await;
//!     }
//!
//!     let controller = Controller::builder(Config::default(), store.clone()).build()?;
//!     let handle = controller.handle();
//!
//!     for id in ["a1", "a2", "a3", "a4"] {
//!         handle.request_feature(id, "newsItem").await?;
//!     }
//!     let res = handle.request_feature("a5", "newsItem").await?;
//!     assert_eq!(res.evicted.len(), 1);
//!     assert_eq!(res.evicted[0].as_str(), "a1");
//!     assert_eq!(store.featured().await.len(), 4);
//!
//!     controller.shutdown();
//!     Ok(())
//! }
//! ```
mod controller;
mod core;
mod documents;
mod error;
mod events;
mod policies;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use self::core::{
    Ack, Admission, AdmissionPlan, AdmissionResult, Clock, Config, ManualClock, Progress,
    SetScope, SlotKey, SystemClock,
};
pub use controller::{
    Controller, ControllerBuilder, ControllerConfig, ControllerError, ControllerHandle, Outcome,
    Request, SubmitError, Ticket,
};
pub use documents::{
    DocumentId, DocumentType, DraftPrefix, FeaturePatch, FeaturedDoc, IdentityResolver, Member,
    Revision, Transition,
};
pub use error::{AdmissionError, ConfigError, Step, StoreError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
pub use store::{DocumentStore, FeaturedOrder, FeaturedQuery, MemoryStore};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: built-in `tracing` subscriber.
// Enable with: `--features logging` (default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
