//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for handling controller events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Admission ── publish(Event) ──► Bus ──► Controller listener ──► SubscriberSet
//!                                                                     │
//!                                                    ┌────────────────┼──────────┐
//!                                                    ▼                ▼          ▼
//!                                                LogWriter         Custom       ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
