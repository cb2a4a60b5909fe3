//! # Controller: serialized access to featured sets.
//!
//! [`Controller`] owns one FIFO worker per featured set ([`SlotKey`](crate::SlotKey)).
//! Callers submit through a cloneable [`ControllerHandle`]; each request waits
//! for its reply on a oneshot channel.
//!
//! ## Invariants
//! - Requests for the same set never run in parallel.
//! - Requests for the same set run strictly in submission order.

pub mod config;
pub mod error;
pub mod request;

mod builder;
mod core;
mod slot;

pub use builder::ControllerBuilder;
pub use config::ControllerConfig;
pub use self::core::{Controller, ControllerHandle, Ticket};
pub use error::{ControllerError, SubmitError};
pub use request::{Outcome, Request};
