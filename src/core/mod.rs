//! Featured-set core: the rule and what it needs to run.
//!
//! Internal modules:
//! - [`admission`]: feature/un-feature requests with retries and progress tracking;
//! - [`plan`]: pure eviction planning for one admission;
//! - [`config`]: capacity, eligible types, scope, timeouts and retry settings;
//! - [`scope`]: featured-set partitioning and slot keys;
//! - [`clock`]: time source and monotonic stamps;
//! - [`runner`]: store calls under a deadline.

mod admission;
mod clock;
mod config;
mod plan;
mod runner;
mod scope;

pub use admission::{Ack, Admission, AdmissionResult, Progress};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use plan::AdmissionPlan;
pub use scope::{SetScope, SlotKey};

pub(crate) use config::duration_ms;
