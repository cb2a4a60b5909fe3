//! Document store boundary.
//!
//! The controller never owns documents. It reads and patches them through a
//! [`DocumentStore`] adapter supplied by the caller (the CMS client).
//!
//! ## Contents
//! - [`DocumentStore`] fetch / query / patch capability consumed by the controller
//! - [`FeaturedQuery`], [`FeaturedOrder`] the single query the controller issues
//! - [`MemoryStore`] in-memory adapter with revisions (reference and test double)
//!
//! ## Adapter contract
//! - `patch` with `expected = Some(rev)` must fail with
//!   [`StoreError::Conflict`](crate::StoreError::Conflict) when the stored
//!   revision differs, and must return the new revision on success.
//! - `query` must honor `types`, `featured == true` and `exclude`; ordering is
//!   re-checked by the controller.
//! - Transient failures map to `Unavailable`; the controller adds timeouts itself.

mod memory;
mod store;

pub use memory::MemoryStore;
pub use store::{DocumentStore, FeaturedOrder, FeaturedQuery};

#[cfg(test)]
pub(crate) mod testing;
