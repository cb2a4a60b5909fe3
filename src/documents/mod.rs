//! Featurable documents: identity, stored records and featured-set members.
//!
//! ## Contents
//! - [`DocumentId`], [`DocumentType`] canonical identity and eligible kind
//! - [`IdentityResolver`], [`DraftPrefix`] draft/published identity folding
//! - [`FeaturedDoc`], [`FeaturePatch`], [`Revision`] the store-facing record and its patch
//! - [`Member`] one logical document of the featured set (records merged by identity)
//! - [`Transition`] featured-flag change detected on save
//!
//! ## Identity
//! ```text
//! raw ids in the store:     "drafts.news-1"   "news-1"
//!                                  └────┬────────┘
//!                        IdentityResolver::canonical
//!                                       ▼
//!                              DocumentId("news-1")
//! ```
//! Every query result and every patch target goes through the resolver, so a
//! draft and its published counterpart are never counted twice.

mod document;
mod id;
mod member;
mod transition;

pub use document::{FeaturePatch, FeaturedDoc, Revision};
pub use id::{DocumentId, DocumentType, DraftPrefix, IdentityResolver};
pub use member::Member;
pub use transition::Transition;

pub(crate) use member::RecordRef;
