//! # Featured-set members.
//!
//! A store query returns raw records; a draft and its published counterpart may
//! both be featured. [`Member::group`] folds records into one member per
//! canonical identity and orders members for eviction.
//!
//! ## Eviction order
//! ```text
//! undated (featuredAt = null)  <  dated, featuredAt ascending  <  ...
//! ties on featuredAt           →  canonical id ascending
//! ```
//! A member's stamp is the oldest stamp among its records, with an undated
//! record counting as older than any dated one.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::document::{FeaturedDoc, Revision};
use super::id::{DocumentId, DocumentType, IdentityResolver};

/// Raw record of a member together with the revision it was read at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecordRef {
    pub raw_id: String,
    pub revision: Revision,
}

/// One logical document of the featured set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    /// Canonical identity.
    pub id: DocumentId,
    /// Document type (taken from the first record seen).
    pub doc_type: DocumentType,
    /// Oldest stamp among the records (`None` = undated legacy member).
    pub featured_at: Option<DateTime<Utc>>,
    pub(crate) records: Vec<RecordRef>,
}

impl Member {
    /// Groups featured records by canonical identity, oldest member first.
    ///
    /// Records with `featured == false` are ignored.
    pub fn group(docs: &[FeaturedDoc], resolver: &dyn IdentityResolver) -> Vec<Member> {
        let mut by_id: BTreeMap<DocumentId, Member> = BTreeMap::new();

        for doc in docs.iter().filter(|d| d.featured) {
            let id = resolver.canonical(&doc.id);
            let record = RecordRef {
                raw_id: doc.id.clone(),
                revision: doc.revision.clone(),
            };
            by_id
                .entry(id.clone())
                .and_modify(|m| {
                    // Option ordering puts None first: undated wins as "oldest".
                    m.featured_at = m.featured_at.min(doc.featured_at);
                    m.records.push(record.clone());
                })
                .or_insert_with(|| Member {
                    id,
                    doc_type: doc.doc_type.clone(),
                    featured_at: doc.featured_at,
                    records: vec![record],
                });
        }

        let mut members: Vec<Member> = by_id.into_values().collect();
        members.sort_by(Member::eviction_order);
        members
    }

    /// Total order used for eviction: undated first, then stamp, then id.
    pub fn eviction_order(a: &Member, b: &Member) -> Ordering {
        a.featured_at
            .cmp(&b.featured_at)
            .then_with(|| a.id.cmp(&b.id))
    }

    /// True if the member has no `featuredAt` stamp.
    #[inline]
    pub fn is_undated(&self) -> bool {
        self.featured_at.is_none()
    }

    /// Raw ids of the records backing this member.
    pub fn raw_ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.raw_id.as_str())
    }
}
