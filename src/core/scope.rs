//! # Featured-set scope
//!
//! Decides which documents compete for the same featured slots.
//!
//! ## Variants
//! - `Global`: one set shared by every eligible type (a video can evict an article).
//! - `PerType`: one set per document type, each with the full capacity.
//!
//! ## Invariants
//! - Operations on the same set never run in parallel inside one controller.
//! - Operations on different sets (per-type scope) may run in parallel.

use std::fmt;

use serde::Deserialize;

use crate::documents::DocumentType;

/// Partitioning of featured documents into capacity-bounded sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetScope {
    /// One featured set across all eligible types.
    ///
    /// Use when:
    /// - A single "featured" strip mixes articles and videos
    #[default]
    Global,

    /// One featured set per document type.
    ///
    /// Use when:
    /// - Each type has its own featured strip
    PerType,
}

/// Serialization key of one featured set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlotKey {
    /// The shared set (and un-features whose type is unknown).
    Global,
    /// The set of one document type.
    Type(DocumentType),
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKey::Global => f.write_str("global"),
            SlotKey::Type(t) => write!(f, "type:{t}"),
        }
    }
}
