//! # Canonical document identity.
//!
//! A CMS keeps an edit-in-progress record (`drafts.<id>`) next to the live one
//! (`<id>`). Both are the same logical document. [`IdentityResolver`] folds raw
//! store ids into a [`DocumentId`] and expands a [`DocumentId`] back into the
//! raw ids that may exist for it.
//!
//! ## Example
//! ```rust
//! use spotlight::{DocumentId, DraftPrefix, IdentityResolver};
//!
//! let resolver = DraftPrefix::default();
//! assert_eq!(resolver.canonical("drafts.news-1"), DocumentId::new("news-1"));
//! assert_eq!(resolver.canonical("news-1"), DocumentId::new("news-1"));
//! assert_eq!(
//!     resolver.variants(&DocumentId::new("news-1")),
//!     vec!["news-1".to_string(), "drafts.news-1".to_string()],
//! );
//! ```

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical identity of a logical document (draft prefix removed).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wraps an already canonical id.
    ///
    /// Use an [`IdentityResolver`] for raw ids that may carry a draft prefix.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for DocumentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Document kind as named by the CMS schema (e.g. `newsItem`, `videocontent`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentType(String);

impl DocumentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for DocumentType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Maps raw store ids to canonical identities and back.
///
/// Implementations must be consistent: every id returned by
/// [`variants`](Self::variants) resolves to the same canonical id through
/// [`canonical`](Self::canonical).
pub trait IdentityResolver: Send + Sync + 'static {
    /// Returns the canonical identity of a raw store id.
    fn canonical(&self, raw: &str) -> DocumentId;

    /// Returns every raw id that may hold a record of `id`, published first.
    fn variants(&self, id: &DocumentId) -> Vec<String>;
}

/// Resolver for stores that mark drafts with an id prefix.
#[derive(Clone, Debug)]
pub struct DraftPrefix {
    prefix: String,
}

impl DraftPrefix {
    /// Prefix used by Sanity-style stores.
    pub const DEFAULT_PREFIX: &'static str = "drafts.";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// True if `raw` names a draft record.
    pub fn is_draft(&self, raw: &str) -> bool {
        !self.prefix.is_empty() && raw.starts_with(&self.prefix)
    }

    /// Raw id of the draft record for `id`.
    pub fn draft_of(&self, id: &DocumentId) -> String {
        format!("{}{}", self.prefix, id.as_str())
    }
}

impl Default for DraftPrefix {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl IdentityResolver for DraftPrefix {
    fn canonical(&self, raw: &str) -> DocumentId {
        if self.prefix.is_empty() {
            return DocumentId::new(raw);
        }
        DocumentId::new(raw.strip_prefix(self.prefix.as_str()).unwrap_or(raw))
    }

    fn variants(&self, id: &DocumentId) -> Vec<String> {
        if self.prefix.is_empty() {
            return vec![id.as_str().to_string()];
        }
        vec![id.as_str().to_string(), self.draft_of(id)]
    }
}
