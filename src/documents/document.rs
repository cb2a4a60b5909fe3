//! # Stored document records.
//!
//! [`FeaturedDoc`] is the projection of a CMS document the controller reads:
//! raw id, type, the `featured` flag, `featuredAt` and the store revision.
//! [`FeaturePatch`] is the only write the controller ever issues.
//!
//! Field names follow the CMS wire format (`_id`, `_type`, `_rev`,
//! `featuredAt`), so adapters can deserialize query results directly.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::DocumentType;

/// Opaque store revision used for optimistic concurrency checks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(rev: impl Into<String>) -> Self {
        Self(rev.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored record of a featurable document.
///
/// `id` is the **raw** store id; it may carry a draft prefix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedDoc {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: DocumentType,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub featured_at: Option<DateTime<Utc>>,
    #[serde(rename = "_rev")]
    pub revision: Revision,
}

impl FeaturedDoc {
    /// True if the record is featured without a `featuredAt` stamp.
    ///
    /// Such records predate the stamping rule and are evicted first.
    #[inline]
    pub fn is_undated(&self) -> bool {
        self.featured && self.featured_at.is_none()
    }
}

/// Write applied to the `featured`/`featuredAt` pair of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturePatch {
    pub featured: bool,
    pub featured_at: Option<DateTime<Utc>>,
}

impl FeaturePatch {
    /// Marks a record featured at `at`.
    pub fn admit(at: DateTime<Utc>) -> Self {
        Self {
            featured: true,
            featured_at: Some(at),
        }
    }

    /// Clears both fields (eviction and explicit un-feature).
    pub fn clear() -> Self {
        Self {
            featured: false,
            featured_at: None,
        }
    }

    /// True if applying the patch to `doc` would change nothing.
    pub fn is_noop_for(&self, doc: &FeaturedDoc) -> bool {
        doc.featured == self.featured && doc.featured_at == self.featured_at
    }

    /// Applies the patch to an in-memory record.
    pub fn apply_to(&self, doc: &mut FeaturedDoc) {
        doc.featured = self.featured;
        doc.featured_at = self.featured_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deserializes_cms_wire_format() {
        let raw = r#"{
            "_id": "drafts.n1",
            "_type": "newsItem",
            "_rev": "r7",
            "featured": true,
            "featuredAt": "2024-05-01T10:00:00Z"
        }"#;
        let doc: FeaturedDoc = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.id, "drafts.n1");
        assert_eq!(doc.doc_type.as_str(), "newsItem");
        assert_eq!(doc.revision.as_str(), "r7");
        assert_eq!(
            doc.featured_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_missing_flags_default_to_unfeatured() {
        let raw = r#"{"_id": "v1", "_type": "videocontent", "_rev": "a"}"#;
        let doc: FeaturedDoc = serde_json::from_str(raw).unwrap();
        assert!(!doc.featured);
        assert!(doc.featured_at.is_none());
        assert!(!doc.is_undated());
    }

    #[test]
    fn test_clear_patch_is_noop_on_unfeatured_record() {
        let doc = FeaturedDoc {
            id: "x".into(),
            doc_type: "newsItem".into(),
            featured: false,
            featured_at: None,
            revision: Revision::new("1"),
        };
        assert!(FeaturePatch::clear().is_noop_for(&doc));
        assert!(!FeaturePatch::admit(Utc::now()).is_noop_for(&doc));
    }
}
