//! # In-memory document store.
//!
//! [`MemoryStore`] keeps raw records (drafts and published) in a map and bumps a
//! revision counter on every write, like a real CMS `_rev`. It implements the
//! full adapter contract, including conditional patches.
//!
//! ## Example
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use spotlight::{DocumentStore, FeaturedQuery, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.create("news-1", "newsItem").await;
//! store.create("drafts.news-1", "newsItem").await;
//!
//! let featured = store
//!     .query(&FeaturedQuery::featured(vec!["newsItem".into()]))
//!     .await
//!     .unwrap();
//! assert!(featured.is_empty());
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::documents::{DocumentType, FeaturePatch, FeaturedDoc, Revision};
use crate::error::StoreError;

use super::store::{DocumentStore, FeaturedOrder, FeaturedQuery};

/// Map-backed [`DocumentStore`] with per-write revisions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, FeaturedDoc>>,
    rev: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_revision(&self) -> Revision {
        let n = self.rev.fetch_add(1, Ordering::Relaxed) + 1;
        Revision::new(format!("r{n}"))
    }

    /// Creates (or resets) an unfeatured record.
    pub async fn create(&self, raw_id: &str, doc_type: impl Into<DocumentType>) -> Revision {
        self.put(raw_id, doc_type, false, None).await
    }

    /// Writes a record with explicit featured state, bypassing any rule.
    ///
    /// Used to seed legacy data (e.g. featured without `featuredAt`).
    pub async fn put(
        &self,
        raw_id: &str,
        doc_type: impl Into<DocumentType>,
        featured: bool,
        featured_at: Option<DateTime<Utc>>,
    ) -> Revision {
        let revision = self.next_revision();
        let doc = FeaturedDoc {
            id: raw_id.to_string(),
            doc_type: doc_type.into(),
            featured,
            featured_at,
            revision: revision.clone(),
        };
        self.docs.write().await.insert(raw_id.to_string(), doc);
        revision
    }

    /// Returns a copy of one record.
    pub async fn get(&self, raw_id: &str) -> Option<FeaturedDoc> {
        self.docs.read().await.get(raw_id).cloned()
    }

    /// Removes a record.
    pub async fn remove(&self, raw_id: &str) -> Option<FeaturedDoc> {
        self.docs.write().await.remove(raw_id)
    }

    /// All featured records, oldest first.
    pub async fn featured(&self) -> Vec<FeaturedDoc> {
        let docs = self.docs.read().await;
        let mut out: Vec<FeaturedDoc> = docs.values().filter(|d| d.featured).cloned().collect();
        out.sort_by(|a, b| FeaturedOrder::OldestFirst.compare(a, b));
        out
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, raw_ids: &[String]) -> Result<Vec<FeaturedDoc>, StoreError> {
        let docs = self.docs.read().await;
        Ok(raw_ids.iter().filter_map(|id| docs.get(id).cloned()).collect())
    }

    async fn query(&self, query: &FeaturedQuery) -> Result<Vec<FeaturedDoc>, StoreError> {
        let docs = self.docs.read().await;
        let mut out: Vec<FeaturedDoc> = docs.values().filter(|d| query.matches(d)).cloned().collect();
        out.sort_by(|a, b| query.order.compare(a, b));
        Ok(out)
    }

    async fn patch(
        &self,
        raw_id: &str,
        patch: &FeaturePatch,
        expected: Option<&Revision>,
    ) -> Result<Revision, StoreError> {
        let mut docs = self.docs.write().await;
        let doc = docs.get_mut(raw_id).ok_or_else(|| StoreError::NotFound {
            id: raw_id.to_string(),
        })?;

        if let Some(expected) = expected {
            if &doc.revision != expected {
                return Err(StoreError::Conflict {
                    id: raw_id.to_string(),
                    expected: expected.clone(),
                    actual: Some(doc.revision.clone()),
                });
            }
        }

        patch.apply_to(doc);
        doc.revision = self.next_revision();
        Ok(doc.revision.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_patch_bumps_revision() {
        let store = MemoryStore::new();
        let r1 = store.create("n1", "newsItem").await;
        let r2 = store
            .patch("n1", &FeaturePatch::admit(Utc::now()), Some(&r1))
            .await
            .unwrap();
        assert_ne!(r1, r2);
        assert!(store.get("n1").await.unwrap().featured);
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let store = MemoryStore::new();
        let r1 = store.create("n1", "newsItem").await;
        store.patch("n1", &FeaturePatch::clear(), None).await.unwrap();

        let err = store
            .patch("n1", &FeaturePatch::admit(Utc::now()), Some(&r1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert!(!store.get("n1").await.unwrap().featured);
    }

    #[tokio::test]
    async fn test_patch_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.patch("nope", &FeaturePatch::clear(), None).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound { id: "nope".into() });
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let store = MemoryStore::new();
        let t = |s| DateTime::from_timestamp(s, 0);
        store.put("n2", "newsItem", true, t(200)).await;
        store.put("v1", "videocontent", true, t(100)).await;
        store.put("legacy", "newsItem", true, None).await;
        store.put("s1", "socials", true, t(50)).await;
        store.create("n3", "newsItem").await;

        let q = FeaturedQuery::featured(vec!["newsItem".into(), "videocontent".into()])
            .excluding(vec!["n2".into()]);
        let ids: Vec<_> = store.query(&q).await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["legacy", "v1"]);
    }

    #[tokio::test]
    async fn test_fetch_skips_missing() {
        let store = MemoryStore::new();
        store.create("n1", "newsItem").await;
        let got = store
            .fetch(&["n1".to_string(), "drafts.n1".to_string()])
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
    }
}
