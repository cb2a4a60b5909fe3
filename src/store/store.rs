use std::cmp::Ordering;

use async_trait::async_trait;

use crate::documents::{DocumentType, FeaturePatch, FeaturedDoc, Revision};
use crate::error::StoreError;

/// Order of featured query results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeaturedOrder {
    /// Undated first, then `featuredAt` ascending, then raw id.
    #[default]
    OldestFirst,
}

impl FeaturedOrder {
    /// Compares two records under this order.
    pub fn compare(&self, a: &FeaturedDoc, b: &FeaturedDoc) -> Ordering {
        match self {
            FeaturedOrder::OldestFirst => a
                .featured_at
                .cmp(&b.featured_at)
                .then_with(|| a.id.cmp(&b.id)),
        }
    }
}

/// "Featured documents of these types, except these records."
///
/// Equivalent GROQ:
/// ```text
/// *[_type in $types && featured == true && !(_id in $exclude)] | order(featuredAt asc)
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeaturedQuery {
    /// Document types in the featured set.
    pub types: Vec<DocumentType>,
    /// Raw ids to leave out (every variant of the candidate).
    pub exclude: Vec<String>,
    /// Requested ordering.
    pub order: FeaturedOrder,
}

impl FeaturedQuery {
    /// Query for a whole featured set.
    pub fn featured(types: Vec<DocumentType>) -> Self {
        Self {
            types,
            exclude: Vec::new(),
            order: FeaturedOrder::OldestFirst,
        }
    }

    /// Leaves out the given raw ids.
    pub fn excluding(mut self, raw_ids: Vec<String>) -> Self {
        self.exclude = raw_ids;
        self
    }

    /// True if `doc` satisfies the filter part of the query.
    pub fn matches(&self, doc: &FeaturedDoc) -> bool {
        doc.featured && self.types.contains(&doc.doc_type) && !self.exclude.contains(&doc.id)
    }
}

/// Read/patch capability over CMS documents.
///
/// ### Implementation requirements
/// - All methods are called with a timeout applied by the caller; adapters
///   should not add unbounded retries of their own.
/// - Patches touch only `featured` and `featuredAt`.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Returns the records that exist among `raw_ids` (missing ids are skipped).
    async fn fetch(&self, raw_ids: &[String]) -> Result<Vec<FeaturedDoc>, StoreError>;

    /// Runs a featured-set query.
    async fn query(&self, query: &FeaturedQuery) -> Result<Vec<FeaturedDoc>, StoreError>;

    /// Applies `patch` to `raw_id`.
    ///
    /// With `expected = Some(rev)` the write is conditional on the stored revision.
    async fn patch(
        &self,
        raw_id: &str,
        patch: &FeaturePatch,
        expected: Option<&Revision>,
    ) -> Result<Revision, StoreError>;

    /// Returns the adapter name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
