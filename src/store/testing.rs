//! Fault-injecting store wrapper for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::documents::{FeaturePatch, FeaturedDoc, Revision};
use crate::error::StoreError;

use super::{DocumentStore, FeaturedQuery, MemoryStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Fetch,
    Query,
    Patch,
}

pub(crate) enum Action {
    /// Serve the call unchanged (lets a later rule hit the next call).
    Pass,
    /// Fail the call.
    Fail(StoreError),
    /// Sleep before serving the call.
    Delay(Duration),
    /// Write a record behind the controller's back, then serve the call.
    Put {
        raw_id: String,
        doc_type: String,
        featured: bool,
        featured_at: Option<DateTime<Utc>>,
    },
}

struct Rule {
    op: Op,
    target: Option<String>,
    action: Action,
}

/// [`MemoryStore`] with one-shot scripted faults.
pub(crate) struct FlakyStore {
    pub inner: MemoryStore,
    rules: Mutex<Vec<Rule>>,
    patches: Mutex<Vec<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            rules: Mutex::new(Vec::new()),
            patches: Mutex::new(Vec::new()),
        }
    }

    /// Registers a one-shot action for the next `op` on `target` (any target if `None`).
    pub fn on(&self, op: Op, target: Option<&str>, action: Action) {
        self.rules.lock().unwrap().push(Rule {
            op,
            target: target.map(str::to_string),
            action,
        });
    }

    /// Raw ids of successful patches, in order.
    pub fn patched(&self) -> Vec<String> {
        self.patches.lock().unwrap().clone()
    }

    async fn intercept(&self, op: Op, target: &str) -> Result<(), StoreError> {
        let action = {
            let mut rules = self.rules.lock().unwrap();
            let pos = rules
                .iter()
                .position(|r| r.op == op && r.target.as_deref().is_none_or(|t| t == target));
            pos.map(|i| rules.remove(i).action)
        };

        match action {
            None | Some(Action::Pass) => Ok(()),
            Some(Action::Fail(err)) => Err(err),
            Some(Action::Delay(d)) => {
                tokio::time::sleep(d).await;
                Ok(())
            }
            Some(Action::Put {
                raw_id,
                doc_type,
                featured,
                featured_at,
            }) => {
                self.inner.put(&raw_id, doc_type, featured, featured_at).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn fetch(&self, raw_ids: &[String]) -> Result<Vec<FeaturedDoc>, StoreError> {
        let target = raw_ids.first().map(String::as_str).unwrap_or_default();
        self.intercept(Op::Fetch, target).await?;
        self.inner.fetch(raw_ids).await
    }

    async fn query(&self, query: &FeaturedQuery) -> Result<Vec<FeaturedDoc>, StoreError> {
        self.intercept(Op::Query, "").await?;
        self.inner.query(query).await
    }

    async fn patch(
        &self,
        raw_id: &str,
        patch: &FeaturePatch,
        expected: Option<&Revision>,
    ) -> Result<Revision, StoreError> {
        self.intercept(Op::Patch, raw_id).await?;
        let rev = self.inner.patch(raw_id, patch, expected).await?;
        self.patches.lock().unwrap().push(raw_id.to_string());
        Ok(rev)
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}
