//! # Admission: the featured-set rule.
//!
//! [`Admission`] runs one feature/un-feature request against a [`DocumentStore`],
//! with retries, deadlines and event publishing. It does **not** serialize
//! concurrent requests; the [`Controller`](crate::Controller) does that by running
//! every request for a featured set on one slot worker.
//!
//! ## Feature flow
//! ```text
//! request_feature(raw_id, type)
//!   ├─► canonical id, eligibility check
//!   loop {
//!     ├─► attempt += 1, publish AdmissionRequested
//!     ├─► resume?  ── yes ─► lookup ─► query ─► plan ─► evict (only new)* ─► admit
//!     │            └─ no ──► lookup ─► query ─► plan ─► evict* ─► admit
//!     ├─► verify: re-read set, |set| <= capacity
//!     ├─ Ok  ──► publish DocumentAdmitted, return AdmissionResult
//!     └─ Err ──► retryable && retry.allows(attempt)?
//!                  ├─ yes ─► publish RetryScheduled, sleep(backoff.next(attempt-1))
//!                  └─ no  ─► publish AdmissionFailed, return error
//!   }
//! ```
//!
//! ## Rules
//! - Every eviction/admission patch carries the revision read in the same attempt;
//!   a conflict restarts from the read step.
//! - A transient failure after all planned evictions committed never re-runs them.
//!   The retry re-reads the set: if other admissions refilled it meanwhile, their
//!   oldest members are evicted too; otherwise only the admit step runs.
//! - A document that already carries a stamp keeps it; a re-request is not a new
//!   admission.
//! - Nothing is reported admitted unless every admit patch confirmed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time;

use crate::core::clock::{Clock, next_stamp};
use crate::core::config::Config;
use crate::core::plan::AdmissionPlan;
use crate::core::runner::with_deadline;
use crate::documents::{
    DocumentId, DocumentType, FeaturePatch, FeaturedDoc, IdentityResolver, Member,
};
use crate::error::{AdmissionError, StoreError, Step};
use crate::events::{Bus, Event, EventKind};
use crate::store::{DocumentStore, FeaturedQuery};

/// Result of a successful feature request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmissionResult {
    /// Document now featured.
    pub admitted: DocumentId,
    /// Members un-featured to make room, oldest first (empty if none).
    pub evicted: Vec<DocumentId>,
    /// Stamp recorded on the admitted document.
    pub featured_at: DateTime<Utc>,
}

/// Result of an un-feature request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ack {
    /// At least one record was un-featured.
    Unfeatured,
    /// The document was already unfeatured; nothing was written.
    Unchanged,
}

/// What one request has committed so far.
///
/// Carried by store-level [`AdmissionError`]s so callers know which sub-steps
/// landed and can [`resume`](Admission::resume) only the remaining admit step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Document being featured or un-featured.
    pub id: DocumentId,
    /// Requested type (`None` for un-feature).
    pub doc_type: Option<DocumentType>,
    /// Members whose eviction committed.
    pub evicted: Vec<DocumentId>,
    /// Planned evictions not yet committed in the current attempt.
    pub remaining: Vec<DocumentId>,
    /// Stamp chosen for the admission (set once a plan exists).
    pub stamp: Option<DateTime<Utc>>,
    /// True once every admit patch confirmed.
    pub admitted: bool,
}

impl Progress {
    pub fn new(id: DocumentId, doc_type: DocumentType) -> Self {
        Self {
            id,
            doc_type: Some(doc_type),
            evicted: Vec::new(),
            remaining: Vec::new(),
            stamp: None,
            admitted: false,
        }
    }

    fn unfeature(id: DocumentId) -> Self {
        Self {
            id,
            doc_type: None,
            evicted: Vec::new(),
            remaining: Vec::new(),
            stamp: None,
            admitted: false,
        }
    }

    /// True if all planned evictions committed and only the admit step is left.
    pub fn is_resumable(&self) -> bool {
        self.doc_type.is_some() && self.stamp.is_some() && self.remaining.is_empty() && !self.admitted
    }
}

/// Featured-set rule bound to a store.
pub struct Admission {
    cfg: Config,
    store: Arc<dyn DocumentStore>,
    resolver: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
    bus: Bus,
}

impl Admission {
    /// Creates an admission engine. `cfg` should be validated by the caller.
    pub fn new(
        cfg: Config,
        store: Arc<dyn DocumentStore>,
        resolver: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
        bus: Bus,
    ) -> Self {
        Self {
            cfg,
            store,
            resolver,
            clock,
            bus,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn resolver(&self) -> &dyn IdentityResolver {
        self.resolver.as_ref()
    }

    /// Features `raw_id`, evicting the oldest member(s) if the set is full.
    pub async fn request_feature(
        &self,
        raw_id: &str,
        doc_type: &DocumentType,
    ) -> Result<AdmissionResult, AdmissionError> {
        self.check_eligible(doc_type)?;
        let progress = Progress::new(self.resolver.canonical(raw_id), doc_type.clone());
        self.drive(progress, false).await
    }

    /// Finishes a request whose evictions committed but whose admit step failed.
    ///
    /// Committed evictions are not run again. If requests served in between
    /// refilled the set, the oldest members are evicted to make room once more.
    /// Progress that is not resumable runs the full request instead.
    pub async fn resume(&self, progress: Progress) -> Result<AdmissionResult, AdmissionError> {
        let Some(doc_type) = progress.doc_type.clone() else {
            return Err(AdmissionError::InvalidRequest {
                reason: format!("progress for {} is not a feature request", progress.id),
            });
        };
        self.check_eligible(&doc_type)?;
        let resume = progress.is_resumable();
        self.drive(progress, resume).await
    }

    /// Un-features `raw_id` (every record of its identity). Idempotent.
    pub async fn request_unfeature(&self, raw_id: &str) -> Result<Ack, AdmissionError> {
        let progress = Progress::unfeature(self.resolver.canonical(raw_id));
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.unfeature_once(&progress).await {
                Ok(ack) => return Ok(ack),
                Err(e) => self.on_failure(&progress.id, attempt, e).await?,
            }
        }
    }

    /// Plans the admission of `raw_id` without writing anything.
    ///
    /// This is the read-only validation editors can run before saving: it
    /// reports which members the admission would evict.
    pub async fn preview(
        &self,
        raw_id: &str,
        doc_type: &DocumentType,
    ) -> Result<AdmissionPlan, AdmissionError> {
        self.check_eligible(doc_type)?;
        let progress = Progress::new(self.resolver.canonical(raw_id), doc_type.clone());
        let records = self.lookup(&progress, Step::Lookup).await?;
        self.check_type(&records, doc_type)?;
        let members = self.members(&progress, doc_type).await?;
        Ok(AdmissionPlan::compute(progress.id, members, self.cfg.capacity))
    }

    /// Current members of `doc_type`'s featured set, oldest first.
    pub async fn featured(&self, doc_type: &DocumentType) -> Result<Vec<Member>, AdmissionError> {
        self.read_set(doc_type, None, Step::Read)
            .await
            .map_err(|e| AdmissionError::from_read(Step::Read, e))
    }

    /// Retry loop shared by feature requests and resumes.
    async fn drive(
        &self,
        mut progress: Progress,
        mut resume: bool,
    ) -> Result<AdmissionResult, AdmissionError> {
        let doc_type = progress.doc_type.clone().unwrap_or_else(|| DocumentType::new(""));
        let slot = self.cfg.slot_key(Some(&doc_type));
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.bus.publish(
                Event::new(EventKind::AdmissionRequested)
                    .with_document(progress.id.as_str())
                    .with_doc_type(doc_type.as_str())
                    .with_slot(&slot)
                    .with_attempt(attempt),
            );

            let res = if resume {
                self.admit_only(&mut progress, &doc_type).await
            } else {
                self.attempt(&mut progress, &doc_type).await
            };

            match res {
                Ok(result) => {
                    self.bus.publish(
                        Event::new(EventKind::DocumentAdmitted)
                            .with_document(result.admitted.as_str())
                            .with_doc_type(doc_type.as_str())
                            .with_slot(&slot)
                            .with_count(result.evicted.len()),
                    );
                    return Ok(result);
                }
                Err(e) => {
                    resume = matches!(e, AdmissionError::StoreUnavailable { .. })
                        && progress.is_resumable();
                    self.on_failure(&progress.id, attempt, e).await?;
                }
            }
        }
    }

    /// Decides between retrying (after a backoff sleep) and giving up.
    async fn on_failure(
        &self,
        id: &DocumentId,
        attempt: u32,
        err: AdmissionError,
    ) -> Result<(), AdmissionError> {
        if let AdmissionError::ConcurrentModification { step, source, .. } = &err {
            self.bus.publish(
                Event::new(EventKind::ConflictDetected)
                    .with_document(id.as_str())
                    .with_step(*step)
                    .with_reason(source.to_string()),
            );
        }

        if !(err.is_retryable() && self.cfg.retry.allows(attempt)) {
            let mut ev = Event::new(EventKind::AdmissionFailed)
                .with_document(id.as_str())
                .with_attempt(attempt)
                .with_reason(err.to_string());
            if let Some(step) = err.step() {
                ev = ev.with_step(step);
            }
            self.bus.publish(ev);
            return Err(err);
        }

        let delay = self.cfg.backoff.next(attempt - 1);
        self.bus.publish(
            Event::new(EventKind::RetryScheduled)
                .with_document(id.as_str())
                .with_attempt(attempt)
                .with_delay(delay)
                .with_reason(err.to_string()),
        );
        time::sleep(delay).await;
        Ok(())
    }

    /// One full attempt: lookup, query, plan, evict, admit, verify.
    async fn attempt(
        &self,
        progress: &mut Progress,
        doc_type: &DocumentType,
    ) -> Result<AdmissionResult, AdmissionError> {
        progress.remaining.clear();
        progress.stamp = None;

        let records = self.lookup(progress, Step::Lookup).await?;
        self.check_type(&records, doc_type)?;

        let members = self.members(progress, doc_type).await?;
        let plan = AdmissionPlan::compute(progress.id.clone(), members, self.cfg.capacity);

        let stamp = match current_stamp(&records) {
            Some(at) => at,
            None => next_stamp(self.clock.now(), plan.newest_kept()),
        };
        progress.stamp = Some(stamp);
        progress.remaining = plan.evicted_ids();

        for member in plan.evict() {
            self.evict(member, progress, doc_type).await?;
        }

        self.admit(&records, stamp, progress).await?;
        self.verify(progress, doc_type).await?;

        Ok(AdmissionResult {
            admitted: progress.id.clone(),
            evicted: progress.evicted.clone(),
            featured_at: stamp,
        })
    }

    /// Admit step after committed evictions, with fresh revisions.
    ///
    /// The set is read again first: requests served since the failure may have
    /// taken the room. The earlier stamp is kept only while nothing new has to
    /// go and it still sorts after every member.
    async fn admit_only(
        &self,
        progress: &mut Progress,
        doc_type: &DocumentType,
    ) -> Result<AdmissionResult, AdmissionError> {
        let records = self.lookup(progress, Step::Admit).await?;
        self.check_type(&records, doc_type)?;

        let members = self.members(progress, doc_type).await?;
        let plan = AdmissionPlan::compute(progress.id.clone(), members, self.cfg.capacity);

        let newest = plan.newest_kept();
        let stamp = match (current_stamp(&records), progress.stamp) {
            (Some(at), _) => at,
            (None, Some(at)) if plan.evict().is_empty() && newest.is_none_or(|n| at > n) => at,
            _ => next_stamp(self.clock.now(), newest),
        };
        progress.stamp = Some(stamp);
        progress.remaining = plan.evicted_ids();

        for member in plan.evict() {
            self.evict(member, progress, doc_type).await?;
        }

        self.admit(&records, stamp, progress).await?;
        self.verify(progress, doc_type).await?;

        Ok(AdmissionResult {
            admitted: progress.id.clone(),
            evicted: progress.evicted.clone(),
            featured_at: stamp,
        })
    }

    async fn unfeature_once(&self, progress: &Progress) -> Result<Ack, AdmissionError> {
        let records = self.lookup(progress, Step::Lookup).await?;
        let clear = FeaturePatch::clear();

        let mut patched = 0usize;
        for doc in records.iter().filter(|d| !clear.is_noop_for(d)) {
            self.patch(&doc.id, &clear, None, Step::Unfeature)
                .await
                .map_err(|e| AdmissionError::from_store(Step::Unfeature, progress, e))?;
            patched += 1;
        }

        self.bus.publish(
            Event::new(EventKind::DocumentUnfeatured)
                .with_document(progress.id.as_str())
                .with_count(patched),
        );

        Ok(if patched == 0 {
            Ack::Unchanged
        } else {
            Ack::Unfeatured
        })
    }

    /// Reads every record of the identity; empty means the document does not exist.
    async fn lookup(
        &self,
        progress: &Progress,
        step: Step,
    ) -> Result<Vec<FeaturedDoc>, AdmissionError> {
        let variants = self.resolver.variants(&progress.id);
        let timeout = self.cfg.store_deadline();
        let records = with_deadline(&self.bus, step, timeout, self.store.fetch(&variants))
            .await
            .map_err(|e| AdmissionError::from_store(step, progress, e))?;

        if records.is_empty() {
            return Err(AdmissionError::DocumentNotFound {
                id: progress.id.clone(),
            });
        }
        Ok(records)
    }

    /// Reads the featured set of `doc_type` without the candidate.
    async fn members(
        &self,
        progress: &Progress,
        doc_type: &DocumentType,
    ) -> Result<Vec<Member>, AdmissionError> {
        self.read_set(doc_type, Some(&progress.id), Step::Query)
            .await
            .map_err(|e| AdmissionError::from_store(Step::Query, progress, e))
    }

    /// Reads the featured set of `doc_type`, grouped by identity, oldest first.
    async fn read_set(
        &self,
        doc_type: &DocumentType,
        exclude: Option<&DocumentId>,
        step: Step,
    ) -> Result<Vec<Member>, StoreError> {
        let mut query = FeaturedQuery::featured(self.cfg.set_types(doc_type));
        if let Some(id) = exclude {
            query = query.excluding(self.resolver.variants(id));
        }

        let timeout = self.cfg.store_deadline();
        let docs = with_deadline(&self.bus, step, timeout, self.store.query(&query)).await?;

        let mut members = Member::group(&docs, self.resolver.as_ref());
        if let Some(id) = exclude {
            members.retain(|m| &m.id != id);
        }
        Ok(members)
    }

    /// Un-features every record of `member` under its read revision.
    async fn evict(
        &self,
        member: &Member,
        progress: &mut Progress,
        doc_type: &DocumentType,
    ) -> Result<(), AdmissionError> {
        let clear = FeaturePatch::clear();
        for record in &member.records {
            self.patch(&record.raw_id, &clear, Some(&record.revision), Step::Evict)
                .await
                .map_err(|e| AdmissionError::from_store(Step::Evict, progress, e))?;
        }

        progress.remaining.retain(|id| id != &member.id);
        progress.evicted.push(member.id.clone());

        self.bus.publish(
            Event::new(EventKind::MemberEvicted)
                .with_document(member.id.as_str())
                .with_doc_type(member.doc_type.as_str())
                .with_slot(self.cfg.slot_key(Some(doc_type)))
                .with_reason(format!("admitting {}", progress.id)),
        );
        Ok(())
    }

    /// Marks every record of the candidate featured at `stamp`.
    async fn admit(
        &self,
        records: &[FeaturedDoc],
        stamp: DateTime<Utc>,
        progress: &mut Progress,
    ) -> Result<(), AdmissionError> {
        let patch = FeaturePatch::admit(stamp);
        for doc in records.iter().filter(|d| !patch.is_noop_for(d)) {
            self.patch(&doc.id, &patch, Some(&doc.revision), Step::Admit)
                .await
                .map_err(|e| AdmissionError::from_store(Step::Admit, progress, e))?;
        }
        progress.admitted = true;
        Ok(())
    }

    /// Re-reads the set and checks the capacity invariant.
    ///
    /// A failed re-read does not fail the request, since the admission itself
    /// confirmed. It is published as [`EventKind::VerifySkipped`].
    async fn verify(&self, progress: &Progress, doc_type: &DocumentType) -> Result<(), AdmissionError> {
        let members = match self.read_set(doc_type, None, Step::Verify).await {
            Ok(members) => members,
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::VerifySkipped)
                        .with_document(progress.id.as_str())
                        .with_slot(self.cfg.slot_key(Some(doc_type)))
                        .with_step(Step::Verify)
                        .with_reason(format!("{}: {e}", self.store.name())),
                );
                return Ok(());
            }
        };

        if members.len() <= self.cfg.capacity {
            return Ok(());
        }

        let ids: Vec<DocumentId> = members.into_iter().map(|m| m.id).collect();
        self.bus.publish(
            Event::new(EventKind::InvariantViolated)
                .with_document(progress.id.as_str())
                .with_slot(self.cfg.slot_key(Some(doc_type)))
                .with_count(ids.len())
                .with_reason(format!("capacity {}", self.cfg.capacity)),
        );
        Err(AdmissionError::CapacityInvariantViolation {
            observed: ids.len(),
            capacity: self.cfg.capacity,
            members: ids,
        })
    }

    async fn patch(
        &self,
        raw_id: &str,
        patch: &FeaturePatch,
        expected: Option<&crate::documents::Revision>,
        step: Step,
    ) -> Result<(), StoreError> {
        let timeout = self.cfg.store_deadline();
        with_deadline(
            &self.bus,
            step,
            timeout,
            self.store.patch(raw_id, patch, expected),
        )
        .await
        .map(|_| ())
    }

    fn check_eligible(&self, doc_type: &DocumentType) -> Result<(), AdmissionError> {
        if self.cfg.is_eligible(doc_type) {
            return Ok(());
        }
        Err(AdmissionError::InvalidRequest {
            reason: format!("document type {doc_type} cannot be featured"),
        })
    }

    fn check_type(&self, records: &[FeaturedDoc], doc_type: &DocumentType) -> Result<(), AdmissionError> {
        match records.iter().find(|d| &d.doc_type != doc_type) {
            None => Ok(()),
            Some(d) => Err(AdmissionError::InvalidRequest {
                reason: format!("{} is a {}, not a {doc_type}", d.id, d.doc_type),
            }),
        }
    }
}

/// Stamp of a document that is already a dated member (oldest record wins).
fn current_stamp(records: &[FeaturedDoc]) -> Option<DateTime<Utc>> {
    records
        .iter()
        .filter(|d| d.featured)
        .filter_map(|d| d.featured_at)
        .min()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::broadcast;

    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::scope::SetScope;
    use crate::documents::DraftPrefix;
    use crate::policies::RetryPolicy;
    use crate::store::MemoryStore;
    use crate::store::testing::{Action, FlakyStore, Op};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn news() -> DocumentType {
        DocumentType::new("newsItem")
    }

    fn engine(store: Arc<dyn DocumentStore>, cfg: Config) -> (Admission, Bus) {
        let bus = Bus::new(256);
        let clock = Arc::new(ManualClock::new(at(1_000)));
        let engine = Admission::new(cfg, store, Arc::new(DraftPrefix::default()), clock, bus.clone());
        (engine, bus)
    }

    async fn seed(store: &MemoryStore, items: &[(&str, &str, Option<i64>)]) {
        for (id, ty, secs) in items {
            store.put(id, *ty, true, secs.map(at)).await;
        }
    }

    async fn featured_ids(store: &MemoryStore) -> Vec<String> {
        store.featured().await.into_iter().map(|d| d.id).collect()
    }

    fn kinds(rx: &mut broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev.kind);
        }
        out
    }

    /// A1, B1, A2, B2 featured in that order; A3 unfeatured.
    async fn full_set(store: &MemoryStore) {
        seed(
            store,
            &[
                ("a1", "newsItem", Some(1)),
                ("b1", "videocontent", Some(2)),
                ("a2", "newsItem", Some(3)),
                ("b2", "videocontent", Some(4)),
            ],
        )
        .await;
        store.create("a3", "newsItem").await;
    }

    #[tokio::test]
    async fn test_full_set_evicts_oldest_across_types() {
        let store = Arc::new(MemoryStore::new());
        full_set(&store).await;
        let (engine, bus) = engine(store.clone(), Config::default());
        let mut rx = bus.subscribe();

        let res = engine.request_feature("a3", &news()).await.unwrap();

        assert_eq!(res.admitted, DocumentId::new("a3"));
        assert_eq!(res.evicted, vec![DocumentId::new("a1")]);
        assert_eq!(res.featured_at, at(1_000));
        assert_eq!(featured_ids(&store).await, vec!["b1", "a2", "b2", "a3"]);
        assert!(store.get("a1").await.unwrap().featured_at.is_none());

        let kinds = kinds(&mut rx);
        assert_eq!(
            kinds,
            vec![
                EventKind::AdmissionRequested,
                EventKind::MemberEvicted,
                EventKind::DocumentAdmitted
            ]
        );
    }

    #[tokio::test]
    async fn test_below_capacity_evicts_nothing() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &[("a1", "newsItem", Some(1)), ("b1", "videocontent", Some(2))]).await;
        store.create("a2", "newsItem").await;
        let (engine, _bus) = engine(store.clone(), Config::default());

        let res = engine.request_feature("a2", &news()).await.unwrap();

        assert!(res.evicted.is_empty());
        assert_eq!(featured_ids(&store).await, vec!["a1", "b1", "a2"]);
    }

    #[tokio::test]
    async fn test_undated_member_is_evicted_first() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            &[
                ("a1", "newsItem", Some(1)),
                ("a2", "newsItem", Some(2)),
                ("legacy", "newsItem", None),
                ("b1", "videocontent", Some(3)),
            ],
        )
        .await;
        store.create("a3", "newsItem").await;
        let (engine, _bus) = engine(store.clone(), Config::default());

        let res = engine.request_feature("a3", &news()).await.unwrap();

        assert_eq!(res.evicted, vec![DocumentId::new("legacy")]);
        assert!(!store.get("legacy").await.unwrap().featured);
    }

    #[tokio::test]
    async fn test_equal_stamps_evict_lowest_id() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            &[
                ("n-b", "newsItem", Some(5)),
                ("n-a", "newsItem", Some(5)),
                ("n-c", "newsItem", Some(6)),
                ("n-d", "newsItem", Some(7)),
            ],
        )
        .await;
        store.create("n-e", "newsItem").await;
        let (engine, _bus) = engine(store.clone(), Config::default());

        let res = engine.request_feature("n-e", &news()).await.unwrap();
        assert_eq!(res.evicted, vec![DocumentId::new("n-a")]);
    }

    #[tokio::test]
    async fn test_draft_and_published_count_once() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            &[
                ("a1", "newsItem", Some(1)),
                ("drafts.a1", "newsItem", Some(1)),
                ("a2", "newsItem", Some(2)),
                ("drafts.a2", "newsItem", Some(2)),
                ("b1", "videocontent", Some(3)),
            ],
        )
        .await;
        store.create("a3", "newsItem").await;
        store.create("drafts.a3", "newsItem").await;
        let (engine, _bus) = engine(store.clone(), Config::default());

        // Three identities, five records: room for one more.
        let res = engine.request_feature("drafts.a3", &news()).await.unwrap();
        assert!(res.evicted.is_empty());
        assert_eq!(res.admitted, DocumentId::new("a3"));
        assert!(store.get("a3").await.unwrap().featured);
        assert!(store.get("drafts.a3").await.unwrap().featured);

        // Four identities now: the next admission evicts both records of a1.
        store.create("b2", "videocontent").await;
        let res = engine
            .request_feature("b2", &DocumentType::new("videocontent"))
            .await
            .unwrap();
        assert_eq!(res.evicted, vec![DocumentId::new("a1")]);
        assert!(!store.get("a1").await.unwrap().featured);
        assert!(!store.get("drafts.a1").await.unwrap().featured);
    }

    #[tokio::test]
    async fn test_refeature_keeps_stamp_and_evicts_nothing() {
        let store = Arc::new(MemoryStore::new());
        full_set(&store).await;
        let (engine, _bus) = engine(store.clone(), Config::default());

        let res = engine.request_feature("a2", &news()).await.unwrap();

        assert!(res.evicted.is_empty());
        assert_eq!(res.featured_at, at(3));
        assert_eq!(featured_ids(&store).await, vec!["a1", "b1", "a2", "b2"]);
    }

    #[tokio::test]
    async fn test_toggled_without_stamp_is_admitted() {
        let store = Arc::new(MemoryStore::new());
        full_set(&store).await;
        // The editor flipped the flag; no stamp yet.
        store.put("a3", "newsItem", true, None).await;
        let (engine, _bus) = engine(store.clone(), Config::default());

        let res = engine.request_feature("a3", &news()).await.unwrap();

        assert_eq!(res.evicted, vec![DocumentId::new("a1")]);
        assert_eq!(store.get("a3").await.unwrap().featured_at, Some(at(1_000)));
    }

    #[tokio::test]
    async fn test_stamp_stays_after_newest_member() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &[("a1", "newsItem", Some(5_000))]).await;
        store.create("a2", "newsItem").await;
        let (engine, _bus) = engine(store.clone(), Config::default());

        let res = engine.request_feature("a2", &news()).await.unwrap();
        assert_eq!(res.featured_at, at(5_000) + chrono::TimeDelta::milliseconds(1));
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        full_set(&store).await;
        let (engine, _bus) = engine(store.clone(), Config::default());

        let err = engine.request_feature("ghost", &news()).await.unwrap_err();

        assert!(matches!(err, AdmissionError::DocumentNotFound { ref id } if id.as_str() == "ghost"));
        assert_eq!(featured_ids(&store).await, vec!["a1", "b1", "a2", "b2"]);
    }

    #[tokio::test]
    async fn test_ineligible_or_mismatched_type_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        store.create("s1", "socials").await;
        store.create("a1", "newsItem").await;
        let (engine, _bus) = engine(store.clone(), Config::default());

        let err = engine
            .request_feature("s1", &DocumentType::new("socials"))
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "invalid_request");

        let err = engine
            .request_feature("a1", &DocumentType::new("videocontent"))
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "invalid_request");
        assert!(store.featured().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_restarts_from_read() {
        let store = Arc::new(FlakyStore::new());
        full_set(&store.inner).await;
        // An editor touches a1 between our read and our eviction.
        store.on(
            Op::Patch,
            Some("a1"),
            Action::Put {
                raw_id: "a1".into(),
                doc_type: "newsItem".into(),
                featured: true,
                featured_at: Some(at(1)),
            },
        );
        let (engine, bus) = engine(store.clone(), Config::default());
        let mut rx = bus.subscribe();

        let res = engine.request_feature("a3", &news()).await.unwrap();

        assert_eq!(res.evicted, vec![DocumentId::new("a1")]);
        assert_eq!(featured_ids(&store.inner).await, vec!["b1", "a2", "b2", "a3"]);
        let kinds = kinds(&mut rx);
        assert!(kinds.contains(&EventKind::ConflictDetected));
        assert!(kinds.contains(&EventKind::RetryScheduled));
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::AdmissionRequested).count(),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_admit_failure_retries_admit_only() {
        let store = Arc::new(FlakyStore::new());
        full_set(&store.inner).await;
        store.on(
            Op::Patch,
            Some("a3"),
            Action::Fail(StoreError::Unavailable {
                reason: "connection reset".into(),
            }),
        );
        let (engine, _bus) = engine(store.clone(), Config::default());

        let res = engine.request_feature("a3", &news()).await.unwrap();

        assert_eq!(res.evicted, vec![DocumentId::new("a1")]);
        assert_eq!(store.patched(), vec!["a1", "a3"]);
        assert_eq!(featured_ids(&store.inner).await, vec!["b1", "a2", "b2", "a3"]);
    }

    #[tokio::test]
    async fn test_partial_commit_is_reported_and_resumable() {
        let store = Arc::new(FlakyStore::new());
        full_set(&store.inner).await;
        store.on(
            Op::Patch,
            Some("a3"),
            Action::Fail(StoreError::Unavailable {
                reason: "connection reset".into(),
            }),
        );
        let cfg = Config {
            retry: RetryPolicy::Never,
            ..Config::default()
        };
        let (engine, _bus) = engine(store.clone(), cfg);

        let err = engine.request_feature("a3", &news()).await.unwrap_err();
        let progress = err.progress().cloned().unwrap();
        assert!(matches!(err, AdmissionError::StoreUnavailable { step: Step::Admit, .. }));
        assert_eq!(progress.evicted, vec![DocumentId::new("a1")]);
        assert!(progress.is_resumable());
        assert!(!store.inner.get("a3").await.unwrap().featured);

        let res = engine.resume(progress).await.unwrap();
        assert_eq!(res.evicted, vec![DocumentId::new("a1")]);
        assert_eq!(res.featured_at, at(1_000));
        assert_eq!(store.patched(), vec!["a1", "a3"]);
    }

    #[tokio::test]
    async fn test_resume_into_refilled_set_evicts_again() {
        let store = Arc::new(FlakyStore::new());
        full_set(&store.inner).await;
        store.inner.create("a4", "newsItem").await;
        store.on(
            Op::Patch,
            Some("a3"),
            Action::Fail(StoreError::Unavailable {
                reason: "connection reset".into(),
            }),
        );
        let cfg = Config {
            retry: RetryPolicy::Never,
            ..Config::default()
        };
        let (engine, _bus) = engine(store.clone(), cfg);

        let err = engine.request_feature("a3", &news()).await.unwrap_err();
        let progress = err.progress().cloned().unwrap();
        assert!(progress.is_resumable());

        // a4 takes the room a1 left before a3 is resumed.
        let res = engine.request_feature("a4", &news()).await.unwrap();
        assert!(res.evicted.is_empty());
        assert_eq!(store.inner.featured().await.len(), 4);

        let res = engine.resume(progress).await.unwrap();

        assert_eq!(res.evicted, vec![DocumentId::new("a1"), DocumentId::new("b1")]);
        assert_eq!(featured_ids(&store.inner).await, vec!["a2", "b2", "a4", "a3"]);
        assert_eq!(store.patched(), vec!["a1", "a4", "b1", "a3"]);

        let a4 = store.inner.get("a4").await.unwrap().featured_at.unwrap();
        assert!(res.featured_at > a4);
    }

    #[tokio::test]
    async fn test_failed_reread_is_published() {
        let store = Arc::new(FlakyStore::new());
        full_set(&store.inner).await;
        // The planning read goes through; the re-read after admitting fails.
        store.on(Op::Query, None, Action::Pass);
        store.on(
            Op::Query,
            None,
            Action::Fail(StoreError::Unavailable {
                reason: "503".into(),
            }),
        );
        let (engine, bus) = engine(store.clone(), Config::default());
        let mut rx = bus.subscribe();

        let res = engine.request_feature("a3", &news()).await.unwrap();
        assert_eq!(res.evicted, vec![DocumentId::new("a1")]);

        let mut skipped = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::VerifySkipped {
                skipped.push(ev);
            }
        }
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].step, Some(Step::Verify));
        assert_eq!(skipped[0].document.as_deref(), Some("a3"));
        assert!(skipped[0].reason.as_deref().unwrap_or("").contains("503"));
    }

    #[tokio::test]
    async fn test_set_read_failure_has_no_request_context() {
        let store = Arc::new(FlakyStore::new());
        full_set(&store.inner).await;
        store.on(
            Op::Query,
            None,
            Action::Fail(StoreError::Unavailable {
                reason: "503".into(),
            }),
        );
        let (engine, _bus) = engine(store.clone(), Config::default());

        let err = engine.featured(&news()).await.unwrap_err();
        assert_eq!(err.as_label(), "store_unavailable");
        assert_eq!(err.step(), Some(Step::Read));
        assert!(err.progress().is_none());

        assert_eq!(engine.featured(&news()).await.unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out_without_writes() {
        let store = Arc::new(FlakyStore::new());
        full_set(&store.inner).await;
        store.on(Op::Query, None, Action::Delay(Duration::from_secs(30)));
        let cfg = Config {
            store_timeout: Duration::from_millis(100),
            retry: RetryPolicy::Never,
            ..Config::default()
        };
        let (engine, bus) = engine(store.clone(), cfg);
        let mut rx = bus.subscribe();

        let err = engine.request_feature("a3", &news()).await.unwrap_err();

        assert!(matches!(
            err,
            AdmissionError::StoreUnavailable {
                step: Step::Query,
                source: StoreError::Timeout { .. },
                ..
            }
        ));
        assert!(store.patched().is_empty());
        let kinds = kinds(&mut rx);
        assert!(kinds.contains(&EventKind::StoreTimeout));
        assert!(kinds.contains(&EventKind::AdmissionFailed));
    }

    #[tokio::test]
    async fn test_outside_write_trips_invariant() {
        let store = Arc::new(FlakyStore::new());
        full_set(&store.inner).await;
        store.on(
            Op::Patch,
            Some("a3"),
            Action::Put {
                raw_id: "rogue".into(),
                doc_type: "newsItem".into(),
                featured: true,
                featured_at: Some(at(10)),
            },
        );
        let (engine, bus) = engine(store.clone(), Config::default());
        let mut rx = bus.subscribe();

        let err = engine.request_feature("a3", &news()).await.unwrap_err();

        match err {
            AdmissionError::CapacityInvariantViolation {
                observed,
                capacity,
                members,
            } => {
                assert_eq!((observed, capacity), (5, 4));
                assert!(members.contains(&DocumentId::new("rogue")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(kinds(&mut rx).contains(&EventKind::InvariantViolated));
    }

    #[tokio::test]
    async fn test_per_type_scope_keeps_sets_apart() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            &[
                ("a1", "newsItem", Some(1)),
                ("a2", "newsItem", Some(2)),
                ("b1", "videocontent", Some(3)),
                ("b2", "videocontent", Some(4)),
            ],
        )
        .await;
        store.create("a3", "newsItem").await;
        let cfg = Config {
            capacity: 2,
            scope: SetScope::PerType,
            ..Config::default()
        };
        let (engine, _bus) = engine(store.clone(), cfg);

        let res = engine.request_feature("a3", &news()).await.unwrap();

        assert_eq!(res.evicted, vec![DocumentId::new("a1")]);
        assert_eq!(featured_ids(&store).await, vec!["a2", "b1", "b2", "a3"]);
    }

    #[tokio::test]
    async fn test_unfeature_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &[("a1", "newsItem", Some(1)), ("drafts.a1", "newsItem", Some(1))]).await;
        let (engine, _bus) = engine(store.clone(), Config::default());

        assert_eq!(engine.request_unfeature("drafts.a1").await.unwrap(), Ack::Unfeatured);
        assert!(store.featured().await.is_empty());
        assert_eq!(engine.request_unfeature("a1").await.unwrap(), Ack::Unchanged);

        let err = engine.request_unfeature("ghost").await.unwrap_err();
        assert!(matches!(err, AdmissionError::DocumentNotFound { .. }));
    }

    #[tokio::test]
    async fn test_preview_plans_without_writing() {
        let store = Arc::new(FlakyStore::new());
        full_set(&store.inner).await;
        let (engine, _bus) = engine(store.clone(), Config::default());

        let plan = engine.preview("a3", &news()).await.unwrap();

        assert_eq!(plan.evicted_ids(), vec![DocumentId::new("a1")]);
        assert_eq!(plan.resulting_size(), 4);
        assert!(store.patched().is_empty());
    }
}
