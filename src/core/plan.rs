//! # Admission planning.
//!
//! Pure part of an admission: given the current members of a featured set
//! (excluding the candidate) and the capacity, decide which members leave.
//!
//! ```text
//! members (oldest first):  [m0, m1, m2, m3]      capacity = 4
//! n = 4 >= capacity  →  evict n - capacity + 1 = 1  →  [m0]
//! after admission:         [m1, m2, m3, candidate]
//! ```
//!
//! More than one eviction only happens when the set is already over capacity
//! (capacity lowered, or legacy data written around the controller).

use chrono::{DateTime, Utc};

use crate::documents::{DocumentId, Member};

/// Outcome of planning one admission; no store writes are implied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmissionPlan {
    /// Document being admitted.
    pub candidate: DocumentId,
    /// Capacity the plan was computed for.
    pub capacity: usize,
    members: Vec<Member>,
    evict_count: usize,
}

impl AdmissionPlan {
    /// Plans admission of `candidate` into a set currently holding `members`.
    ///
    /// The candidate's own records are dropped from `members` if present, and
    /// members are re-sorted with [`Member::eviction_order`], so the plan does not
    /// rely on the store's ordering.
    pub fn compute(candidate: DocumentId, mut members: Vec<Member>, capacity: usize) -> Self {
        members.retain(|m| m.id != candidate);
        members.sort_by(Member::eviction_order);

        let n = members.len();
        let evict_count = if n >= capacity {
            (n + 1).saturating_sub(capacity).min(n)
        } else {
            0
        };

        Self {
            candidate,
            capacity,
            members,
            evict_count,
        }
    }

    /// Members that must be un-featured, oldest first.
    pub fn evict(&self) -> &[Member] {
        &self.members[..self.evict_count]
    }

    /// Members that stay featured, oldest first.
    pub fn kept(&self) -> &[Member] {
        &self.members[self.evict_count..]
    }

    /// Canonical ids of the members to evict.
    pub fn evicted_ids(&self) -> Vec<DocumentId> {
        self.evict().iter().map(|m| m.id.clone()).collect()
    }

    /// Newest stamp among the members that stay.
    pub fn newest_kept(&self) -> Option<DateTime<Utc>> {
        self.kept().iter().filter_map(|m| m.featured_at).max()
    }

    /// Size of the set once the plan is applied.
    pub fn resulting_size(&self) -> usize {
        self.kept().len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentType, Member, RecordRef, Revision};
    use chrono::TimeZone;

    fn member(id: &str, doc_type: &str, min: Option<u32>) -> Member {
        Member {
            id: DocumentId::new(id),
            doc_type: DocumentType::new(doc_type),
            featured_at: min.map(|m| Utc.with_ymd_and_hms(2024, 1, 1, 0, m, 0).unwrap()),
            records: vec![RecordRef {
                raw_id: id.to_string(),
                revision: Revision::new("r"),
            }],
        }
    }

    fn ids(ms: &[Member]) -> Vec<&str> {
        ms.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_full_set_evicts_oldest() {
        let members = vec![
            member("d4", "newsItem", Some(4)),
            member("d1", "newsItem", Some(1)),
            member("d3", "newsItem", Some(3)),
            member("d2", "newsItem", Some(2)),
        ];
        let plan = AdmissionPlan::compute(DocumentId::new("d5"), members, 4);
        assert_eq!(ids(plan.evict()), vec!["d1"]);
        assert_eq!(ids(plan.kept()), vec!["d2", "d3", "d4"]);
        assert_eq!(plan.resulting_size(), 4);
    }

    #[test]
    fn test_room_left_evicts_nothing() {
        let members = vec![member("a", "newsItem", Some(1)), member("b", "newsItem", Some(2))];
        let plan = AdmissionPlan::compute(DocumentId::new("c"), members, 4);
        assert!(plan.evict().is_empty());
        assert_eq!(plan.resulting_size(), 3);
    }

    #[test]
    fn test_cross_type_members_compete() {
        let members = vec![
            member("v1", "videocontent", Some(1)),
            member("v2", "videocontent", Some(2)),
            member("v3", "videocontent", Some(3)),
            member("v4", "videocontent", Some(4)),
        ];
        let plan = AdmissionPlan::compute(DocumentId::new("n1"), members, 4);
        assert_eq!(ids(plan.evict()), vec!["v1"]);
    }

    #[test]
    fn test_undated_member_goes_before_dated() {
        let members = vec![
            member("old", "newsItem", Some(0)),
            member("b", "newsItem", Some(5)),
            member("legacy", "videocontent", None),
            member("c", "newsItem", Some(6)),
        ];
        let plan = AdmissionPlan::compute(DocumentId::new("new"), members, 4);
        assert_eq!(ids(plan.evict()), vec!["legacy"]);
    }

    #[test]
    fn test_over_capacity_set_is_trimmed() {
        let members = (1..=6)
            .map(|i| member(&format!("m{i}"), "newsItem", Some(i)))
            .collect();
        let plan = AdmissionPlan::compute(DocumentId::new("x"), members, 4);
        assert_eq!(ids(plan.evict()), vec!["m1", "m2", "m3"]);
        assert_eq!(plan.resulting_size(), 4);
    }

    #[test]
    fn test_candidate_never_counted_against_itself() {
        let members = vec![
            member("a", "newsItem", Some(1)),
            member("b", "newsItem", Some(2)),
            member("c", "newsItem", Some(3)),
            member("self", "newsItem", Some(4)),
        ];
        let plan = AdmissionPlan::compute(DocumentId::new("self"), members, 4);
        assert!(plan.evict().is_empty());
        assert_eq!(plan.newest_kept(), Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 3, 0).unwrap()));
    }

    #[test]
    fn test_capacity_one_replaces_member() {
        let plan = AdmissionPlan::compute(
            DocumentId::new("b"),
            vec![member("a", "newsItem", Some(1))],
            1,
        );
        assert_eq!(ids(plan.evict()), vec!["a"]);
        assert!(plan.kept().is_empty());
    }
}
