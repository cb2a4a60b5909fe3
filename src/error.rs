//! Error types used by the admission controller and store adapters.
//!
//! This module defines three error enums:
//!
//! - [`StoreError`]: failures reported by a [`DocumentStore`](crate::DocumentStore) adapter.
//! - [`AdmissionError`]: failures of an admission or un-feature operation, wrapping
//!   store errors with the failing [`Step`] and what had already committed.
//! - [`ConfigError`]: rejected configuration.
//!
//! All of them provide `as_label` for logs/metrics; the first two also expose
//! `is_retryable`.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::core::Progress;
use crate::documents::{DocumentId, Revision};

/// # Errors produced by a document store adapter.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The record to patch does not exist.
    #[error("document {id} not found")]
    NotFound {
        /// Raw store id.
        id: String,
    },

    /// The record's revision differs from the expected one.
    #[error("revision conflict on {id}: expected {expected}, found {actual:?}")]
    Conflict {
        /// Raw store id.
        id: String,
        /// Revision the caller read.
        expected: Revision,
        /// Revision the store holds (if known).
        actual: Option<Revision>,
    },

    /// The store could not serve the call (network, rate limit, 5xx...).
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Adapter-provided description.
        reason: String,
    },

    /// The call did not finish within the configured store timeout.
    #[error("store call timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use spotlight::StoreError;
    ///
    /// let err = StoreError::Unavailable { reason: "503".into() };
    /// assert_eq!(err.as_label(), "store_unavailable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "store_not_found",
            StoreError::Conflict { .. } => "store_conflict",
            StoreError::Unavailable { .. } => "store_unavailable",
            StoreError::Timeout { .. } => "store_timeout",
        }
    }

    /// True for transient failures (`Unavailable`, `Timeout`).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::Timeout { .. }
        )
    }
}

/// Sub-step of an operation, reported with every wrapped store error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Resolving the requested document.
    Lookup,
    /// Reading the current featured set.
    Query,
    /// Un-featuring the oldest member(s).
    Evict,
    /// Marking the requested document featured.
    Admit,
    /// Re-reading the set to check the capacity invariant.
    Verify,
    /// Reading a featured set outside any request.
    Read,
    /// Explicit un-feature.
    Unfeature,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Lookup => "lookup",
            Step::Query => "query",
            Step::Evict => "evict",
            Step::Admit => "admit",
            Step::Verify => "verify",
            Step::Read => "read",
            Step::Unfeature => "unfeature",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Errors produced by admission and un-feature operations.
///
/// Store failures keep their kind (`StoreUnavailable` vs `ConcurrentModification`)
/// and carry the [`Progress`] made before the failure, so a caller can tell which
/// evictions already committed and resume only the remaining admit step.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum AdmissionError {
    /// No record exists for the requested identity; nothing was changed.
    #[error("document {id} not found")]
    DocumentNotFound {
        /// Canonical identity that did not resolve.
        id: DocumentId,
    },

    /// A store call failed transiently or timed out.
    #[error("store unavailable during {step}: {source}")]
    StoreUnavailable {
        /// Step that failed.
        step: Step,
        /// What had committed before the failure (`None` for plain reads).
        progress: Option<Progress>,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// A revision check failed: a record changed between read and write.
    #[error("concurrent modification during {step}: {source}")]
    ConcurrentModification {
        /// Step that failed.
        step: Step,
        /// What had committed before the failure (`None` for plain reads).
        progress: Option<Progress>,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// The featured set exceeds its capacity after an admission completed.
    ///
    /// Indicates a writer that bypassed the controller's serialization.
    #[error("featured set holds {observed} members, capacity is {capacity}")]
    CapacityInvariantViolation {
        /// Members observed after admission.
        observed: usize,
        /// Configured capacity.
        capacity: usize,
        /// Identities observed, oldest first.
        members: Vec<DocumentId>,
    },

    /// The request cannot be served as issued (ineligible or mismatched type).
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Human-readable reason.
        reason: String,
    },
}

impl AdmissionError {
    /// Wraps a store error with operation context, keeping its kind.
    pub(crate) fn from_store(step: Step, progress: &Progress, err: StoreError) -> Self {
        if matches!(err, StoreError::NotFound { .. }) && matches!(step, Step::Lookup | Step::Unfeature) {
            return AdmissionError::DocumentNotFound {
                id: progress.id.clone(),
            };
        }
        Self::wrap(step, Some(progress.clone()), err)
    }

    /// Wraps a store error raised by a read that belongs to no request.
    pub(crate) fn from_read(step: Step, err: StoreError) -> Self {
        Self::wrap(step, None, err)
    }

    fn wrap(step: Step, progress: Option<Progress>, err: StoreError) -> Self {
        match err {
            StoreError::Unavailable { .. } | StoreError::Timeout { .. } => {
                AdmissionError::StoreUnavailable {
                    step,
                    progress,
                    source: err,
                }
            }
            // A revision conflict, or a record vanished mid-operation; the next read settles it.
            StoreError::Conflict { .. } | StoreError::NotFound { .. } => {
                AdmissionError::ConcurrentModification {
                    step,
                    progress,
                    source: err,
                }
            }
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use spotlight::{AdmissionError, DocumentId};
    ///
    /// let err = AdmissionError::DocumentNotFound { id: DocumentId::new("n1") };
    /// assert_eq!(err.as_label(), "document_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AdmissionError::DocumentNotFound { .. } => "document_not_found",
            AdmissionError::StoreUnavailable { .. } => "store_unavailable",
            AdmissionError::ConcurrentModification { .. } => "concurrent_modification",
            AdmissionError::CapacityInvariantViolation { .. } => "capacity_invariant_violation",
            AdmissionError::InvalidRequest { .. } => "invalid_request",
        }
    }

    /// Indicates whether retrying the operation may succeed.
    ///
    /// Returns `true` for [`AdmissionError::StoreUnavailable`] (retry with backoff)
    /// and [`AdmissionError::ConcurrentModification`] (retry from the read step).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdmissionError::StoreUnavailable { .. } | AdmissionError::ConcurrentModification { .. }
        )
    }

    /// Step that failed, for store-level failures.
    pub fn step(&self) -> Option<Step> {
        match self {
            AdmissionError::StoreUnavailable { step, .. }
            | AdmissionError::ConcurrentModification { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Progress made before a store-level failure.
    pub fn progress(&self) -> Option<&Progress> {
        match self {
            AdmissionError::StoreUnavailable { progress, .. }
            | AdmissionError::ConcurrentModification { progress, .. } => progress.as_ref(),
            _ => None,
        }
    }
}

/// # Rejected configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A featured set must hold at least one document.
    #[error("capacity must be at least 1")]
    ZeroCapacity,

    /// At least one document type must be eligible.
    #[error("no eligible document types configured")]
    NoEligibleTypes,
}

impl ConfigError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroCapacity => "config_zero_capacity",
            ConfigError::NoEligibleTypes => "config_no_eligible_types",
        }
    }
}
