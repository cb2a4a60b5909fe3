//! # Featured-set configuration.
//!
//! Provides [`Config`], the one place that defines the featured-set rule for every
//! eligible document type. Call sites never re-embed capacity or type lists.
//!
//! Config can be built in code or deserialized (durations in milliseconds):
//! ```rust
//! use spotlight::{Config, SetScope};
//!
//! let cfg: Config = serde_json::from_str(r#"{
//!     "capacity": 6,
//!     "eligible_types": ["newsItem", "videocontent", "podcast"],
//!     "scope": "per_type",
//!     "store_timeout_ms": 2500
//! }"#).unwrap();
//!
//! assert_eq!(cfg.capacity, 6);
//! assert_eq!(cfg.scope, SetScope::PerType);
//! assert!(cfg.validate().is_ok());
//! ```
//!
//! ## Sentinel values
//! - `store_timeout = 0` → store calls carry no timeout

use std::time::Duration;

use serde::Deserialize;

use crate::core::scope::{SetScope, SlotKey};
use crate::documents::DocumentType;
use crate::error::ConfigError;
use crate::policies::{BackoffPolicy, RetryPolicy};

/// Configuration of the featured-set rule.
///
/// ## Field semantics
/// - `capacity`: maximum members per featured set (`>= 1`)
/// - `eligible_types`: document types that may be featured
/// - `scope`: one set shared by all types, or one set per type
/// - `store_timeout`: deadline applied to every store call (`0s` = none)
/// - `retry`: whether retryable failures are retried inside a request
/// - `backoff`: delay between attempts
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of featured documents in one set.
    pub capacity: usize,

    /// Document types that may join the featured set.
    pub eligible_types: Vec<DocumentType>,

    /// How featured sets are partitioned.
    pub scope: SetScope,

    /// Deadline for each individual store call.
    ///
    /// A call that exceeds it fails the attempt with `StoreUnavailable` and no
    /// further mutation is issued by that attempt.
    #[serde(rename = "store_timeout_ms", with = "duration_ms")]
    pub store_timeout: Duration,

    /// Retry decision for conflicts and unavailable stores.
    pub retry: RetryPolicy,

    /// Delay schedule between attempts.
    pub backoff: BackoffPolicy,
}

impl Config {
    /// Default capacity of a featured set.
    pub const DEFAULT_CAPACITY: usize = 4;

    /// Checks that the rule can be enforced.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.eligible_types.is_empty() {
            return Err(ConfigError::NoEligibleTypes);
        }
        Ok(())
    }

    /// True if `doc_type` may be featured.
    #[inline]
    pub fn is_eligible(&self, doc_type: &DocumentType) -> bool {
        self.eligible_types.contains(doc_type)
    }

    /// Types whose featured documents share a set with `doc_type`.
    pub fn set_types(&self, doc_type: &DocumentType) -> Vec<DocumentType> {
        match self.scope {
            SetScope::Global => self.eligible_types.clone(),
            SetScope::PerType => vec![doc_type.clone()],
        }
    }

    /// Serialization slot for operations on `doc_type`'s featured set.
    ///
    /// `None` (un-feature without a known type) maps to [`SlotKey::Global`].
    pub fn slot_key(&self, doc_type: Option<&DocumentType>) -> SlotKey {
        match (self.scope, doc_type) {
            (SetScope::PerType, Some(t)) => SlotKey::Type(t.clone()),
            _ => SlotKey::Global,
        }
    }

    /// Store timeout as an `Option` (`None` = no timeout).
    #[inline]
    pub fn store_deadline(&self) -> Option<Duration> {
        if self.store_timeout == Duration::ZERO {
            None
        } else {
            Some(self.store_timeout)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `capacity = 4`
    /// - `eligible_types = ["newsItem", "videocontent"]`
    /// - `scope = Global` (one set across both types)
    /// - `store_timeout = 5s`
    /// - `retry = UpTo { attempts: 3 }`
    /// - `backoff = BackoffPolicy::default()`
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            eligible_types: vec![
                DocumentType::new("newsItem"),
                DocumentType::new("videocontent"),
            ],
            scope: SetScope::default(),
            store_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Serde adapter for durations expressed in whole milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(de: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(de).map(Duration::from_millis)
    }
}
