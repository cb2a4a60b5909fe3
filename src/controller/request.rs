use crate::core::{Ack, Admission, AdmissionPlan, AdmissionResult, Config, Progress, SlotKey};
use crate::documents::DocumentType;
use crate::error::AdmissionError;

/// Request to submit to the controller.
///
/// Each request runs on the slot worker of the featured set it touches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Feature a document, evicting the oldest member if the set is full.
    Feature {
        /// Raw id (draft or published).
        id: String,
        /// Requested document type.
        doc_type: DocumentType,
    },

    /// Un-feature every record of a document.
    Unfeature {
        /// Raw id (draft or published).
        id: String,
        /// Type, if known; routes the request to its per-type slot.
        doc_type: Option<DocumentType>,
    },

    /// Plan an admission without writing.
    Preview {
        /// Raw id (draft or published).
        id: String,
        /// Requested document type.
        doc_type: DocumentType,
    },

    /// Finish a request whose admit step failed after its evictions committed.
    Resume {
        /// Progress carried by the failed request's error.
        progress: Progress,
    },
}

impl Request {
    #[inline]
    pub fn feature(id: impl Into<String>, doc_type: impl Into<DocumentType>) -> Self {
        Request::Feature {
            id: id.into(),
            doc_type: doc_type.into(),
        }
    }

    #[inline]
    pub fn unfeature(id: impl Into<String>) -> Self {
        Request::Unfeature {
            id: id.into(),
            doc_type: None,
        }
    }

    #[inline]
    pub fn preview(id: impl Into<String>, doc_type: impl Into<DocumentType>) -> Self {
        Request::Preview {
            id: id.into(),
            doc_type: doc_type.into(),
        }
    }

    #[inline]
    pub fn resume(progress: Progress) -> Self {
        Request::Resume { progress }
    }

    /// Document type the request is about, if known.
    pub fn doc_type(&self) -> Option<&DocumentType> {
        match self {
            Request::Feature { doc_type, .. } | Request::Preview { doc_type, .. } => Some(doc_type),
            Request::Unfeature { doc_type, .. } => doc_type.as_ref(),
            Request::Resume { progress } => progress.doc_type.as_ref(),
        }
    }

    /// Slot that serializes this request.
    ///
    /// Un-features without a type go to the global slot; un-featuring only
    /// shrinks a set, so it never needs the per-type slot to stay within capacity.
    pub fn slot(&self, cfg: &Config) -> SlotKey {
        cfg.slot_key(self.doc_type())
    }

    pub(super) async fn run(self, engine: &Admission) -> Result<Outcome, AdmissionError> {
        match self {
            Request::Feature { id, doc_type } => engine
                .request_feature(&id, &doc_type)
                .await
                .map(Outcome::Admitted),
            Request::Unfeature { id, .. } => {
                engine.request_unfeature(&id).await.map(Outcome::Unfeatured)
            }
            Request::Preview { id, doc_type } => {
                engine.preview(&id, &doc_type).await.map(Outcome::Planned)
            }
            Request::Resume { progress } => engine.resume(progress).await.map(Outcome::Admitted),
        }
    }
}

/// Successful result of a [`Request`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// `Feature` or `Resume` admitted the document.
    Admitted(AdmissionResult),
    /// `Unfeature` finished.
    Unfeatured(Ack),
    /// `Preview` planned the admission.
    Planned(AdmissionPlan),
}

impl Outcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Admitted(_) => "admitted",
            Outcome::Unfeatured(_) => "unfeatured",
            Outcome::Planned(_) => "planned",
        }
    }
}
