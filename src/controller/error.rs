use thiserror::Error;

use crate::error::AdmissionError;

/// Error returned when a request cannot be handed to the controller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Submission queue is full (try again later or use async `submit`).
    #[error("submission queue full")]
    Full,

    /// Controller channel is closed (controller stopped).
    #[error("controller channel closed")]
    Closed,
}

/// Error returned by [`ControllerHandle`](super::ControllerHandle) requests.
#[derive(Error, Debug, Clone)]
pub enum ControllerError {
    /// The request never reached a slot worker, or its reply was lost.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// The request ran and failed.
    #[error(transparent)]
    Admission(#[from] AdmissionError),
}

impl ControllerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerError::Submit(SubmitError::Full) => "submit_full",
            ControllerError::Submit(SubmitError::Closed) => "submit_closed",
            ControllerError::Admission(e) => e.as_label(),
        }
    }

    /// The admission error, if the request ran.
    pub fn admission(&self) -> Option<&AdmissionError> {
        match self {
            ControllerError::Admission(e) => Some(e),
            ControllerError::Submit(_) => None,
        }
    }
}
