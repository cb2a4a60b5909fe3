//! # Featured-flag transitions.
//!
//! Admission is triggered by the `featured` flag changing on save, never as a
//! side effect of field validation. [`Transition::between`] compares the
//! record before and after a save.
//!
//! ```text
//! before.featured  after.featured   transition
//! false / absent   true             Featured
//! true             false            Unfeatured
//! same             same             none
//! ```

use super::document::FeaturedDoc;

/// Change of the `featured` flag observed on save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// `featured` went false → true; admission must run.
    Featured,
    /// `featured` went true → false; `featuredAt` must be cleared.
    Unfeatured,
}

impl Transition {
    /// Detects the transition between two versions of a record.
    ///
    /// `before = None` means the document was just created.
    pub fn between(before: Option<&FeaturedDoc>, after: &FeaturedDoc) -> Option<Self> {
        let was = before.is_some_and(|d| d.featured);
        match (was, after.featured) {
            (false, true) => Some(Transition::Featured),
            (true, false) => Some(Transition::Unfeatured),
            _ => None,
        }
    }
}
