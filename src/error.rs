//! Error types for biodoc.

use thiserror::Error;

/// Result type for biodoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for biodoc operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An entity's declared text does not match the text extracted from
    /// its spans. This signals corrupt or misaligned annotation data and
    /// is always propagated, never silently dropped.
    #[error(
        "entity mention mismatch in document {}: {expected:?} vs. {extracted:?}",
        doc_id.as_deref().unwrap_or("<detached>")
    )]
    MentionMismatch {
        /// Id of the owning document, if the sentence is attached to one.
        doc_id: Option<String>,
        /// The text the entity claims to cover.
        expected: String,
        /// The text actually found at the entity's spans.
        extracted: String,
    },

    /// A relation member references an entity or relation id that does
    /// not exist in the same document.
    #[error("unknown references in relations: {}", ids.join(", "))]
    UnknownReferences {
        /// All unresolved reference ids, deduplicated and sorted.
        ids: Vec<String>,
    },

    /// An unrecognized policy name was passed where a gap- or
    /// overlap-avoidance policy was expected.
    #[error("unknown {kind} policy: {value:?}")]
    UnknownPolicy {
        /// Which policy family was being parsed ("gap" or "overlap").
        kind: &'static str,
        /// The offending input.
        value: String,
    },
}

impl Error {
    /// Create a mention mismatch error.
    pub fn mention_mismatch(
        doc_id: Option<String>,
        expected: impl Into<String>,
        extracted: impl Into<String>,
    ) -> Self {
        Error::MentionMismatch {
            doc_id,
            expected: expected.into(),
            extracted: extracted.into(),
        }
    }

    /// Create an unknown policy error.
    pub fn unknown_policy(kind: &'static str, value: impl Into<String>) -> Self {
        Error::UnknownPolicy {
            kind,
            value: value.into(),
        }
    }
}
