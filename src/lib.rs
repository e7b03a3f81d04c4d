//! # biodoc
//!
//! Document model for biomedical text annotations.
//!
//! Annotated corpora come in many shapes (BioC, brat standoff,
//! PubTator, CoNLL, PubAnnotation, ...), but they all describe the same
//! thing: text, positions in that text, and labels attached to those
//! positions. This crate is the shared in-memory representation that
//! format adapters build and read:
//!
//! ```text
//! Collection     (optional)
//!   Document
//!     Section
//!       Sentence   <- entities anchor here
//!         Token    (optional, computed lazily)
//! ```
//!
//! The engineering weight sits in three places:
//!
//! - **Offset bookkeeping** ([`offset`]): all positions are character
//!   offsets relative to the document start; byte-based formats (BioC)
//!   are bridged by a streaming [`OffsetConverter`]. Unit text is
//!   reconstructed exactly, including whitespace the tokenizer
//!   discarded, so `text[i..j]` always matches the original input.
//! - **Entity anchoring and validation** ([`document`]): each entity is
//!   assigned to the unique sentence containing its start offset, and
//!   its declared text is validated against the text its spans actually
//!   cover; discontinuous (gapped) mentions are first-class.
//! - **Output shaping** ([`entity`]): formats that cannot represent
//!   gapped or overlapping mentions choose a [`GapPolicy`] /
//!   [`OverlapPolicy`]; the stored annotations are never mutated.
//!
//! ## Quick start
//!
//! ```rust
//! use biodoc::{Document, Entity};
//!
//! let mut doc = Document::new("12345");
//! doc.add_section("title", "Aspirin and ibuprofen.").unwrap();
//! doc.add_entities([Entity::contiguous(1, "Aspirin", 0, 7)], None).unwrap();
//!
//! assert_eq!(doc.text(), "Aspirin and ibuprofen.");
//! let anchored: usize = doc.sentences().map(|s| s.entities().len()).sum();
//! assert_eq!(anchored, 1);
//! ```
//!
//! ## Discontinuous mentions
//!
//! ```rust
//! use biodoc::{AnnotatedUnit, Entity, GapPolicy, Sentence};
//!
//! let mut sent = Sentence::new("aspirin and ibuprofen", 0);
//! sent.add_entities(
//!     [Entity::new(1, "aspirin [...] ibuprofen", [(0, 7), (12, 21)])],
//!     Some(0),
//! )
//! .unwrap();
//!
//! // Formats without gap support split the mention into two
//! // contiguous entities; the stored annotation stays intact.
//! let split: Vec<_> = sent.iter_entities(Some(GapPolicy::Split), None).collect();
//! assert_eq!(split.len(), 2);
//! assert_eq!(split[0].text, "aspirin");
//! assert_eq!(split[1].text, "ibuprofen");
//! ```
//!
//! Construction is single-threaded and append-only; read-only
//! traversal of a finished tree may be shared across threads.

#![warn(missing_docs)]

pub mod cursor;
pub mod document;
pub mod entity;
pub mod error;
pub mod offset;
pub mod tokenize;

pub use cursor::EntityCursor;
pub use document::{
    AnnotatedUnit, Collection, Document, Section, SectionOptions, SectionText, Sentence,
    SentenceSeed, TextUnit, Token,
};
pub use entity::{
    group_overlapping, AnnotationId, Entity, GapPolicy, Metadata, OverlapPolicy, Relation,
    RelationMember,
};
pub use error::{Error, Result};
pub use offset::{OffsetConverter, Span};
pub use tokenize::{default_tokenizer, RuleTokenizer, Segment, Tokenizer};

pub mod prelude {
    //! Commonly used items, re-exported for convenience.

    pub use crate::cursor::EntityCursor;
    pub use crate::document::{
        AnnotatedUnit, Collection, Document, Section, Sentence, TextUnit, Token,
    };
    pub use crate::entity::{AnnotationId, Entity, GapPolicy, OverlapPolicy, Relation};
    pub use crate::error::{Error, Result};
    pub use crate::offset::{OffsetConverter, Span};
    pub use crate::tokenize::{Segment, Tokenizer};
}
