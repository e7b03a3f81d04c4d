//! Annotation value types: entities, relations, and output policies.
//!
//! An [`Entity`] links textual evidence to an annotated concept. Its
//! mention may be contiguous (one span) or discontinuous (several
//! non-overlapping spans in ascending order), as produced by corpora
//! with gapped mentions such as "severe [pain] ... in the [abdomen]".
//!
//! A [`Relation`] connects entities and/or other relations through
//! ordered [`RelationMember`]s; member order is semantically meaningful
//! (binary relations distinguish subject and object by position).
//!
//! [`GapPolicy`] and [`OverlapPolicy`] describe how discontinuous or
//! colliding entities are reshaped for output formats that cannot
//! represent them; the policies are applied by
//! [`Sentence::iter_entities`](crate::document::Sentence::iter_entities),
//! never to the stored annotations themselves.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::Error;
use crate::offset::Span;

/// Format-specific attributes attached to units and annotations.
///
/// A plain string-to-string map with deterministic iteration order.
/// Required-key contracts (e.g. `type`, `cui`) are imposed by the
/// individual format adapters, not by the core.
pub type Metadata = BTreeMap<String, String>;

/// Identity of an entity or relation, as defined by the source format.
///
/// Formats use either numeric ids (PubTator, BioC) or string ids
/// (brat's `T1`/`R1`), so both are representable without lossy casts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationId {
    /// Numeric id.
    Num(u64),
    /// String id.
    Str(String),
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationId::Num(n) => write!(f, "{n}"),
            AnnotationId::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for AnnotationId {
    fn from(n: u64) -> Self {
        AnnotationId::Num(n)
    }
}

impl From<&str> for AnnotationId {
    fn from(s: &str) -> Self {
        AnnotationId::Str(s.to_owned())
    }
}

impl From<String> for AnnotationId {
    fn from(s: String) -> Self {
        AnnotationId::Str(s)
    }
}

/// Link from textual evidence to an annotated entity.
///
/// `spans` is non-empty and kept sorted by `(start, end)`; a length of
/// one means a contiguous mention, more than one a discontinuous
/// (gapped) mention. `text` is the exact surface text covered by the
/// spans, including the separator characters standing in for the gaps.
///
/// Entities are attached to exactly one sentence via
/// [`add_entities`](crate::document::Sentence::add_entities) and are
/// never mutated afterward; output policies produce derived copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Format-defined identity.
    pub id: AnnotationId,
    /// The exact text of the mention.
    pub text: String,
    spans: Vec<Span>,
    /// Format-specific attributes (type, concept id, ...).
    pub metadata: Metadata,
}

impl Entity {
    /// Create an entity. Spans are sorted by `(start, end)`.
    pub fn new(
        id: impl Into<AnnotationId>,
        text: impl Into<String>,
        spans: impl IntoIterator<Item = impl Into<Span>>,
    ) -> Self {
        let mut spans: Vec<Span> = spans.into_iter().map(Into::into).collect();
        spans.sort();
        Self {
            id: id.into(),
            text: text.into(),
            spans,
            metadata: Metadata::new(),
        }
    }

    /// Create a contiguous (single-span) entity.
    pub fn contiguous(
        id: impl Into<AnnotationId>,
        text: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Self {
        Self::new(id, text, [Span::new(start, end)])
    }

    /// Attach a metadata entry (builder style).
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The mention's spans, sorted ascending.
    #[must_use]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Offset of the first character.
    #[must_use]
    pub fn start(&self) -> usize {
        self.spans.first().map_or(0, |s| s.start)
    }

    /// Offset past the last character.
    #[must_use]
    pub fn end(&self) -> usize {
        self.spans.last().map_or(0, |s| s.end)
    }

    /// Total length in characters (sum over spans, gaps excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.iter().map(Span::len).sum()
    }

    /// Check whether all spans are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether the mention has more than one span.
    #[must_use]
    pub fn is_discontinuous(&self) -> bool {
        self.spans.len() > 1
    }

    /// Whitespace-normalized text: newlines, tabs etc. become spaces.
    #[must_use]
    pub fn text_wn(&self) -> String {
        self.text
            .chars()
            .map(|c| if c.is_whitespace() { ' ' } else { c })
            .collect()
    }

    /// Sort key: `(start, end)` of the bounding range.
    #[must_use]
    pub fn sort_key(&self) -> (usize, usize) {
        (self.start(), self.end())
    }

    /// Shifted copy of this entity: all spans moved right by `offset`.
    #[must_use]
    pub fn offset_by(mut self, offset: usize) -> Self {
        if offset > 0 {
            for span in &mut self.spans {
                *span = span.offset_by(offset);
            }
        }
        self
    }
}

/// A reference to an entity or relation, with a role label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMember {
    /// Id of the referenced entity or relation.
    pub refid: AnnotationId,
    /// Role label (e.g. "subject", "Theme").
    pub role: String,
}

impl RelationMember {
    /// Create a relation member.
    pub fn new(refid: impl Into<AnnotationId>, role: impl Into<String>) -> Self {
        Self {
            refid: refid.into(),
            role: role.into(),
        }
    }
}

/// Link between multiple entities and/or other relations.
///
/// Anchored at document, section, or sentence level; the members
/// reference their targets by id and never own them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Format-defined identity.
    pub id: AnnotationId,
    members: Vec<RelationMember>,
    /// Format-specific attributes; a `type` entry is commonly used to
    /// decide between binary-relation and generic-event serialization.
    pub metadata: Metadata,
}

impl Relation {
    /// Create a relation from ordered members.
    pub fn new(
        id: impl Into<AnnotationId>,
        members: impl IntoIterator<Item = RelationMember>,
    ) -> Self {
        Self {
            id: id.into(),
            members: members.into_iter().collect(),
            metadata: Metadata::new(),
        }
    }

    /// Attach a metadata entry (builder style).
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Append a member.
    pub fn add_member(&mut self, refid: impl Into<AnnotationId>, role: impl Into<String>) {
        self.members.push(RelationMember::new(refid, role));
    }

    /// The ordered members.
    #[must_use]
    pub fn members(&self) -> &[RelationMember] {
        &self.members
    }

    /// The `type` metadata entry, if present.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.metadata.get("type").map(String::as_str)
    }
}

// ============================================================================
// Output-shaping policies
// ============================================================================

/// How to make a discontinuous entity contiguous for output.
///
/// Contiguous entities pass through unchanged under any policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPolicy {
    /// One single-span entity per original span (identity is
    /// duplicated, contiguity is gained).
    Split,
    /// One span covering the bounding range, gaps swallowed; the text
    /// is recomputed from the sentence text.
    Fill,
    /// Only the first span survives.
    First,
    /// Only the last span survives.
    Last,
}

impl GapPolicy {
    /// Canonical wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GapPolicy::Split => "split",
            GapPolicy::Fill => "fill",
            GapPolicy::First => "first",
            GapPolicy::Last => "last",
        }
    }
}

impl FromStr for GapPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "split" => Ok(GapPolicy::Split),
            "fill" => Ok(GapPolicy::Fill),
            "first" => Ok(GapPolicy::First),
            "last" => Ok(GapPolicy::Last),
            other => Err(Error::unknown_policy("gap", other)),
        }
    }
}

impl fmt::Display for GapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to resolve (partially) co-located entities for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Within each group of chained overlaps, keep the entity covering
    /// the most characters.
    KeepLonger,
    /// Within each group of chained overlaps, keep the entity covering
    /// the fewest characters.
    KeepShorter,
}

impl OverlapPolicy {
    /// Canonical wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlapPolicy::KeepLonger => "keep-longer",
            OverlapPolicy::KeepShorter => "keep-shorter",
        }
    }
}

impl FromStr for OverlapPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "keep-longer" => Ok(OverlapPolicy::KeepLonger),
            "keep-shorter" => Ok(OverlapPolicy::KeepShorter),
            other => Err(Error::unknown_policy("overlap", other)),
        }
    }
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group entities into maximal runs of chain-connected overlap.
///
/// The input must be sorted by `(start, end)`. A single linear sweep
/// keeps a running maximum end offset; an entity belongs to the open
/// group iff its start lies before that maximum. The groups need not be
/// all-pairs overlapping, only reachable through a chain of overlaps.
/// Returns index ranges into the input slice; every entity lands in
/// exactly one group (singleton groups included).
pub fn group_overlapping<E: Borrow<Entity>>(entities: &[E]) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut group_start = 0;
    let mut max_end = 0;
    for (i, entity) in entities.iter().enumerate() {
        let entity = entity.borrow();
        if i > 0 && entity.start() >= max_end {
            groups.push(group_start..i);
            group_start = i;
        }
        max_end = max_end.max(entity.end());
    }
    if !entities.is_empty() {
        groups.push(group_start..entities.len());
    }
    groups
}
