//! The text-unit tree: Collection, Document, Section, Sentence, Token.
//!
//! Structural units form a hierarchy:
//!
//! ```text
//! Collection     (optional)
//!   Document
//!     Section
//!       Sentence
//!         Token  (optional)
//! ```
//!
//! Entities are anchored at the sentence level; relations can be
//! anchored at the document, section, or sentence level. Every level is
//! its own struct with an explicit child container, unified by the
//! [`TextUnit`] and [`AnnotatedUnit`] capability traits; there is no
//! shared base-class state.
//!
//! Offsets are characters relative to the document start and are
//! assigned monotonically as sections are appended (unless explicit
//! offsets are supplied). The text of any unit can be reconstructed
//! exactly, including whitespace the tokenizer discarded: separator
//! gaps are re-synthesized from the offsets, as spaces between
//! sentences and newlines between sections. This is the load-bearing
//! property for round-tripping annotations between formats.
//!
//! Construction is append-only (`add_section`, `add_sentence`,
//! `add_entities`, `add_document`); units are read thereafter. The tree
//! has no internal locking: writers must be serialized by the caller,
//! while purely read-only traversal may be shared.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::entity::{
    group_overlapping, AnnotationId, Entity, GapPolicy, Metadata, OverlapPolicy, Relation,
};
use crate::error::{Error, Result};
use crate::offset::{char_len, char_slice, Span};
use crate::tokenize::{default_tokenizer, Segment, Tokenizer};

use serde::{Deserialize, Serialize};

/// Characters accepted as gap fillers inside a discontinuous mention's
/// text, e.g. `"aspirin [...] ibuprofen"`.
const MENTION_SEPARATORS: &[char] = &[' ', '.', '[', ']', '\u{2026}'];

/// Shared read surface over all non-leaf tree levels.
pub trait TextUnit {
    /// Format-specific attributes of this unit.
    fn metadata(&self) -> &Metadata;

    /// The unit's plain text as a fragment stream: child texts
    /// interleaved with separator whitespace synthesized from offset
    /// gaps. Concatenating the fragments yields the unit's text with
    /// all original character positions intact.
    fn fragments(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_>;

    /// The unit's plain text (fragments, concatenated).
    fn to_text(&self) -> String {
        self.fragments().collect()
    }
}

/// Annotation access for sentences and everything above them.
pub trait AnnotatedUnit {
    /// Iterate over all entities, sorted by offset within each
    /// sentence.
    ///
    /// `gaps` reshapes discontinuous entities into contiguous ones
    /// (splitting, filling, or pruning); `overlaps` suppresses
    /// colliding entities, keeping only the longest or shortest per
    /// overlap group. Untouched entities are borrowed; reshaped ones
    /// are derived copies, so the stored annotations never change.
    fn iter_entities(
        &self,
        gaps: Option<GapPolicy>,
        overlaps: Option<OverlapPolicy>,
    ) -> Box<dyn Iterator<Item = Cow<'_, Entity>> + '_>;

    /// Iterate over all relations from this unit and below, own
    /// relations first.
    fn iter_relations(&self) -> Box<dyn Iterator<Item = &Relation> + '_>;
}

// ============================================================================
// Token
// ============================================================================

/// A word token. The leaf level of the tree; holds no annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The token's text.
    pub text: String,
    /// Start offset in characters.
    pub start: usize,
    /// End offset in characters (exclusive).
    pub end: usize,
}

impl From<Segment> for Token {
    fn from(seg: Segment) -> Self {
        Self {
            text: seg.text,
            start: seg.start,
            end: seg.end,
        }
    }
}

// ============================================================================
// Sentence
// ============================================================================

/// The central annotation unit: the authoritative text for a span of
/// the document, plus entities and lazily computed tokens.
#[derive(Debug, Clone)]
pub struct Sentence {
    text: String,
    start: usize,
    end: usize,
    tokens: Vec<Token>,
    entities: Vec<Entity>,
    /// Relations anchored at this sentence.
    pub relations: Vec<Relation>,
    /// Format-specific attributes.
    pub metadata: Metadata,
    section_type: Option<String>,
    document_id: Option<String>,
}

impl Sentence {
    /// Create a detached sentence; the end offset is derived from the
    /// text's character length.
    pub fn new(text: impl Into<String>, start: usize) -> Self {
        let text = text.into();
        let end = start + char_len(&text);
        Self::with_end(text, start, end)
    }

    /// Create a detached sentence with an explicit end offset.
    pub fn with_end(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            tokens: Vec::new(),
            entities: Vec::new(),
            relations: Vec::new(),
            metadata: Metadata::new(),
            section_type: None,
            document_id: None,
        }
    }

    /// The sentence text (may include trailing whitespace up to the
    /// next sentence's start).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Start offset in characters, relative to the document start.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset in characters (exclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The entities anchored at this sentence, sorted by offset.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// The `type` of the owning section, or `None` for a detached
    /// sentence.
    #[must_use]
    pub fn section_type(&self) -> Option<&str> {
        self.section_type.as_deref()
    }

    /// The `type` of the owning section, or `default` for a detached
    /// sentence.
    #[must_use]
    pub fn section_type_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.section_type.as_deref().unwrap_or(default)
    }

    /// Id of the owning document, if attached through one.
    #[must_use]
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub(crate) fn attach(&mut self, section_type: Option<&str>, document_id: Option<&str>) {
        self.section_type = section_type.map(str::to_owned);
        self.document_id = document_id.map(str::to_owned);
    }

    /// Anchor entities at this sentence.
    ///
    /// Spans are shifted by `offset` first (default: the sentence's own
    /// start, for spans given sentence-locally). Each entity's text is
    /// validated against the text extracted from its spans: a single
    /// span must match exactly; a discontinuous mention must contain
    /// every extracted piece in order, joined only by the separator
    /// characters commonly standing in for gaps (space, `.`, `[`, `]`,
    /// ellipsis). A mismatch fails with
    /// [`Error::MentionMismatch`] and leaves earlier entities of the
    /// batch in place.
    ///
    /// The stored list stays sorted by `(start, end)`: when entities
    /// already existed before the call, the combined list is re-sorted;
    /// the first batch is expected in sorted order (anchoring from
    /// [`Document::add_entities`] guarantees this).
    pub fn add_entities(
        &mut self,
        entities: impl IntoIterator<Item = Entity>,
        offset: Option<usize>,
    ) -> Result<()> {
        let offset = offset.unwrap_or(self.start);
        let prev_len = self.entities.len();
        for entity in entities {
            let entity = entity.offset_by(offset);
            self.validate_mention(&entity)?;
            self.entities.push(entity);
        }
        if prev_len > 0 && self.entities.len() > prev_len {
            self.entities.sort_by_key(Entity::sort_key);
        }
        Ok(())
    }

    fn validate_mention(&self, entity: &Entity) -> Result<()> {
        let extracted: Vec<&str> = entity
            .spans()
            .iter()
            .map(|s| self.snip(*s))
            .collect();
        let mismatch = || {
            let found = if extracted.len() == 1 {
                extracted[0].to_owned()
            } else {
                format!("{extracted:?}")
            };
            Error::mention_mismatch(self.document_id.clone(), &entity.text, found)
        };

        // A contiguous annotation must match exactly.
        if let [single] = extracted[..] {
            if single == entity.text {
                return Ok(());
            }
            return Err(mismatch());
        }

        // For discontinuous annotations, every extracted piece must
        // occur in the text attribute, in order, with nothing but
        // separator symbols in between.
        let mut rest = entity.text.as_str();
        for piece in &extracted {
            let pos = match rest.find(*piece) {
                Some(pos) => pos,
                None => return Err(mismatch()),
            };
            if !rest[..pos].trim_matches(MENTION_SEPARATORS).is_empty() {
                return Err(mismatch());
            }
            rest = &rest[pos + piece.len()..];
        }
        if !rest.trim_matches(MENTION_SEPARATORS).is_empty() {
            return Err(mismatch());
        }
        Ok(())
    }

    /// Extract the sentence-local text under a document-level span.
    fn snip(&self, span: Span) -> &str {
        char_slice(
            &self.text,
            span.start.saturating_sub(self.start),
            span.end.saturating_sub(self.start),
        )
    }

    /// Word-tokenize this sentence, caching the result; repeated calls
    /// are no-ops once tokens exist.
    pub fn tokens(&mut self, tokenizer: &dyn Tokenizer) -> &[Token] {
        if !self.text.is_empty() && self.tokens.is_empty() {
            self.tokens = tokenizer
                .tokenize_words(&self.text, self.start)
                .into_iter()
                .map(Token::from)
                .collect();
        }
        &self.tokens
    }

    /// Recompute the token list unconditionally.
    pub fn retokenize(&mut self, tokenizer: &dyn Tokenizer) -> &[Token] {
        self.tokens.clear();
        self.tokens(tokenizer)
    }

    /// Set tokens directly from pre-computed triples. No validation of
    /// offset ranges or substrings takes place.
    pub fn set_tokens(&mut self, tokens: impl IntoIterator<Item = Token>) {
        self.tokens = tokens.into_iter().collect();
    }

    /// The cached token list, or `None` if the sentence has not been
    /// tokenized yet.
    #[must_use]
    pub fn tokens_cached(&self) -> Option<&[Token]> {
        if self.tokens.is_empty() {
            None
        } else {
            Some(&self.tokens)
        }
    }

    /// Entity list after applying the output-shaping policies; see
    /// [`AnnotatedUnit::iter_entities`].
    fn shaped_entities(
        &self,
        gaps: Option<GapPolicy>,
        overlaps: Option<OverlapPolicy>,
    ) -> Vec<Cow<'_, Entity>> {
        let mut shaped: Vec<Cow<'_, Entity>> = self.entities.iter().map(Cow::Borrowed).collect();
        if let Some(policy) = gaps {
            shaped = self.degap(shaped, policy);
            shaped.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        }
        if let Some(policy) = overlaps {
            shaped = deoverlap(shaped, policy);
            shaped.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        }
        shaped
    }

    fn degap<'e>(
        &'e self,
        entities: Vec<Cow<'e, Entity>>,
        policy: GapPolicy,
    ) -> Vec<Cow<'e, Entity>> {
        let mut out = Vec::with_capacity(entities.len());
        for entity in entities {
            if !entity.is_discontinuous() {
                // Contiguous entity, pass the original through.
                out.push(entity);
                continue;
            }
            let spans = entity.spans();
            let unified: Vec<Span> = match policy {
                GapPolicy::Split => spans.to_vec(),
                GapPolicy::Fill => vec![Span::new(entity.start(), entity.end())],
                GapPolicy::First => vec![spans[0]],
                GapPolicy::Last => vec![spans[spans.len() - 1]],
            };
            for span in unified {
                let mut derived = Entity::new(entity.id.clone(), self.snip(span), [span]);
                derived.metadata = entity.metadata.clone();
                out.push(Cow::Owned(derived));
            }
        }
        out
    }
}

/// Keep one entity per overlap group: the longest or shortest by total
/// covered length. Exact ties go to the entity sorting last in the
/// group (latest `(start, end)`).
fn deoverlap<'e>(entities: Vec<Cow<'e, Entity>>, policy: OverlapPolicy) -> Vec<Cow<'e, Entity>> {
    let groups = group_overlapping(&entities);
    let mut keep = Vec::with_capacity(groups.len());
    for range in groups {
        let mut best = range.start;
        for i in range.start + 1..range.end {
            let better = match policy {
                OverlapPolicy::KeepLonger => entities[i].len() >= entities[best].len(),
                OverlapPolicy::KeepShorter => entities[i].len() <= entities[best].len(),
            };
            if better {
                best = i;
            }
        }
        keep.push(best);
    }
    let mut keep = keep.into_iter().peekable();
    entities
        .into_iter()
        .enumerate()
        .filter_map(|(i, entity)| {
            if keep.peek() == Some(&i) {
                keep.next();
                Some(entity)
            } else {
                None
            }
        })
        .collect()
}

impl TextUnit for Sentence {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn fragments(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        Box::new(std::iter::once(Cow::Borrowed(self.text.as_str())))
    }
}

impl AnnotatedUnit for Sentence {
    fn iter_entities(
        &self,
        gaps: Option<GapPolicy>,
        overlaps: Option<OverlapPolicy>,
    ) -> Box<dyn Iterator<Item = Cow<'_, Entity>> + '_> {
        Box::new(self.shaped_entities(gaps, overlaps).into_iter())
    }

    fn iter_relations(&self) -> Box<dyn Iterator<Item = &Relation> + '_> {
        Box::new(self.relations.iter())
    }
}

// ============================================================================
// Section
// ============================================================================

/// Text content for a new section.
#[derive(Debug, Clone)]
pub enum SectionText {
    /// A single string, to be sentence-split by the tokenizer.
    Whole(String),
    /// Pre-split sentences; offsets are inferred by cumulative length
    /// where absent.
    Sentences(Vec<SentenceSeed>),
}

/// One pre-split sentence for [`SectionText::Sentences`].
#[derive(Debug, Clone)]
pub struct SentenceSeed {
    /// The sentence text.
    pub text: String,
    /// Explicit start offset; inferred from the previous sentence's
    /// end when absent.
    pub start: Option<usize>,
    /// Explicit end offset; `start + char_len(text)` when absent.
    pub end: Option<usize>,
}

impl SentenceSeed {
    /// A seed with offsets to be inferred.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: None,
            end: None,
        }
    }

    /// A seed with an explicit start offset.
    pub fn at(text: impl Into<String>, start: usize) -> Self {
        Self {
            text: text.into(),
            start: Some(start),
            end: None,
        }
    }

    /// A seed with explicit start and end offsets.
    pub fn spanned(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start: Some(start),
            end: Some(end),
        }
    }
}

impl From<&str> for SectionText {
    fn from(text: &str) -> Self {
        SectionText::Whole(text.to_owned())
    }
}

impl From<String> for SectionText {
    fn from(text: String) -> Self {
        SectionText::Whole(text)
    }
}

impl From<Vec<SentenceSeed>> for SectionText {
    fn from(seeds: Vec<SentenceSeed>) -> Self {
        SectionText::Sentences(seeds)
    }
}

impl From<Vec<&str>> for SectionText {
    fn from(sentences: Vec<&str>) -> Self {
        SectionText::Sentences(sentences.into_iter().map(SentenceSeed::new).collect())
    }
}

impl From<Vec<(&str, usize, usize)>> for SectionText {
    fn from(sentences: Vec<(&str, usize, usize)>) -> Self {
        SectionText::Sentences(
            sentences
                .into_iter()
                .map(|(text, start, end)| SentenceSeed::spanned(text, start, end))
                .collect(),
        )
    }
}

/// Any unit of text between document and sentence level (title,
/// abstract, paragraph, ...). The `type` metadata entry carries the
/// section kind.
#[derive(Debug, Clone)]
pub struct Section {
    sentences: Vec<Sentence>,
    start: usize,
    end: usize,
    /// Relations anchored at this section.
    pub relations: Vec<Relation>,
    /// Format-specific attributes; `type` is the section kind.
    pub metadata: Metadata,
    source_text: Option<String>,
    document_id: Option<String>,
}

impl Section {
    /// Create an empty section at `start`; sentences are appended with
    /// [`add_sentence`](Self::add_sentence).
    pub fn new(kind: impl Into<String>, start: usize) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("type".to_owned(), kind.into());
        Self {
            sentences: Vec::new(),
            start,
            end: start,
            relations: Vec::new(),
            metadata,
            source_text: None,
            document_id: None,
        }
    }

    pub(crate) fn build(
        kind: &str,
        content: SectionText,
        start: usize,
        entities: Vec<Entity>,
        tokenizer: &dyn Tokenizer,
        document_id: Option<String>,
    ) -> Result<Self> {
        let mut section = Section::new(kind, start);
        section.document_id = document_id;
        match content {
            SectionText::Whole(text) => {
                let segments = tokenizer.split_sentences(&text, start);
                let segments = merge_at_entities(segments, &entities);
                section.source_text = Some(text);
                section.extend_sentences(segments);
            }
            SectionText::Sentences(seeds) => {
                let mut cursor = start;
                let segments: Vec<Segment> = seeds
                    .into_iter()
                    .map(|seed| {
                        let s = seed.start.unwrap_or(cursor);
                        let e = seed.end.unwrap_or_else(|| s + char_len(&seed.text));
                        cursor = e;
                        Segment::new(seed.text, s, e)
                    })
                    .collect();
                section.extend_sentences(segments);
            }
        }
        if !entities.is_empty() {
            // Spans were already adjusted to document coordinates.
            section.add_entities(entities, Some(0))?;
        }
        Ok(section)
    }

    fn extend_sentences(&mut self, segments: Vec<Segment>) {
        let kind = self.metadata.get("type").cloned();
        for segment in segments {
            let mut sentence = Sentence::with_end(segment.text, segment.start, segment.end);
            sentence.attach(kind.as_deref(), self.document_id.as_deref());
            self.sentences.push(sentence);
        }
        if let (Some(first), Some(last)) = (self.sentences.first(), self.sentences.last()) {
            self.start = first.start();
            self.end = last.end();
        }
    }

    /// The section kind (the `type` metadata entry).
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.metadata.get("type").map(String::as_str)
    }

    /// Start offset in characters.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset in characters (exclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The section's sentences, in document order.
    #[must_use]
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Mutable access to the sentences, for adapters that attach
    /// tokens or relations after construction.
    pub fn sentences_mut(&mut self) -> &mut [Sentence] {
        &mut self.sentences
    }

    /// Append a single sentence. `offset` defaults to the section end;
    /// the cached source text is invalidated.
    pub fn add_sentence(&mut self, text: impl Into<String>, offset: Option<usize>) -> &mut Sentence {
        let offset = offset.unwrap_or(self.end);
        let text = text.into();
        let end = offset + char_len(&text);
        self.extend_sentences(vec![Segment::new(text, offset, end)]);
        self.source_text = None;
        let idx = self.sentences.len() - 1;
        &mut self.sentences[idx]
    }

    /// Anchor entities to the right sentences of this section.
    ///
    /// Spans are shifted by `offset` first (default: the section's own
    /// start). Entities are sorted by `(start, end)` and assigned with
    /// a single forward pass over the sentences; entities starting
    /// beyond the last sentence are dropped with a warning.
    pub fn add_entities(
        &mut self,
        entities: impl IntoIterator<Item = Entity>,
        offset: Option<usize>,
    ) -> Result<()> {
        let offset = offset.unwrap_or(self.start);
        let mut entities: Vec<Entity> =
            entities.into_iter().map(|e| e.offset_by(offset)).collect();
        if entities.is_empty() {
            return Ok(());
        }
        entities.sort_by_key(Entity::sort_key);
        anchor_entities(self.sentences.iter_mut(), entities)
    }

    /// The section's plain text: the original source string when the
    /// section was built from one, otherwise reassembled from the
    /// sentences and their offset gaps.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match &self.source_text {
            Some(text) => Cow::Borrowed(text.as_str()),
            None => Cow::Owned(self.fragments().collect()),
        }
    }
}

impl TextUnit for Section {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn fragments(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        let mut parts: Vec<Cow<'_, str>> = Vec::new();
        let mut offset = self.start;
        for sentence in &self.sentences {
            if offset < sentence.start() {
                // Space that was removed in sentence splitting.
                parts.push(Cow::Owned(" ".repeat(sentence.start() - offset)));
            }
            parts.push(Cow::Borrowed(sentence.text()));
            offset = sentence.end();
        }
        if offset < self.end {
            parts.push(Cow::Owned(" ".repeat(self.end - offset)));
        }
        Box::new(parts.into_iter())
    }
}

impl AnnotatedUnit for Section {
    fn iter_entities(
        &self,
        gaps: Option<GapPolicy>,
        overlaps: Option<OverlapPolicy>,
    ) -> Box<dyn Iterator<Item = Cow<'_, Entity>> + '_> {
        Box::new(
            self.sentences
                .iter()
                .flat_map(move |s| s.shaped_entities(gaps, overlaps)),
        )
    }

    fn iter_relations(&self) -> Box<dyn Iterator<Item = &Relation> + '_> {
        Box::new(
            self.relations
                .iter()
                .chain(self.sentences.iter().flat_map(|s| s.relations.iter())),
        )
    }
}

/// Suppress sentence boundaries that fall strictly inside an entity's
/// bounding range by merging the two candidate sentences.
fn merge_at_entities(segments: Vec<Segment>, entities: &[Entity]) -> Vec<Segment> {
    if entities.is_empty() || segments.is_empty() {
        return segments;
    }
    let ranges: Vec<(usize, usize)> = entities.iter().map(|e| (e.start(), e.end())).collect();
    let forbidden = |pos: usize| ranges.iter().any(|&(start, end)| pos > start && pos < end);

    let mut merged = Vec::with_capacity(segments.len());
    let mut iter = segments.into_iter();
    let mut pending = match iter.next() {
        Some(first) => first,
        None => return Vec::new(),
    };
    for segment in iter {
        if forbidden(segment.start) {
            pending.text.push_str(&segment.text);
            pending.end = segment.end;
        } else {
            merged.push(std::mem::replace(&mut pending, segment));
        }
    }
    merged.push(pending);
    merged
}

/// Assign each entity to the first sentence whose end lies beyond the
/// entity's start, walking entities and sentences in lockstep. When the
/// sentences run out, the remaining entities are dropped under a single
/// warning: partial annotation loss is preferable to aborting the
/// document load.
fn anchor_entities<'a, I>(mut sentences: I, entities: Vec<Entity>) -> Result<()>
where
    I: Iterator<Item = &'a mut Sentence>,
{
    let mut current = match sentences.next() {
        Some(sentence) => sentence,
        None => {
            log::warn!("annotations outside character range");
            return Ok(());
        }
    };
    for entity in entities {
        while entity.start() >= current.end() {
            current = match sentences.next() {
                Some(sentence) => sentence,
                None => {
                    log::warn!("annotations outside character range");
                    return Ok(());
                }
            };
        }
        current.add_entities(std::iter::once(entity), Some(0))?;
    }
    Ok(())
}

// ============================================================================
// Document
// ============================================================================

/// Per-section options for [`Document::add_section_with`].
#[derive(Default)]
pub struct SectionOptions<'a> {
    /// Explicit section start; defaults to the document's offset
    /// cursor (the end of the last section, 0 for the first).
    pub offset: Option<usize>,
    /// Entities to anchor into the new section.
    pub entities: Vec<Entity>,
    /// Offset adjustment for the entity spans; defaults to the section
    /// offset.
    pub entity_offset: Option<usize>,
    /// Sentence splitter; defaults to
    /// [`default_tokenizer`](crate::tokenize::default_tokenizer).
    pub tokenizer: Option<&'a dyn Tokenizer>,
}

/// A document with text, metadata and annotations.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document identity (e.g. a PMID), used for output naming and
    /// cross-referencing.
    pub id: String,
    /// Source filename, if the document was read from one.
    pub filename: Option<String>,
    sections: Vec<Section>,
    /// Relations anchored at document level.
    pub relations: Vec<Relation>,
    /// Format-specific attributes.
    pub metadata: Metadata,
}

impl Document {
    /// Create an empty document.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: None,
            sections: Vec::new(),
            relations: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Set the source filename (builder style).
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// The document's sections, in order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Mutable access to the sections, for adapters that fill in
    /// sentences or annotations after the section skeleton exists.
    pub fn sections_mut(&mut self) -> &mut [Section] {
        &mut self.sections
    }

    /// All sentences of the document, in document order.
    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> + '_ {
        self.sections.iter().flat_map(|s| s.sentences().iter())
    }

    /// The document's offset cursor: the end of the last section.
    #[must_use]
    pub fn end(&self) -> usize {
        self.sections.last().map_or(0, Section::end)
    }

    /// Append a section, sentence-splitting with the default tokenizer
    /// at the current offset cursor.
    pub fn add_section(
        &mut self,
        kind: &str,
        text: impl Into<SectionText>,
    ) -> Result<&mut Section> {
        self.add_section_with(kind, text, SectionOptions::default())
    }

    /// Append a section with explicit options.
    ///
    /// Before sentence splitting, candidate boundaries that would fall
    /// strictly inside a supplied entity span are suppressed, so that
    /// no annotation is split across sentences. The entities are then
    /// anchored into the new section; a text mismatch fails the whole
    /// call.
    pub fn add_section_with(
        &mut self,
        kind: &str,
        text: impl Into<SectionText>,
        opts: SectionOptions<'_>,
    ) -> Result<&mut Section> {
        let offset = opts.offset.unwrap_or_else(|| self.end());
        let entity_offset = opts.entity_offset.unwrap_or(offset);
        let entities: Vec<Entity> = opts
            .entities
            .into_iter()
            .map(|e| e.offset_by(entity_offset))
            .collect();
        let tokenizer = opts.tokenizer.unwrap_or(default_tokenizer() as &dyn Tokenizer);
        let section = Section::build(
            kind,
            text.into(),
            offset,
            entities,
            tokenizer,
            Some(self.id.clone()),
        )?;
        let idx = self.sections.len();
        self.sections.push(section);
        Ok(&mut self.sections[idx])
    }

    /// Anchor entities to the right sentences anywhere in the
    /// document. Spans are document-relative (`offset` defaults to 0).
    ///
    /// Complexity: O(n log n + m) for n entities and m sentences; the
    /// sentences are walked once. Entities starting beyond the last
    /// sentence are dropped with a warning, not an error.
    pub fn add_entities(
        &mut self,
        entities: impl IntoIterator<Item = Entity>,
        offset: Option<usize>,
    ) -> Result<()> {
        let offset = offset.unwrap_or(0);
        let mut entities: Vec<Entity> =
            entities.into_iter().map(|e| e.offset_by(offset)).collect();
        if entities.is_empty() {
            return Ok(());
        }
        entities.sort_by_key(Entity::sort_key);
        anchor_entities(
            self.sections.iter_mut().flat_map(|s| s.sentences_mut().iter_mut()),
            entities,
        )
    }

    /// Verify that every relation member's refid resolves to a known
    /// entity or relation id within this document.
    ///
    /// Never called automatically; format adapters opt in and decide
    /// whether a failure aborts the document.
    pub fn sanitize_relations(&self) -> Result<()> {
        let mut ids: HashSet<&AnnotationId> = self.iter_relations().map(|r| &r.id).collect();
        if ids.is_empty() {
            return Ok(());
        }
        ids.extend(self.sentences().flat_map(|s| s.entities().iter().map(|e| &e.id)));
        let unresolved: BTreeSet<String> = self
            .iter_relations()
            .flat_map(Relation::members)
            .filter(|member| !ids.contains(&member.refid))
            .map(|member| member.refid.to_string())
            .collect();
        if unresolved.is_empty() {
            Ok(())
        } else {
            Err(Error::UnknownReferences {
                ids: unresolved.into_iter().collect(),
            })
        }
    }

    /// The document's plain text, reassembled exactly: newline runs
    /// are synthesized for the offset gaps between sections.
    #[must_use]
    pub fn text(&self) -> String {
        self.to_text()
    }
}

impl TextUnit for Document {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn fragments(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        let mut parts: Vec<Cow<'_, str>> = Vec::new();
        let mut offset = 0;
        for section in &self.sections {
            if offset < section.start() {
                // Space that was removed between sections.
                parts.push(Cow::Owned("\n".repeat(section.start() - offset)));
            }
            parts.extend(section.fragments());
            offset = section.end();
        }
        Box::new(parts.into_iter())
    }
}

impl AnnotatedUnit for Document {
    fn iter_entities(
        &self,
        gaps: Option<GapPolicy>,
        overlaps: Option<OverlapPolicy>,
    ) -> Box<dyn Iterator<Item = Cow<'_, Entity>> + '_> {
        Box::new(
            self.sentences()
                .flat_map(move |s| s.shaped_entities(gaps, overlaps)),
        )
    }

    fn iter_relations(&self) -> Box<dyn Iterator<Item = &Relation> + '_> {
        Box::new(
            self.relations
                .iter()
                .chain(self.sections.iter().flat_map(|sec| {
                    sec.relations
                        .iter()
                        .chain(sec.sentences().iter().flat_map(|s| s.relations.iter()))
                })),
        )
    }
}

// ============================================================================
// Collection
// ============================================================================

/// A collection of multiple documents.
#[derive(Debug, Clone)]
pub struct Collection {
    /// Collection identity, used for output naming.
    pub id: String,
    /// Source filename, if the collection was read from one.
    pub filename: Option<String>,
    documents: Vec<Document>,
    /// Format-specific attributes.
    pub metadata: Metadata,
    by_id: HashMap<String, usize>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: None,
            documents: Vec::new(),
            metadata: Metadata::new(),
            by_id: HashMap::new(),
        }
    }

    /// Set the source filename (builder style).
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Construct a collection from an iterable of documents.
    pub fn from_documents(
        id: impl Into<String>,
        documents: impl IntoIterator<Item = Document>,
    ) -> Self {
        let mut collection = Collection::new(id);
        for document in documents {
            collection.add_document(document);
        }
        collection
    }

    /// Append a document and index it by id.
    pub fn add_document(&mut self, document: Document) -> &mut Document {
        let idx = self.documents.len();
        self.by_id.insert(document.id.clone(), idx);
        self.documents.push(document);
        &mut self.documents[idx]
    }

    /// Access a document by its id.
    #[must_use]
    pub fn get_document(&self, id: &str) -> Option<&Document> {
        self.by_id.get(id).map(|&idx| &self.documents[idx])
    }

    /// The member documents, in insertion order.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// All sections across all documents, in order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> + '_ {
        self.documents.iter().flat_map(|d| d.sections().iter())
    }

    /// All sentences across all documents, in order.
    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> + '_ {
        self.documents.iter().flat_map(Document::sentences)
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the collection holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Concatenated text of the member documents.
    #[must_use]
    pub fn text(&self) -> String {
        self.to_text()
    }
}

impl TextUnit for Collection {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn fragments(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        Box::new(self.documents.iter().flat_map(|d| d.fragments()))
    }
}

impl AnnotatedUnit for Collection {
    fn iter_entities(
        &self,
        gaps: Option<GapPolicy>,
        overlaps: Option<OverlapPolicy>,
    ) -> Box<dyn Iterator<Item = Cow<'_, Entity>> + '_> {
        Box::new(
            self.sentences()
                .flat_map(move |s| s.shaped_entities(gaps, overlaps)),
        )
    }

    fn iter_relations(&self) -> Box<dyn Iterator<Item = &Relation> + '_> {
        Box::new(self.documents.iter().flat_map(|d| d.iter_relations()))
    }
}
