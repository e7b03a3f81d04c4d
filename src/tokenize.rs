//! Word tokenization and sentence splitting.
//!
//! The document tree never segments text itself; it delegates to a
//! [`Tokenizer`], a pluggable service producing [`Segment`]s that cover
//! the input exhaustively (each sentence span extends to the start of
//! the next, so trailing whitespace stays inside the preceding
//! sentence). [`RuleTokenizer`] is the built-in default: a small
//! regex-based splitter, good enough for tests and plain prose. Anything
//! smarter (abbreviation lists, learned models) belongs in an external
//! implementation of the trait.
//!
//! All segment offsets are character offsets; the regex byte positions
//! are converted internally.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::offset::byte_index;

/// A text fragment with character offsets, produced by segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// The fragment's text.
    pub text: String,
    /// Start offset in characters.
    pub start: usize,
    /// End offset in characters (exclusive).
    pub end: usize,
}

impl Segment {
    /// Create a segment.
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// Span-producing word and sentence segmentation.
///
/// `offset` is added to all produced offsets, anchoring the segments in
/// document coordinates.
pub trait Tokenizer: Send + Sync {
    /// Split `text` into sentences.
    ///
    /// The spans cover the text exhaustively from the first sentence
    /// start to the end of `text`; leading whitespace before the first
    /// sentence is not covered (the tree re-synthesizes it from offset
    /// gaps). Whitespace-only input yields no sentences.
    fn split_sentences(&self, text: &str, offset: usize) -> Vec<Segment>;

    /// Split `text` into word tokens, same coverage contract at token
    /// granularity (inter-token whitespace is skipped).
    fn tokenize_words(&self, text: &str, offset: usize) -> Vec<Segment>;
}

/// Word-punct tokens: runs of word characters or of other non-space.
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+|[^\w\s]+").expect("valid regex"));

/// Sentence-final punctuation, optional closers, then whitespace.
static BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]+[)\]'"’”]*\s+"#).expect("valid regex"));

/// Default rule-based segmentation.
///
/// Sentence boundaries are placed after sentence-final punctuation
/// followed by whitespace, but only when the next character is an
/// uppercase letter or a digit; this keeps most abbreviations intact
/// without a lexicon.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleTokenizer;

impl Tokenizer for RuleTokenizer {
    fn split_sentences(&self, text: &str, offset: usize) -> Vec<Segment> {
        let first = match text.find(|c: char| !c.is_whitespace()) {
            Some(i) => i,
            None => return Vec::new(),
        };
        let mut starts = vec![first];
        for m in BOUNDARY.find_iter(text) {
            let next = text[m.end()..].chars().next();
            if next.is_some_and(|c| c.is_uppercase() || c.is_numeric()) {
                starts.push(m.end());
            }
        }

        let index = (!text.is_ascii()).then(|| byte_index(text));
        let to_char = |b: usize| index.as_ref().map_or(b, |ix| ix[b]);

        let mut segments = Vec::with_capacity(starts.len());
        for (i, &byte_start) in starts.iter().enumerate() {
            let byte_end = starts.get(i + 1).copied().unwrap_or(text.len());
            segments.push(Segment::new(
                &text[byte_start..byte_end],
                to_char(byte_start) + offset,
                to_char(byte_end) + offset,
            ));
        }
        segments
    }

    fn tokenize_words(&self, text: &str, offset: usize) -> Vec<Segment> {
        let index = (!text.is_ascii()).then(|| byte_index(text));
        let to_char = |b: usize| index.as_ref().map_or(b, |ix| ix[b]);
        WORD.find_iter(text)
            .map(|m| {
                Segment::new(
                    m.as_str(),
                    to_char(m.start()) + offset,
                    to_char(m.end()) + offset,
                )
            })
            .collect()
    }
}

static DEFAULT: Lazy<RuleTokenizer> = Lazy::new(RuleTokenizer::default);

/// The tokenizer used when none is supplied explicitly.
#[must_use]
pub fn default_tokenizer() -> &'static RuleTokenizer {
    &DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covers(text: &str, segments: &[Segment]) {
        // Exhaustive from first segment start to text end, no gaps.
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        if let Some(last) = segments.last() {
            assert_eq!(last.end, crate::offset::char_len(text));
        }
    }

    #[test]
    fn splits_plain_sentences() {
        let text = "One drug works. Another drug fails. ";
        let sents = RuleTokenizer.split_sentences(text, 0);
        assert_eq!(sents.len(), 2);
        assert_eq!(sents[0].text, "One drug works. ");
        assert_eq!((sents[0].start, sents[0].end), (0, 16));
        assert_eq!(sents[1].text, "Another drug fails. ");
        assert_eq!((sents[1].start, sents[1].end), (16, 36));
        covers(text, &sents);
    }

    #[test]
    fn keeps_lowercase_continuations_together() {
        let sents = RuleTokenizer.split_sentences("Used e.g. for pain. Works.", 0);
        assert_eq!(sents.len(), 2);
        assert_eq!(sents[0].text, "Used e.g. for pain. ");
    }

    #[test]
    fn applies_offset() {
        let sents = RuleTokenizer.split_sentences("Aspirin helps.", 100);
        assert_eq!(sents.len(), 1);
        assert_eq!((sents[0].start, sents[0].end), (100, 114));
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(RuleTokenizer.split_sentences("  \n\t ", 0).is_empty());
        assert!(RuleTokenizer.split_sentences("", 0).is_empty());
    }

    #[test]
    fn leading_whitespace_not_covered() {
        let sents = RuleTokenizer.split_sentences("  Hi there.", 0);
        assert_eq!(sents.len(), 1);
        assert_eq!(sents[0].start, 2);
        assert_eq!(sents[0].text, "Hi there.");
    }

    #[test]
    fn word_tokens_split_punctuation() {
        let toks = RuleTokenizer.tokenize_words("IL-2 binds.", 0);
        let texts: Vec<_> = toks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["IL", "-", "2", "binds", "."]);
        assert_eq!((toks[0].start, toks[0].end), (0, 2));
        assert_eq!((toks[4].start, toks[4].end), (10, 11));
    }

    #[test]
    fn word_tokens_char_offsets_multibyte() {
        // "αβ" are 2 chars, 4 bytes; offsets must count chars.
        let toks = RuleTokenizer.tokenize_words("αβ gamma", 0);
        assert_eq!(toks.len(), 2);
        assert_eq!((toks[0].start, toks[0].end), (0, 2));
        assert_eq!((toks[1].start, toks[1].end), (3, 8));
    }

    #[test]
    fn sentence_offsets_multibyte() {
        let text = "Costs €5. Cheap.";
        let sents = RuleTokenizer.split_sentences(text, 0);
        assert_eq!(sents.len(), 2);
        assert_eq!(sents[0].text, "Costs €5. ");
        assert_eq!((sents[0].start, sents[0].end), (0, 10));
        assert_eq!((sents[1].start, sents[1].end), (10, 16));
        covers(text, &sents);
    }
}
