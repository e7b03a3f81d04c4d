//! Property tests for the document tree: text reconstruction and
//! anchoring hold for generated inputs, not just the hand-picked ones.

use biodoc::{Document, Entity};
use proptest::prelude::*;

proptest! {
    /// A document built from offset-consistent sections reproduces the
    /// original text exactly, including synthesized newline gaps.
    #[test]
    fn reconstructed_text_matches_input(
        texts in prop::collection::vec("[a-z]{1,8}( [a-z]{1,8}){0,3}\\.", 1..5),
        gaps in prop::collection::vec(0usize..3, 5),
    ) {
        let mut doc = Document::new("p");
        let mut expected = String::new();
        let mut offset = 0;
        for (i, text) in texts.iter().enumerate() {
            let gap = gaps[i % gaps.len()];
            expected.push_str(&"\n".repeat(gap));
            offset += gap;
            let end = offset + text.chars().count();
            doc.add_section("body", vec![(text.as_str(), offset, end)]).unwrap();
            expected.push_str(text);
            offset = end;
        }
        prop_assert_eq!(doc.text(), expected);
    }

    /// Every entity cut verbatim from a sentence anchors into exactly
    /// that sentence, and nowhere else.
    #[test]
    fn verbatim_entity_anchors_in_its_sentence(
        pick in 0usize..2,
        start in 0usize..6,
        len in 1usize..3,
    ) {
        let sentences = ["abcdefgh ", "ijklmnop"];
        let mut doc = Document::new("p");
        doc.add_section(
            "body",
            vec![(sentences[0], 0, 9), (sentences[1], 9, 17)],
        )
        .unwrap();

        let base = if pick == 0 { 0 } else { 9 };
        let text: String = sentences[pick].chars().skip(start).take(len).collect();
        let entity = Entity::contiguous(1, text, base + start, base + start + len);
        doc.add_entities([entity], None).unwrap();

        let placed: Vec<usize> = doc
            .sentences()
            .enumerate()
            .filter(|(_, s)| !s.entities().is_empty())
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(placed, vec![pick]);
    }

    /// Anchoring never fails or panics for entities with arbitrary
    /// offsets, as long as the declared text matches what the offsets
    /// cover (out-of-range entities are dropped).
    #[test]
    fn out_of_range_is_never_fatal(start in 0usize..40, len in 0usize..5) {
        let mut doc = Document::new("p");
        doc.add_section("body", vec![("abcdefgh", 0, 8)]).unwrap();

        let full = "abcdefgh";
        let text: String = full.chars().skip(start.min(8)).take(len).collect();
        let entity = Entity::contiguous(1, text.clone(), start, start + len);

        let result = doc.add_entities([entity], None);
        if start >= 8 {
            // Beyond the only sentence: dropped with a warning.
            prop_assert!(result.is_ok());
            prop_assert_eq!(doc.sentences().flat_map(|s| s.entities()).count(), 0);
        } else if start + len <= 8 {
            // Fully inside and verbatim: anchored.
            prop_assert!(result.is_ok());
            prop_assert_eq!(doc.sentences().flat_map(|s| s.entities()).count(), 1);
        } else {
            // Clamped extraction vs. declared text decides; either way
            // no panic. The declared text was cut with the same clamp,
            // so this also validates.
            prop_assert!(result.is_ok());
        }
    }
}
