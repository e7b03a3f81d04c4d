//! Tokenwise labeling, the way a verticalized-format writer consumes
//! the tree: tokens from the lazy tokenizer, entities joined in via
//! the entity cursor.

use biodoc::{default_tokenizer, Document, Entity, EntityCursor};

#[test]
fn tokens_receive_entity_labels() {
    let mut doc = Document::new("d1");
    doc.add_section("body", "aspirin cures pain").unwrap();
    doc.add_entities(
        [
            Entity::contiguous(1, "aspirin", 0, 7).with_meta("type", "chemical"),
            Entity::contiguous(2, "pain", 14, 18).with_meta("type", "symptom"),
        ],
        None,
    )
    .unwrap();

    let sentence = &mut doc.sections_mut()[0].sentences_mut()[0];
    let tokens: Vec<_> = sentence.tokens(default_tokenizer()).to_vec();
    let mut cursor = EntityCursor::new(sentence.entities());

    let labels: Vec<String> = tokens
        .iter()
        .map(|token| {
            let types: Vec<_> = cursor
                .advance_to(token.start, token.end)
                .filter_map(|e| e.metadata.get("type").cloned())
                .collect();
            if types.is_empty() {
                "O".to_owned()
            } else {
                types.join(";")
            }
        })
        .collect();

    assert_eq!(labels, ["chemical", "O", "symptom"]);
}

#[test]
fn multi_token_entity_labels_every_token() {
    let mut doc = Document::new("d1");
    doc.add_section("body", "acetyl salicylic acid works").unwrap();
    doc.add_entities(
        [Entity::contiguous(1, "acetyl salicylic acid", 0, 21).with_meta("type", "chemical")],
        None,
    )
    .unwrap();

    let sentence = &mut doc.sections_mut()[0].sentences_mut()[0];
    let tokens: Vec<_> = sentence.tokens(default_tokenizer()).to_vec();
    let mut cursor = EntityCursor::new(sentence.entities());

    let covered: Vec<bool> = tokens
        .iter()
        .map(|t| cursor.advance_to(t.start, t.end).count() > 0)
        .collect();

    assert_eq!(covered, [true, true, true, false]);
}

#[test]
fn overlapping_entities_both_in_scope() {
    let mut doc = Document::new("d1");
    doc.add_section("body", "acute severe pain").unwrap();
    doc.add_entities(
        [
            Entity::contiguous(1, "acute severe pain", 0, 17),
            Entity::contiguous(2, "severe pain", 6, 17),
        ],
        None,
    )
    .unwrap();

    let sentence = &mut doc.sections_mut()[0].sentences_mut()[0];
    let tokens: Vec<_> = sentence.tokens(default_tokenizer()).to_vec();
    let mut cursor = EntityCursor::new(sentence.entities());

    let counts: Vec<usize> = tokens
        .iter()
        .map(|t| cursor.advance_to(t.start, t.end).count())
        .collect();

    assert_eq!(counts, [1, 2, 2]);
}
