//! Serde round-trips for the annotation value types.

use biodoc::{AnnotationId, Entity, Relation, RelationMember, Segment, Span, Token};

#[test]
fn span_json_shape() {
    let span = Span::new(3, 9);
    let json = serde_json::to_string(&span).unwrap();
    assert_eq!(json, r#"{"start":3,"end":9}"#);
    let back: Span = serde_json::from_str(&json).unwrap();
    assert_eq!(back, span);
}

#[test]
fn annotation_id_is_untagged() {
    assert_eq!(serde_json::to_string(&AnnotationId::from(7)).unwrap(), "7");
    assert_eq!(
        serde_json::to_string(&AnnotationId::from("T1")).unwrap(),
        r#""T1""#
    );
    let num: AnnotationId = serde_json::from_str("7").unwrap();
    assert_eq!(num, AnnotationId::Num(7));
    let s: AnnotationId = serde_json::from_str(r#""T1""#).unwrap();
    assert_eq!(s, AnnotationId::Str("T1".to_owned()));
}

#[test]
fn entity_round_trip() {
    let entity = Entity::new("T1", "aspirin [...] ibuprofen", [(0, 7), (12, 21)])
        .with_meta("type", "chemical")
        .with_meta("cui", "C0004057");
    let json = serde_json::to_string(&entity).unwrap();
    let back: Entity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, entity);
    assert_eq!(back.spans().len(), 2);
}

#[test]
fn relation_round_trip() {
    let relation = Relation::new(
        "R1",
        [
            RelationMember::new("T1", "subject"),
            RelationMember::new("T2", "object"),
        ],
    )
    .with_meta("type", "treats");
    let json = serde_json::to_string(&relation).unwrap();
    let back: Relation = serde_json::from_str(&json).unwrap();
    assert_eq!(back, relation);
    assert_eq!(back.kind(), Some("treats"));
}

#[test]
fn token_and_segment_round_trip() {
    let token = Token {
        text: "aspirin".to_owned(),
        start: 0,
        end: 7,
    };
    let json = serde_json::to_string(&token).unwrap();
    let back: Token = serde_json::from_str(&json).unwrap();
    assert_eq!(back, token);

    let segment = Segment::new("aspirin works. ", 0, 15);
    let json = serde_json::to_string(&segment).unwrap();
    let back: Segment = serde_json::from_str(&json).unwrap();
    assert_eq!(back, segment);
}

#[test]
fn policy_names_serialize_as_wire_strings() {
    use biodoc::{GapPolicy, OverlapPolicy};
    assert_eq!(
        serde_json::to_string(&GapPolicy::Split).unwrap(),
        r#""split""#
    );
    assert_eq!(
        serde_json::to_string(&OverlapPolicy::KeepLonger).unwrap(),
        r#""keep-longer""#
    );
    let p: OverlapPolicy = serde_json::from_str(r#""keep-shorter""#).unwrap();
    assert_eq!(p, OverlapPolicy::KeepShorter);
}
