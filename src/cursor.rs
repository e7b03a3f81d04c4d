//! Windowed co-iteration of entities over tokens.
//!
//! Verticalized output formats (CoNLL-style) need, for each token in
//! order, the set of entities overlapping it. [`EntityCursor`] answers
//! that query with a single forward pass over both sequences: a cursor
//! over the entity list plus a deque of the entities currently in
//! scope. Feeding n tokens against m entities costs O(n + m) overall.

use std::collections::VecDeque;
use std::iter::Peekable;
use std::slice;

use crate::entity::Entity;

/// Stateful join of a sorted entity list against an ascending token
/// stream.
///
/// The entity slice must be sorted by `(start, end)` — a sentence's
/// [`entities`](crate::document::Sentence::entities) list already is.
/// Tokens must be fed in ascending start order (checked in debug
/// builds).
#[derive(Debug)]
pub struct EntityCursor<'a> {
    pending: Peekable<slice::Iter<'a, Entity>>,
    in_scope: VecDeque<&'a Entity>,
    last_start: usize,
}

impl<'a> EntityCursor<'a> {
    /// Create a cursor over entities sorted by `(start, end)`.
    #[must_use]
    pub fn new(entities: &'a [Entity]) -> Self {
        Self {
            pending: entities.iter().peekable(),
            in_scope: VecDeque::new(),
            last_start: 0,
        }
    }

    /// Advance to the token covering `[start, end)` and iterate over
    /// the entities overlapping it, in offset order.
    ///
    /// Entities ending at or before `start` leave the scope for good;
    /// pending entities starting before `end` enter it if they overlap
    /// the token.
    pub fn advance_to(&mut self, start: usize, end: usize) -> impl Iterator<Item = &'a Entity> + '_ {
        debug_assert!(
            start >= self.last_start,
            "tokens must be fed in ascending order"
        );
        self.last_start = start;

        self.in_scope.retain(|e| e.end() > start);
        while let Some(&entity) = self.pending.peek() {
            if entity.start() >= end {
                break;
            }
            if entity.start().max(start) < entity.end().min(end) {
                self.in_scope.push_back(entity);
            }
            self.pending.next();
        }
        self.in_scope.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(cursor: &mut EntityCursor<'_>, start: usize, end: usize) -> Vec<String> {
        cursor.advance_to(start, end).map(|e| e.id.to_string()).collect()
    }

    #[test]
    fn tracks_scope_over_tokens() {
        // Text layout: "aspirin and ibuprofen"
        //               0......7    12.......21
        let entities = vec![
            Entity::contiguous(1, "aspirin", 0, 7),
            Entity::contiguous(2, "aspirin and ibuprofen", 0, 21),
            Entity::contiguous(3, "ibuprofen", 12, 21),
        ];
        let mut cursor = EntityCursor::new(&entities);
        assert_eq!(ids(&mut cursor, 0, 7), ["1", "2"]);
        assert_eq!(ids(&mut cursor, 8, 11), ["2"]);
        assert_eq!(ids(&mut cursor, 12, 21), ["2", "3"]);
    }

    #[test]
    fn skips_entities_between_tokens() {
        // Entity lies entirely inside skipped whitespace.
        let entities = vec![Entity::contiguous(1, " ", 4, 5)];
        let mut cursor = EntityCursor::new(&entities);
        assert_eq!(ids(&mut cursor, 0, 4), Vec::<String>::new());
        assert_eq!(ids(&mut cursor, 6, 9), Vec::<String>::new());
    }

    #[test]
    fn drains_to_empty_and_stays_empty() {
        let entities = vec![Entity::contiguous(1, "x", 0, 1)];
        let mut cursor = EntityCursor::new(&entities);
        assert_eq!(ids(&mut cursor, 0, 1), ["1"]);
        assert_eq!(ids(&mut cursor, 1, 2), Vec::<String>::new());
        assert_eq!(ids(&mut cursor, 5, 6), Vec::<String>::new());
    }
}
