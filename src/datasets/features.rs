//! Feature extraction for a single relation example: relative position buckets, the lexical
//! window around each entity, and the entity/context token masks.

use super::relations::Span;

/// Number of relative position buckets
pub const POSITION_BUCKETS: usize = 123;

/// Relative distances beyond this are clipped into the outermost buckets
const MAX_DISTANCE: i64 = 60;

/// Number of lexical features: each entity's first word and its two neighbours
pub const LEXICAL_WIDTH: usize = 6;

/// Map a signed token distance to a bucket in `0..POSITION_BUCKETS`
pub fn position_bucket(distance: i64) -> usize {
    if distance < -MAX_DISTANCE {
        0
    } else if distance <= MAX_DISTANCE {
        (distance + MAX_DISTANCE + 1) as usize
    } else {
        POSITION_BUCKETS - 1
    }
}

/// The position bucket of every token relative to `anchor`
pub fn positions(len: usize, anchor: usize) -> Vec<usize> {
    (0..len)
        .map(|i| position_bucket(i as i64 - anchor as i64))
        .collect()
}

/// `[w(e1), w(e1-1), w(e1+1), w(e2), w(e2-1), w(e2+1)]`, repeating the entity word when a
/// neighbour falls outside the sentence
pub fn lexical(ids: &[usize], e1: usize, e2: usize, pad_id: usize) -> [usize; LEXICAL_WIDTH] {
    let window = |e: usize| -> [usize; 3] {
        let Some(&word) = ids.get(e) else {
            return [pad_id; 3];
        };

        let before = if e >= 1 { ids[e - 1] } else { word };
        let after = ids.get(e + 1).copied().unwrap_or(word);

        [word, before, after]
    };

    let [a, b, c] = window(e1);
    let [d, e, f] = window(e2);

    [a, b, c, d, e, f]
}

/// Token masks for the two entity spans and the context between, around and after them
#[derive(Clone, Debug, PartialEq)]
pub struct Masks {
    /// Tokens inside the first entity
    pub entity1: Vec<bool>,

    /// Tokens inside the second entity
    pub entity2: Vec<bool>,

    /// Tokens outside both entities, within the sentence length
    pub context: Vec<bool>,
}

impl Masks {
    /// Build masks of `max_len` positions for a sentence of `len` tokens. Entities cut off by
    /// truncation are moved onto the last kept token so neither entity mask is ever empty.
    pub fn new(len: usize, entity1: Span, entity2: Span, max_len: usize) -> Self {
        let len = len.min(max_len);
        let last = len.saturating_sub(1);
        let clip = |span: Span| Span::new(span.first.min(last), span.last.min(last));

        let (entity1, entity2) = (clip(entity1), clip(entity2));

        let entity1: Vec<bool> = (0..max_len).map(|i| i < len && entity1.contains(i)).collect();
        let entity2: Vec<bool> = (0..max_len).map(|i| i < len && entity2.contains(i)).collect();
        let context = (0..max_len)
            .map(|i| i < len && !entity1[i] && !entity2[i])
            .collect();

        Self {
            entity1,
            entity2,
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_position_bucket_clips_far_distances() {
        assert_eq!(position_bucket(-61), 0);
        assert_eq!(position_bucket(-60), 1);
        assert_eq!(position_bucket(0), 61);
        assert_eq!(position_bucket(60), 121);
        assert_eq!(position_bucket(61), 122);
        assert_eq!(position_bucket(500), POSITION_BUCKETS - 1);
    }

    #[test]
    fn test_positions_relative_to_anchor() {
        assert_eq!(positions(4, 1), vec![60, 61, 62, 63]);
    }

    #[test]
    fn test_lexical_repeats_word_at_boundaries() {
        let ids = [10, 11, 12, 13];

        assert_eq!(lexical(&ids, 0, 3, 0), [10, 10, 11, 13, 12, 13]);
        assert_eq!(lexical(&ids, 1, 2, 0), [11, 10, 12, 12, 11, 13]);
    }

    #[test]
    fn test_lexical_pads_truncated_entities() {
        assert_eq!(lexical(&[1, 2], 0, 5, 0), [1, 1, 2, 0, 0, 0]);
    }

    #[test]
    fn test_masks_split_entities_and_context() {
        let masks = Masks::new(5, Span::new(1, 1), Span::new(3, 4), 6);

        assert_eq!(masks.entity1, vec![false, true, false, false, false, false]);
        assert_eq!(masks.entity2, vec![false, false, false, true, true, false]);
        assert_eq!(masks.context, vec![true, false, true, false, false, false]);
    }

    #[test]
    fn test_masks_keep_truncated_entities() {
        let masks = Masks::new(10, Span::new(0, 0), Span::new(7, 8), 4);

        assert_eq!(masks.entity2, vec![false, false, false, true]);
        assert_eq!(masks.context, vec![false, true, true, false]);
    }
}
