//! Line reconstruction over raw OCR fragments
//!
//! OCR engines often split one printed line into several fragments. The
//! reconstructor merges them back into line blocks with a single pass over
//! the fragments sorted by `(top, left)`: a fragment joins the current line
//! when its vertical midpoint is within `0.7 x height` of the fragment just
//! before it. Lines are never revisited, so strongly skewed layouts may be
//! split; the single pass keeps results reproducible.
//!
//! Both the raw fragments and the merged lines go into the [`CandidatePool`].

use shared_types::TextFragment;

use crate::similarity::{normalize_whitespace, similarity};

/// Fraction of the previous fragment's height two midpoints may differ by
pub const LINE_MERGE_FACTOR: f64 = 0.7;

/// Merge fragments into reading-order line blocks
pub fn reconstruct(fragments: &[TextFragment]) -> Vec<TextFragment> {
    let mut sorted: Vec<&TextFragment> = fragments.iter().collect();
    sorted.sort_by_key(|f| (f.top, f.left));

    let mut lines: Vec<Vec<&TextFragment>> = Vec::new();
    let mut previous: Option<&TextFragment> = None;

    for fragment in sorted {
        let same_line = previous.is_some_and(|prev| {
            let delta = (fragment.bounding_box().vertical_mid()
                - prev.bounding_box().vertical_mid())
            .abs();
            delta < LINE_MERGE_FACTOR * f64::from(prev.height)
        });

        match lines.last_mut() {
            Some(line) if same_line => line.push(fragment),
            _ => lines.push(vec![fragment]),
        }
        previous = Some(fragment);
    }

    lines.into_iter().map(merge_line).collect()
}

fn merge_line(mut members: Vec<&TextFragment>) -> TextFragment {
    members.sort_by_key(|f| f.left);

    let text = members
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let bbox = members
        .iter()
        .skip(1)
        .fold(members[0].bounding_box(), |acc, f| acc.union(&f.bounding_box()));
    let confidence = members.iter().map(|f| f.confidence).sum::<f64>() / members.len() as f64;

    TextFragment::new(text, bbox, confidence)
}

/// Best-scoring candidate for an expected string
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a TextFragment,
    pub score: f64,
}

/// Everything text rules may match against: raw fragments first, then lines
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    candidates: Vec<TextFragment>,
    raw_count: usize,
}

impl CandidatePool {
    pub fn build(fragments: &[TextFragment]) -> Self {
        let mut candidates = fragments.to_vec();
        candidates.extend(reconstruct(fragments));
        Self {
            candidates,
            raw_count: fragments.len(),
        }
    }

    pub fn candidates(&self) -> &[TextFragment] {
        &self.candidates
    }

    pub fn line_count(&self) -> usize {
        self.candidates.len() - self.raw_count
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Highest similarity to `expected`; ties keep the earliest candidate
    pub fn best_match(&self, expected: &str) -> Option<ScoredCandidate<'_>> {
        let mut best: Option<ScoredCandidate<'_>> = None;
        for candidate in &self.candidates {
            let score = similarity(expected, &candidate.text);
            if best.map_or(true, |b| score > b.score) {
                best = Some(ScoredCandidate { candidate, score });
            }
        }
        best
    }

    /// First candidate whose text equals `description`, else the first containing it
    pub fn find_target(&self, description: &str) -> Option<&TextFragment> {
        let wanted = normalize_whitespace(description);
        if wanted.is_empty() {
            return None;
        }
        self.candidates
            .iter()
            .find(|c| normalize_whitespace(&c.text) == wanted)
            .or_else(|| {
                self.candidates
                    .iter()
                    .find(|c| normalize_whitespace(&c.text).contains(&wanted))
            })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::BoundingBox;

    fn fragment_strategy() -> impl Strategy<Value = TextFragment> {
        ("[A-Za-z0-9]{1,8}", 0i32..500, 0i32..500, 1i32..80, 1i32..40, 0.0f64..=1.0).prop_map(
            |(text, x, y, w, h, conf)| TextFragment::new(text, BoundingBox::new(x, y, w, h), conf),
        )
    }

    proptest! {
        /// Property: Every fragment lands in exactly one line
        #[test]
        fn lines_cover_all_fragments(
            fragments in prop::collection::vec(fragment_strategy(), 0..30),
        ) {
            let lines = reconstruct(&fragments);
            let words: usize = lines.iter().map(|l| l.text.split(' ').count()).sum();
            prop_assert_eq!(words, fragments.len());
            prop_assert!(lines.len() <= fragments.len());
        }

        /// Property: Line confidence stays within the members' range
        #[test]
        fn line_confidence_bounded(fragments in prop::collection::vec(fragment_strategy(), 1..30)) {
            for line in reconstruct(&fragments) {
                prop_assert!((0.0..=1.0 + 1e-9).contains(&line.confidence));
            }
        }

        /// Property: Reconstruction is deterministic
        #[test]
        fn reconstruct_deterministic(
            fragments in prop::collection::vec(fragment_strategy(), 0..30),
        ) {
            prop_assert_eq!(reconstruct(&fragments), reconstruct(&fragments));
        }
    }
}
