//! Bounded buffer of the most recent matches across submissions.

use serde::{Deserialize, Serialize};

use crate::Match;

/// Maximum number of matches retained
pub const LIVE_CAPACITY: usize = 30;

/// Visual tier for a match score; presentational only, the scoring itself
/// belongs to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    Strong,
    Moderate,
    Weak,
}

impl ScoreTier {
    pub fn of(score: f64) -> Self {
        if score >= 0.75 {
            ScoreTier::Strong
        } else if score >= 0.45 {
            ScoreTier::Moderate
        } else {
            ScoreTier::Weak
        }
    }
}

/// Most-recent-first ring of matches, bounded to [`LIVE_CAPACITY`] entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveBuffer {
    entries: Vec<Match>,
}

impl LiveBuffer {
    /// Prepends each incoming match, then truncates to capacity.
    ///
    /// Matches are prepended one at a time, so a single batch lands in
    /// reverse batch order while newest-first ordering holds across pushes.
    pub fn push(&mut self, matches: &[Match]) {
        for m in matches {
            self.entries.insert(0, m.clone());
        }
        self.entries.truncate(LIVE_CAPACITY);
    }

    pub fn entries(&self) -> &[Match] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: &str) -> Match {
        Match {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_push_is_most_recent_first() {
        let mut live = LiveBuffer::default();
        live.push(&[m("m1")]);
        live.push(&[m("m2")]);
        assert_eq!(live.entries()[0].id.as_deref(), Some("m2"));
        assert_eq!(live.entries()[1].id.as_deref(), Some("m1"));
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        let mut live = LiveBuffer::default();
        for i in 0..7 {
            let batch: Vec<Match> = (0..6).map(|j| m(&format!("{}-{}", i, j))).collect();
            live.push(&batch);
            assert!(live.len() <= LIVE_CAPACITY);
        }
        assert_eq!(live.len(), LIVE_CAPACITY);
        // The newest batch is still at the front.
        assert_eq!(live.entries()[0].id.as_deref(), Some("6-5"));
    }

    #[test]
    fn test_score_tiers_at_boundaries() {
        assert_eq!(ScoreTier::of(0.8), ScoreTier::Strong);
        assert_eq!(ScoreTier::of(0.75), ScoreTier::Strong);
        assert_eq!(ScoreTier::of(0.5), ScoreTier::Moderate);
        assert_eq!(ScoreTier::of(0.45), ScoreTier::Moderate);
        assert_eq!(ScoreTier::of(0.44), ScoreTier::Weak);
        assert_eq!(ScoreTier::of(0.0), ScoreTier::Weak);
    }
}
