//! Matches a fixed target schema against the columns of an ingested file.

use crate::similarity;

/// Default score a candidate must reach to count as matched.
pub const DEFAULT_THRESHOLD: u8 = 70;

/// Best source column found for one target, with its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub target: String,
    /// `None` only when the source file exposed no columns at all.
    pub best_source: Option<String>,
    pub score: u8,
}

/// Outcome of matching every target column, split by threshold.
///
/// Concatenating `matched` and `unmatched` yields every target exactly once;
/// within each list targets keep their schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub matched: Vec<MatchCandidate>,
    pub unmatched: Vec<MatchCandidate>,
}

impl MatchOutcome {
    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }

    /// Look up the matched source for a target column, if any.
    pub fn source_for(&self, target: &str) -> Option<&str> {
        self.matched
            .iter()
            .find(|candidate| candidate.target == target)
            .and_then(|candidate| candidate.best_source.as_deref())
    }
}

/// Score every target against every source column and split the targets at
/// `threshold`. A candidate scoring exactly `threshold` is matched.
///
/// Sources are never consumed: two targets may both match the same source
/// column. An empty `sources` slice is valid input and classifies every
/// target as unmatched with score 0, even at threshold 0; a matched
/// candidate always names its source.
pub fn match_columns(targets: &[String], sources: &[String], threshold: u8) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();
    for target in targets {
        let Some((source, score)) = similarity::best_match(target, sources) else {
            // Nothing to score against: unmatched regardless of threshold.
            outcome.unmatched.push(MatchCandidate {
                target: target.clone(),
                best_source: None,
                score: 0,
            });
            continue;
        };
        let candidate = MatchCandidate {
            target: target.clone(),
            best_source: Some(source.to_string()),
            score,
        };
        if candidate.score >= threshold {
            outcome.matched.push(candidate);
        } else {
            outcome.unmatched.push(candidate);
        }
    }
    outcome
}
