//! Search evaluation over a candidate snapshot.

use std::cmp::Ordering;

use super::score::fuzzy_match_score;
use crate::cancel::CancellationToken;
use crate::types::{SearchHit, Snapshot};

/// A scored candidate, alive only for the duration of one search call.
struct ScoredCandidate {
    score: f64,
    index: usize,
}

/// The outcome of ranking one snapshot against one query.
#[derive(Debug)]
pub struct RankedMatches {
    /// Hits in rank order, at most the requested limit.
    pub hits: Vec<SearchHit>,
    /// Candidates that scored above zero, before truncation.
    pub matched: usize,
}

/// Scores the snapshot against the query and returns the top hits.
///
/// Pure function of its inputs: no state is carried between calls, and any
/// number of searches may run concurrently against the same snapshot.
/// Returns `None` if the token was cancelled, otherwise at most `limit`
/// hits, descending by score; equal scores keep snapshot order.
///
/// An empty query returns no hits rather than the whole unranked snapshot.
pub fn search_snapshot(
    query: &str,
    snapshot: &Snapshot,
    limit: usize,
    cancel: &CancellationToken,
) -> Option<RankedMatches> {
    cancel.is_cancelled()?;

    if query.is_empty() || limit == 0 {
        return Some(RankedMatches {
            hits: Vec::new(),
            matched: 0,
        });
    }

    let mut scored = Vec::new();
    for (index, record) in snapshot.records.iter().enumerate() {
        cancel.is_cancelled_sparse(index)?;
        let score = fuzzy_match_score(query, &record.search_text);
        if score > 0.0 {
            scored.push(ScoredCandidate { score, index });
        }
    }

    cancel.is_cancelled()?;

    let matched = scored.len();

    // Stable sort keeps input order for equal scores.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(limit);

    let hits = scored
        .into_iter()
        .map(|candidate| SearchHit {
            record: snapshot.records[candidate.index].clone(),
            score: candidate.score,
        })
        .collect();

    Some(RankedMatches { hits, matched })
}
