//! Fuzzy match scoring for candidate path strings.

/// Scores a query against a candidate text, higher is better.
///
/// Both inputs are lowercase-normalized; lengths are in characters. Tiers:
/// an exact match scores 2.0, a contiguous substring 1.5 plus the fraction
/// of the text it covers, and anything else goes through greedy leftmost
/// subsequence matching with bonuses for adjacent matches and matches at
/// path-component boundaries. Subsequence scores are normalized by query
/// and text length so short, precise candidates beat long incidental ones,
/// and clamped at 0.0.
///
/// The subsequence scan is deliberately greedy: it takes the first
/// occurrence of each query character, not the best alignment.
pub fn fuzzy_match_score(query: &str, text: &str) -> f64 {
    let query = query.to_lowercase();
    let text = text.to_lowercase();

    if query.is_empty() {
        return 1.0;
    }
    if query == text {
        return 2.0;
    }

    let query_len = query.chars().count();
    let text_len = text.chars().count();

    if text.contains(&query) {
        return 1.5 + query_len as f64 / text_len as f64;
    }

    let mut score = 0.0;
    let mut query_chars = query.chars();
    let mut wanted = query_chars.next();
    let mut matched = 0usize;
    let mut last_match: Option<usize> = None;
    let mut previous: Option<char> = None;

    for (index, ch) in text.chars().enumerate() {
        let Some(want) = wanted else {
            break;
        };
        if ch == want {
            score += 1.0;
            if last_match.is_some_and(|last| index == last + 1) {
                score += 0.5;
            }
            if index == 0 || matches!(previous, Some('/' | '\\')) {
                score += 0.75;
            }
            matched += 1;
            last_match = Some(index);
            wanted = query_chars.next();
        }
        previous = Some(ch);
    }

    if matched < query_len {
        score -= (query_len - matched) as f64 * 0.5;
    }

    // The epsilon guards division by zero for empty texts.
    score /= query_len as f64 + text_len as f64 * 0.1 + 1e-6;

    score.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn empty_query_scores_one() {
        assert_eq!(fuzzy_match_score("", "/home/u/notes.txt"), 1.0);
        assert_eq!(fuzzy_match_score("", ""), 1.0);
    }

    #[test]
    fn exact_match_scores_two() {
        assert_eq!(fuzzy_match_score("/home/u/notes.txt", "/home/u/notes.txt"), 2.0);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(fuzzy_match_score("/Home/U/Notes.TXT", "/home/u/notes.txt"), 2.0);
        assert!(fuzzy_match_score("MAIN", "/home/u/project/main.go") > 1.5);
    }

    #[test]
    fn substring_match_scores_by_coverage() {
        // "/home/u/project/main.go" is 23 characters.
        let score = fuzzy_match_score("main", "/home/u/project/main.go");
        assert!((score - (1.5 + 4.0 / 23.0)).abs() < EPSILON);
    }

    #[test]
    fn substring_in_shorter_text_scores_higher() {
        let short = fuzzy_match_score("notes", "/u/notes.txt");
        let long = fuzzy_match_score("notes", "/very/long/directory/of/notes.txt");
        assert!(short > long);
    }

    #[test]
    fn tiers_order_for_one_candidate_text() {
        let text = "/home/u/project/main.go";
        let exact = fuzzy_match_score(text, text);
        let substring = fuzzy_match_score("main", text);
        let subsequence = fuzzy_match_score("pg", text);
        assert!(exact > substring);
        assert!(substring > subsequence);
        assert!(subsequence > 0.0);
    }

    #[test]
    fn separator_boundary_matches_earn_a_bonus() {
        // "pr/m" aligns with the starts of "project" and "main.go":
        // p +1.75, r +1.5 (adjacent), / +1.0, m +2.25 (adjacent + boundary).
        let score = fuzzy_match_score("pr/m", "/home/u/project/main.go");
        let expected = 6.5 / (4.0 + 23.0 * 0.1 + 1e-6);
        assert!((score - expected).abs() < EPSILON);

        assert!(fuzzy_match_score("m", "x/m") > fuzzy_match_score("m", "xm"));
        // Backslash separators count as boundaries too.
        assert!(fuzzy_match_score("m", "x\\m") > fuzzy_match_score("m", "xm"));
    }

    #[test]
    fn adjacent_matches_earn_a_bonus() {
        // Equal-length texts, same characters matched; only "ab" being
        // adjacent in the first text separates the scores.
        assert!(fuzzy_match_score("abc", "xab_c_") > fuzzy_match_score("abc", "xa_b_c"));
    }

    #[test]
    fn unmatched_characters_are_penalized() {
        assert!(fuzzy_match_score("ab", "a-b-c") > fuzzy_match_score("abz", "a-b-c"));
    }

    #[test]
    fn hopeless_queries_clamp_to_zero() {
        assert_eq!(fuzzy_match_score("zzz", "/home/u/a.txt"), 0.0);
        assert_eq!(fuzzy_match_score("abc", ""), 0.0);
    }

    #[test]
    fn greedy_scan_takes_the_first_occurrence() {
        // "ab" against "?ax/a?b": greedy consumes the first "a", forfeiting
        // the boundary bonus the "a" after the separator would have earned.
        let greedy = fuzzy_match_score("ab", "?ax/a?b");
        // a at 1: +1.0, b at 6: +1.0 -> 2.0 normalized.
        let expected = 2.0 / (2.0 + 7.0 * 0.1 + 1e-6);
        assert!((greedy - expected).abs() < EPSILON);
    }
}
