//! Edit-distance helpers behind "did you mean" suggestions

/// Default maximum edit distance for suggestions
pub const DEFAULT_MAX_DISTANCE: usize = 3;

/// Maximum number of suggestions returned by [`find_similar`]
pub const MAX_SUGGESTIONS: usize = 3;

/// A candidate close to the looked-up name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarMatch {
    pub candidate: String,
    pub distance: usize,
}

/// Case-insensitive Levenshtein distance using a full DP matrix
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();

    let mut matrix = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        matrix[0][j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a.len()][b.len()]
}

/// Up to [`MAX_SUGGESTIONS`] candidates within `max_distance` of `target`,
/// closest first. Ties keep the candidates' input order.
pub fn find_similar<I, S>(target: &str, candidates: I, max_distance: usize) -> Vec<SimilarMatch>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut matches: Vec<SimilarMatch> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            let distance = levenshtein_distance(target, candidate);
            (distance <= max_distance).then(|| SimilarMatch {
                candidate: candidate.to_string(),
                distance,
            })
        })
        .collect();

    // sort_by_key is stable
    matches.sort_by_key(|m| m.distance);
    matches.truncate(MAX_SUGGESTIONS);
    matches
}

/// Render suggestions as `'a', 'b' or 'c'` for messages
pub fn format_suggestions(matches: &[SimilarMatch]) -> Option<String> {
    let quoted: Vec<String> = matches
        .iter()
        .map(|m| format!("'{}'", m.candidate))
        .collect();
    match quoted.as_slice() {
        [] => None,
        [only] => Some(only.clone()),
        [init @ .., last] => Some(format!("{} or {}", init.join(", "), last)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_distance() {
        for s in ["", "Action", "mIs0", "ItemType"] {
            assert_eq!(levenshtein_distance(s, s), 0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [("kitten", "sitting"), ("Acton", "Action"), ("", "abc")];
        for (a, b) in pairs {
            assert_eq!(levenshtein_distance(a, b), levenshtein_distance(b, a));
        }
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_distance_ignores_case() {
        assert_eq!(levenshtein_distance("ACTION", "action"), 0);
        assert_eq!(levenshtein_distance("Str", "STR"), 0);
    }

    #[test]
    fn test_find_similar_closest_first() {
        let result = find_similar("Acton", ["Action", "Actor", "Item"], 1);
        assert_eq!(result[0].candidate, "Action");
        assert_eq!(result[0].distance, 1);
        assert!(result.iter().all(|m| m.distance <= 1));
    }

    #[test]
    fn test_find_similar_limits_and_orders() {
        let candidates = ["abd", "abc", "abe", "abf", "xyz"];
        let result = find_similar("abx", candidates, 3);
        assert_eq!(result.len(), MAX_SUGGESTIONS);
        assert!(result.windows(2).all(|w| w[0].distance <= w[1].distance));
        // Ties keep input order
        assert_eq!(result[0].candidate, "abd");
        assert_eq!(result[1].candidate, "abc");
        assert_eq!(result[2].candidate, "abe");
    }

    #[test]
    fn test_find_similar_nothing_close() {
        assert!(find_similar("zzzzzz", ["Action", "Item"], 2).is_empty());
    }

    #[test]
    fn test_format_suggestions() {
        let m = |c: &str| SimilarMatch {
            candidate: c.to_string(),
            distance: 1,
        };
        assert_eq!(format_suggestions(&[]), None);
        assert_eq!(format_suggestions(&[m("a")]), Some("'a'".to_string()));
        assert_eq!(
            format_suggestions(&[m("a"), m("b"), m("c")]),
            Some("'a', 'b' or 'c'".to_string())
        );
    }
}
